use std::fmt;

use serde::{Deserialize, Serialize};

/// Note names by pitch class, sharps only (the convention used for
/// tuning display).
const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// An instrument tuning: open-string MIDI pitches plus a capo offset.
///
/// Pitches are stored low-to-high regardless of the wire order of any
/// dialect; decoders normalize before constructing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuning {
    pitches: Vec<u8>,
    capo: u8,
}

impl Tuning {
    pub fn new(pitches: Vec<u8>, capo: u8) -> Self {
        Self { pitches, capo }
    }

    /// Standard six-string guitar tuning (E A D G B E).
    pub fn standard_guitar() -> Self {
        Self::new(vec![40, 45, 50, 55, 59, 64], 0)
    }

    /// Open-string pitches, low-to-high.
    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    pub fn string_count(&self) -> usize {
        self.pitches.len()
    }

    pub fn capo(&self) -> u8 {
        self.capo
    }
}

impl fmt::Display for Tuning {
    /// Renders note names low-to-high, e.g. "D A D G B E".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for &pitch in &self.pitches {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", PITCH_NAMES[pitch as usize % 12])?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_guitar_display() {
        assert_eq!(Tuning::standard_guitar().to_string(), "E A D G B E");
    }

    #[test]
    fn test_drop_d_display() {
        let tuning = Tuning::new(vec![38, 45, 50, 55, 59, 64], 2);
        assert_eq!(tuning.to_string(), "D A D G B E");
        assert_eq!(tuning.capo(), 2);
    }

    #[test]
    fn test_bass_display() {
        let tuning = Tuning::new(vec![28, 33, 38, 43], 0);
        assert_eq!(tuning.to_string(), "E A D G");
        assert_eq!(tuning.string_count(), 4);
    }
}
