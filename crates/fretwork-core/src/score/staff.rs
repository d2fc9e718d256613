use serde::{Deserialize, Serialize};
use strum::{FromRepr, IntoStaticStr};

use crate::error::{Error, Result};

/// Clef drawn at the start of a staff.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, FromRepr, IntoStaticStr,
)]
#[repr(u8)]
pub enum Clef {
    #[default]
    Treble = 0,
    Bass = 1,
}

impl Clef {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }
}

/// A staff within a system: a clef, a string count, and one or more
/// voices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub clef: Clef,
    pub string_count: u8,
    pub voices: Vec<Voice>,
}

impl Staff {
    pub fn new(clef: Clef, string_count: u8) -> Self {
        Self {
            clef,
            string_count,
            voices: Vec::new(),
        }
    }
}

/// An ordered-by-onset sequence of positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub positions: Vec<Position>,
}

/// Note/rest duration, by subdivision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, FromRepr, IntoStaticStr,
)]
#[repr(u8)]
pub enum DurationType {
    Whole = 0,
    Half = 1,
    #[default]
    Quarter = 2,
    Eighth = 3,
    Sixteenth = 4,
    ThirtySecond = 5,
    SixtyFourth = 6,
}

impl DurationType {
    /// Decodes the wire form used by the whole dialect family: a signed
    /// power-of-two exponent relative to a quarter note (-2 = whole,
    /// 4 = sixty-fourth).
    pub fn from_wire(value: i8) -> Option<Self> {
        match value {
            -2 => Some(Self::Whole),
            -1 => Some(Self::Half),
            0 => Some(Self::Quarter),
            1 => Some(Self::Eighth),
            2 => Some(Self::Sixteenth),
            3 => Some(Self::ThirtySecond),
            4 => Some(Self::SixtyFourth),
            _ => None,
        }
    }

    pub fn to_wire(self) -> i8 {
        match self {
            Self::Whole => -2,
            Self::Half => -1,
            Self::Quarter => 0,
            Self::Eighth => 1,
            Self::Sixteenth => 2,
            Self::ThirtySecond => 3,
            Self::SixtyFourth => 4,
        }
    }
}

/// Boolean position-level tags, one bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum PositionProperty {
    Dotted = 0,
    DoubleDotted = 1,
    Vibrato = 2,
    WideVibrato = 3,
    ArpeggioUp = 4,
    ArpeggioDown = 5,
    PickStrokeUp = 6,
    PickStrokeDown = 7,
    Staccato = 8,
    Marcato = 9,
    Sforzando = 10,
    TremoloPicking = 11,
    PalmMuting = 12,
    Tap = 13,
    Acciaccatura = 14,
    LetRing = 15,
}

/// Boolean note-level tags, one bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum NoteProperty {
    Tied = 0,
    Muted = 1,
    HammerOnOrPullOff = 2,
    HammerOnFromNowhere = 3,
    GhostNote = 4,
    NaturalHarmonic = 5,
    Octave8va = 6,
    Octave8vb = 7,
    Octave15ma = 8,
    Octave15mb = 9,
    SlideIntoFromBelow = 10,
    SlideIntoFromAbove = 11,
    ShiftSlide = 12,
    LegatoSlide = 13,
    SlideOutOfDownwards = 14,
    SlideOutOfUpwards = 15,
}

macro_rules! property_set {
    ($set:ident, $property:ty, $count:expr) => {
        /// A bit-set over the corresponding property vocabulary.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $set(u32);

        impl $set {
            /// Mask of all bits backed by a property variant.
            pub const VALID_MASK: u32 = (1 << $count) - 1;

            pub fn new() -> Self {
                Self(0)
            }

            /// Reconstructs a set from raw bits, rejecting bits outside
            /// the vocabulary.
            pub fn from_bits(bits: u32) -> Option<Self> {
                ((bits & !Self::VALID_MASK) == 0).then_some(Self(bits))
            }

            pub fn bits(self) -> u32 {
                self.0
            }

            pub fn set(&mut self, property: $property) {
                self.0 |= 1 << property as u8;
            }

            pub fn clear(&mut self, property: $property) {
                self.0 &= !(1 << property as u8);
            }

            pub fn has(self, property: $property) -> bool {
                self.0 & (1 << property as u8) != 0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }
        }
    };
}

property_set!(PositionProperties, PositionProperty, 16);
property_set!(NoteProperties, NoteProperty, 16);

/// Kind of a pitch bend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum BendKind {
    Bend = 1,
    BendAndRelease = 2,
    BendAndReleaseAndBend = 3,
    Prebend = 4,
    PrebendAndRelease = 5,
}

impl BendKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }
}

/// A pitch bend on one note. Pitch is in quarter steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bend {
    pub kind: BendKind,
    pub pitch: u8,
}

/// Kind of a tremolo-bar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum TremoloEvent {
    Dip = 1,
    DiveAndRelease = 2,
    DiveAndHold = 3,
    Release = 4,
}

impl TremoloEvent {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }
}

/// A tremolo-bar action on one position. Pitch is in quarter steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TremoloBar {
    pub event: TremoloEvent,
    pub pitch: u8,
}

/// A time-slot within a voice: a rest, or a set of simultaneously struck
/// notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Offset within the owning system.
    pub position: u32,
    pub duration: DurationType,
    /// Irregular grouping (notes per beat), if any.
    pub tuplet: Option<u8>,
    pub properties: PositionProperties,
    pub tremolo_bar: Option<TremoloBar>,
    pub notes: Vec<Note>,
}

impl Position {
    pub fn new(position: u32, duration: DurationType) -> Self {
        Self {
            position,
            duration,
            ..Self::default()
        }
    }

    pub fn has_property(&self, property: PositionProperty) -> bool {
        self.properties.has(property)
    }

    pub fn set_property(&mut self, property: PositionProperty) {
        self.properties.set(property);
    }

    /// A rest owns zero notes.
    pub fn is_rest(&self) -> bool {
        self.notes.is_empty()
    }
}

/// A single fretted (or open) note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// String index, zero-based from the highest-pitched string.
    pub string: u8,
    pub fret: u8,
    pub properties: NoteProperties,
    pub tapped_harmonic_fret: Option<u8>,
    pub trilled_fret: Option<u8>,
    /// Artificial harmonic pitch offset above the fretted note, in
    /// semitones.
    pub artificial_harmonic: Option<u8>,
    pub bend: Option<Bend>,
}

impl Note {
    pub fn new(string: u8, fret: u8) -> Self {
        Self {
            string,
            fret,
            ..Self::default()
        }
    }

    pub fn has_property(&self, property: NoteProperty) -> bool {
        self.properties.has(property)
    }

    pub fn set_property(&mut self, property: NoteProperty) {
        self.properties.set(property);
    }

    pub fn has_tapped_harmonic(&self) -> bool {
        self.tapped_harmonic_fret.is_some()
    }

    pub fn has_artificial_harmonic(&self) -> bool {
        self.artificial_harmonic.is_some()
    }

    pub fn has_trill(&self) -> bool {
        self.trilled_fret.is_some()
    }

    /// Rejects combinations of marks that are mutually exclusive: a note
    /// carries at most one harmonic kind and at most one octave sign.
    pub fn check_exclusive_marks(&self) -> Result<()> {
        let harmonics = [
            self.properties.has(NoteProperty::NaturalHarmonic),
            self.artificial_harmonic.is_some(),
            self.tapped_harmonic_fret.is_some(),
        ]
        .iter()
        .filter(|&&set| set)
        .count();
        if harmonics > 1 {
            return Err(Error::inconsistent(
                "harmonic kind",
                format!("{harmonics} exclusive harmonic kinds on one note"),
            ));
        }

        let octaves = [
            NoteProperty::Octave8va,
            NoteProperty::Octave8vb,
            NoteProperty::Octave15ma,
            NoteProperty::Octave15mb,
        ]
        .iter()
        .filter(|&&sign| self.properties.has(sign))
        .count();
        if octaves > 1 {
            return Err(Error::inconsistent(
                "octave sign",
                format!("{octaves} octave signs on one note"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_wire_round_trip() {
        for duration in [
            DurationType::Whole,
            DurationType::Half,
            DurationType::Quarter,
            DurationType::Eighth,
            DurationType::Sixteenth,
            DurationType::ThirtySecond,
            DurationType::SixtyFourth,
        ] {
            assert_eq!(DurationType::from_wire(duration.to_wire()), Some(duration));
        }
        assert_eq!(DurationType::from_wire(5), None);
        assert_eq!(DurationType::from_wire(-3), None);
    }

    #[test]
    fn test_property_set_operations() {
        let mut props = PositionProperties::new();
        assert!(props.is_empty());

        props.set(PositionProperty::Staccato);
        props.set(PositionProperty::PalmMuting);
        assert!(props.has(PositionProperty::Staccato));
        assert!(props.has(PositionProperty::PalmMuting));
        assert!(!props.has(PositionProperty::Dotted));

        props.clear(PositionProperty::Staccato);
        assert!(!props.has(PositionProperty::Staccato));
    }

    #[test]
    fn test_property_set_from_bits_rejects_unknown() {
        assert!(NoteProperties::from_bits(0xFFFF).is_some());
        assert!(NoteProperties::from_bits(0x1_0000).is_none());
    }

    #[test]
    fn test_rest_owns_no_notes() {
        let pos = Position::new(0, DurationType::Eighth);
        assert!(pos.is_rest());
    }

    #[test]
    fn test_exclusive_harmonic_kinds() {
        let mut note = Note::new(0, 12);
        note.set_property(NoteProperty::NaturalHarmonic);
        assert!(note.check_exclusive_marks().is_ok());

        note.tapped_harmonic_fret = Some(19);
        assert!(note.check_exclusive_marks().is_err());
    }

    #[test]
    fn test_exclusive_octave_signs() {
        let mut note = Note::new(1, 3);
        note.set_property(NoteProperty::Octave8va);
        assert!(note.check_exclusive_marks().is_ok());

        note.set_property(NoteProperty::Octave15mb);
        assert!(note.check_exclusive_marks().is_err());
    }
}
