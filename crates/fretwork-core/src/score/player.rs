use serde::{Deserialize, Serialize};

use super::Tuning;

/// A performer in the score, owning a tuning.
///
/// A player's active instrument is assigned through [`PlayerChange`]
/// events, never by direct embedding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub description: String,
    pub tuning: Tuning,
}

impl Player {
    pub fn new(description: impl Into<String>, tuning: Tuning) -> Self {
        Self {
            description: description.into(),
            tuning,
        }
    }
}

/// A MIDI instrument definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub description: String,
    pub midi_preset: u8,
}

impl Instrument {
    pub fn new(description: impl Into<String>, midi_preset: u8) -> Self {
        Self {
            description: description.into(),
            midi_preset,
        }
    }
}

/// A (player, instrument) pair active on one staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePlayer {
    pub player: u32,
    pub instrument: u32,
}

impl ActivePlayer {
    pub fn new(player: u32, instrument: u32) -> Self {
        Self { player, instrument }
    }
}

/// An event assigning which players and instruments are active on which
/// staves from a given position onward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerChange {
    pub position: u32,
    /// Active players per staff, indexed by staff number.
    pub staves: Vec<Vec<ActivePlayer>>,
}

impl PlayerChange {
    pub fn new(position: u32, staves: Vec<Vec<ActivePlayer>>) -> Self {
        Self { position, staves }
    }

    /// Active players on the given staff, empty for unknown staves.
    pub fn active_players(&self, staff: usize) -> &[ActivePlayer] {
        self.staves.get(staff).map(Vec::as_slice).unwrap_or(&[])
    }
}
