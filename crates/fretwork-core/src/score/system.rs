use serde::{Deserialize, Serialize};
use strum::FromRepr;

use super::{PlayerChange, Staff};

/// A horizontal band of staves holding a contiguous run of measures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub staves: Vec<Staff>,
    pub barlines: Vec<Barline>,
    pub player_changes: Vec<PlayerChange>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, FromRepr,
)]
#[repr(u8)]
pub enum BarType {
    #[default]
    Single = 0,
    Double = 1,
    RepeatStart = 2,
    RepeatEnd = 3,
}

impl BarType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }
}

/// A barline, positioned by offset within its system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Barline {
    pub position: u32,
    pub bar_type: BarType,
    /// Number of repeats, meaningful only for [`BarType::RepeatEnd`].
    pub repeat_count: u8,
    pub rehearsal_sign: Option<RehearsalSign>,
}

impl Barline {
    pub fn new(position: u32, bar_type: BarType) -> Self {
        Self {
            position,
            bar_type,
            repeat_count: 0,
            rehearsal_sign: None,
        }
    }

    pub fn has_rehearsal_sign(&self) -> bool {
        self.rehearsal_sign.is_some()
    }
}

/// A rehearsal marker: a letter code plus a free-text description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehearsalSign {
    pub letters: String,
    pub description: String,
}

impl RehearsalSign {
    pub fn new(letters: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            letters: letters.into(),
            description: description.into(),
        }
    }
}
