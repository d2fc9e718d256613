//! The in-memory score object graph populated by the decoders and
//! consumed by the export side.
//!
//! The hierarchy is strict containment: a [`Score`] owns [`System`]s,
//! a system owns [`Staff`]s, a staff owns [`Voice`]s, a voice owns
//! [`Position`]s ordered by onset, and a position owns zero or more
//! [`Note`]s (zero means a rest). Players and instruments live at score
//! level and are connected to staves only through [`PlayerChange`]
//! events.

mod builder;
mod info;
pub mod midi;
mod player;
mod staff;
mod system;
mod tuning;

pub use builder::ScoreBuilder;
pub use info::{AuthorInfo, ScoreInfo, SongData};
pub use player::{ActivePlayer, Instrument, Player, PlayerChange};
pub use staff::{
    Bend, BendKind, Clef, DurationType, Note, NoteProperties, NoteProperty, Position,
    PositionProperties, PositionProperty, Staff, TremoloBar, TremoloEvent, Voice,
};
pub use system::{BarType, Barline, RehearsalSign, System};
pub use tuning::Tuning;

use serde::{Deserialize, Serialize};

/// A complete musical score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub info: ScoreInfo,
    pub players: Vec<Player>,
    pub instruments: Vec<Instrument>,
    pub systems: Vec<System>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }
}
