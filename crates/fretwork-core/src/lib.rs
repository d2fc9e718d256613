pub mod error;
pub mod export;
pub mod formats;
pub mod score;
pub mod stream;

pub use error::{Error, Result};
pub use export::{export_bytes, export_file};
pub use formats::{FileVersion, import_bytes, import_file};
pub use score::{
    ActivePlayer, BarType, Barline, Clef, DurationType, Instrument, Note, Player, PlayerChange,
    Position, RehearsalSign, Score, ScoreBuilder, Staff, System, Tuning, Voice,
};
pub use stream::{InputStream, OutputStream};
