//! Output side of the codec: the object-graph serializer, the native
//! container document writer, and console formatting.

mod console;
mod document;
mod object_stream;

pub use console::{format_score_console, format_score_summary};
pub use document::{
    CLASS_INSTRUMENT, CLASS_PLAYER, CLASS_SCORE, CLASS_SYSTEM, CLASS_TUNING, export_bytes,
    export_file,
};
pub use object_stream::{NEW_CLASS_TAG, ObjectKey, ObjectWriter, SMALL_VECTOR_CEILING};
