//! File format recognition and import dispatch.
//!
//! Every supported file starts with the same header convention: a
//! 30-byte block holding a u8-length-prefixed identifier string. The
//! resolver maps that identifier onto a [`FileVersion`] by exact match
//! and hands the stream to the matching dialect decoder. Extending
//! dialect support means adding a [`SIGNATURES`] entry plus a decoder.

pub mod guitar_pro;
pub mod native;

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::score::{Score, ScoreBuilder};
use crate::stream::{HEADER_BLOCK_SIZE, InputStream};

/// A supported binary dialect, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileVersion {
    Gp3,
    Gp4,
    Gp5,
    Native,
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gp3 => "Guitar Pro 3",
            Self::Gp4 => "Guitar Pro 4",
            Self::Gp5 => "Guitar Pro 5",
            Self::Native => "Fretwork",
        };
        write!(f, "{name}")
    }
}

/// Signature written at the start of native container files.
pub const NATIVE_SIGNATURE: &str = "FRETWORK TABLATURE v2.00";

/// Recognized header identifiers. Lookup is byte-exact; no fuzzy
/// matching.
pub const SIGNATURES: &[(&str, FileVersion)] = &[
    ("FICHIER GUITAR PRO v3.00", FileVersion::Gp3),
    ("FICHIER GUITAR PRO v4.00", FileVersion::Gp4),
    ("FICHIER GUITAR PRO v4.06", FileVersion::Gp4),
    ("FICHIER GUITAR PRO L4.06", FileVersion::Gp4),
    ("FICHIER GUITAR PRO v5.00", FileVersion::Gp5),
    ("FICHIER GUITAR PRO v5.10", FileVersion::Gp5),
    (NATIVE_SIGNATURE, FileVersion::Native),
];

impl FileVersion {
    /// Resolves a header identifier string to a version.
    pub fn resolve(signature: &str) -> Option<Self> {
        SIGNATURES
            .iter()
            .find(|(s, _)| *s == signature)
            .map(|&(_, v)| v)
    }

    /// Reads the header block from the start of a stream and resolves it.
    ///
    /// Consumes exactly [`HEADER_BLOCK_SIZE`] bytes on success; the
    /// decoder continues from there.
    pub fn sniff(stream: &mut InputStream<'_>) -> Result<Self> {
        let signature = stream
            .read_fixed_string(HEADER_BLOCK_SIZE - 1)
            .map_err(|e| match e {
                Error::InconsistentData { .. } => {
                    Error::UnrecognizedFormat("malformed header block".into())
                }
                other => other.at_stage("header signature"),
            })?;

        debug!("header signature: {signature:?}");
        Self::resolve(&signature).ok_or(Error::UnrecognizedFormat(signature))
    }
}

/// Decodes a tablature file into `score`.
///
/// On failure the score's state is unspecified; callers must discard it.
pub fn import_file(path: impl AsRef<Path>, score: &mut Score) -> Result<()> {
    let data = fs::read(path)?;
    import_bytes(&data, score)
}

/// Decodes an in-memory tablature file into `score`.
pub fn import_bytes(data: &[u8], score: &mut Score) -> Result<()> {
    let mut stream = InputStream::new(data);
    let version = FileVersion::sniff(&mut stream)?;
    debug!("importing {version} file ({} bytes)", data.len());

    let mut builder = ScoreBuilder::new(score);
    match version {
        FileVersion::Gp3 | FileVersion::Gp4 | FileVersion::Gp5 => {
            guitar_pro::GpImporter::new(version).import(&mut stream, &mut builder)
        }
        FileVersion::Native => native::import(&mut stream, &mut builder),
    }
}
