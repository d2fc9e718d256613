use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unrecognized file format: {0:?}")]
    UnrecognizedFormat(String),

    #[error("File truncated while reading {stage}")]
    Truncated { stage: &'static str },

    #[error("Inconsistent data in {field}: {detail}")]
    InconsistentData { field: &'static str, detail: String },

    #[error("Read of {count} bytes at position {position} exceeds input length {length}")]
    ReadPastEnd {
        position: usize,
        count: usize,
        length: usize,
    },

    #[error("Write to output stream failed: {0}")]
    StreamWrite(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Attach a decode stage name to a primitive read failure.
    ///
    /// `ReadPastEnd` carries only cursor coordinates; decoders convert it
    /// once per stage so the surfaced error names the record being read.
    pub fn at_stage(self, stage: &'static str) -> Self {
        match self {
            Error::ReadPastEnd { .. } => Error::Truncated { stage },
            other => other,
        }
    }

    /// Shorthand for an `InconsistentData` error with a formatted detail.
    pub fn inconsistent(field: &'static str, detail: impl Into<String>) -> Self {
        Error::InconsistentData {
            field,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_stage_converts_read_past_end() {
        let err = Error::ReadPastEnd {
            position: 10,
            count: 4,
            length: 12,
        }
        .at_stage("channels");

        match err {
            Error::Truncated { stage } => assert_eq!(stage, "channels"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_at_stage_preserves_other_errors() {
        let err = Error::inconsistent("channel index", "65 out of range").at_stage("tracks");
        assert!(matches!(err, Error::InconsistentData { .. }));
    }
}
