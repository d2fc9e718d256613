use serde::{Deserialize, Serialize};

/// Top-level score metadata, populated once per document before any
/// structural content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreInfo {
    pub song: SongData,
}

/// Flat song metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongData {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub author: AuthorInfo,
    pub arranger: String,
    pub transcriber: String,
    pub copyright: String,
    pub lyrics: String,
    pub performance_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub composer: String,
    pub lyricist: String,
}
