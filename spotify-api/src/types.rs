//! Parameter types shared by several endpoints.

use crate::error::{Result, SpotifyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Search target type, mapped to the API `type` parameter.
///
/// | Variant     | API value   | Response container |
/// |-------------|-------------|--------------------|
/// | `Track`     | `track`     | `tracks`           |
/// | `Album`     | `album`     | `albums`           |
/// | `Artist`    | `artist`    | `artists`          |
/// | `Playlist`  | `playlist`  | `playlists`        |
/// | `Show`      | `show`      | `shows`            |
/// | `Episode`   | `episode`   | `episodes`         |
/// | `Audiobook` | `audiobook` | `audiobooks`       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Track,
    Album,
    Artist,
    Playlist,
    Show,
    Episode,
    Audiobook,
}

impl SearchType {
    /// Value sent in the `type` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Playlist => "playlist",
            Self::Show => "show",
            Self::Episode => "episode",
            Self::Audiobook => "audiobook",
        }
    }

    /// Parse a comma-separated list such as `"artist,album"`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }

    /// Join several types into one `type` parameter value.
    pub fn join(types: &[Self]) -> String {
        types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = SpotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "track" => Ok(Self::Track),
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            "playlist" => Ok(Self::Playlist),
            "show" => Ok(Self::Show),
            "episode" => Ok(Self::Episode),
            "audiobook" => Ok(Self::Audiobook),
            other => Err(SpotifyError::Other(format!("unknown search type: {other}"))),
        }
    }
}
