//! Catalog entities shared by every part of the crate.
//!
//! Entities are identified by their URI: two artists, albums or tracks are the
//! same thing exactly when their URIs are equal. Tracks are handed around as
//! `Arc<Track>` so that the discovery engine can reference the same track from
//! several places (seed, per-artist queues, result) without copying it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Catalog identifier, e.g. `spotify:artist:4Z8W4fKeB5YxbusRsdQVPb`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(uri: &str) -> Self {
        Self(uri.to_string())
    }
}

impl From<String> for Uri {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

/// Anything that can be wrapped by a discovery source.
pub trait Resource {
    fn uri(&self) -> &Uri;
    fn name(&self) -> &str;
}

/// Reference to an artist as it appears on tracks and in relation lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub uri: Uri,
    pub name: String,
}

impl ArtistRef {
    pub fn new(uri: impl Into<Uri>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for ArtistRef {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for ArtistRef {}

impl Resource for ArtistRef {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reference to the album a track was released on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRef {
    pub uri: Uri,
    pub name: String,
}

impl AlbumRef {
    pub fn new(uri: impl Into<Uri>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for AlbumRef {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for AlbumRef {}

impl Resource for AlbumRef {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A single recording in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub uri: Uri,
    pub name: String,
    /// 0-100, higher is more popular.
    pub popularity: u8,
    /// Credited artists, main artist first.
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
    pub duration_ms: u32,
    pub track_number: u32,
    pub explicit: bool,
}

impl Track {
    /// Whether `artist` is one of the credited artists.
    #[must_use]
    pub fn is_by(&self, artist: &Uri) -> bool {
        self.artists.iter().any(|a| &a.uri == artist)
    }

    /// Comma separated artist names, for display.
    #[must_use]
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Track {}

impl Resource for Track {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Shared handle to a catalog track.
pub type TrackRef = Arc<Track>;

/// A stored playlist (seed collections and discovery results alike).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub uri: Uri,
    pub name: String,
}

impl Resource for Playlist {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn name(&self) -> &str {
        &self.name
    }
}
