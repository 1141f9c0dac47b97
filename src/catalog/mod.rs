//! External catalog collaborators.
//!
//! The discovery engine never talks to a storage or web API directly. It
//! consumes the operations of [`Catalog`] (read side) and [`PlaylistSink`]
//! (write side). Two implementations ship with the crate: the SQLite backed
//! [`crate::db::SqliteCatalog`] and the in-memory [`MemoryCatalog`].
//!
//! [`CatalogDump`] is the JSON interchange format both of them can be built
//! from.

pub mod memory;

pub use memory::MemoryCatalog;

use crate::dedup::remove_duplicates;
use crate::model::{AlbumRef, ArtistRef, Playlist, TrackRef, Uri};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Number of top tracks a catalog reports per artist.
pub const TOP_TRACKS: usize = 10;

/// Read access to a music catalog.
///
/// Required methods return data as stored; lookups of unknown resources are
/// errors, while an artist without relations simply has an empty list.
pub trait Catalog {
    fn playlist(&self, uri: &Uri) -> Result<Playlist>;

    /// Look a playlist up by its exact name.
    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>>;

    fn playlist_tracks(&self, playlist: &Uri) -> Result<Vec<TrackRef>>;

    /// Cheap estimate of an artist's catalog size from album metadata.
    fn artist_track_count(&self, artist: &ArtistRef) -> Result<u32>;

    /// Up to [`TOP_TRACKS`] most popular tracks of `artist`.
    fn artist_top_tracks(&self, artist: &ArtistRef) -> Result<Vec<TrackRef>>;

    /// Every track credited to `artist`, album by album.
    fn artist_tracks(&self, artist: &ArtistRef) -> Result<Vec<TrackRef>>;

    /// Album size as reported by metadata.
    fn album_track_count(&self, album: &AlbumRef) -> Result<u32>;

    fn album_tracks(&self, album: &AlbumRef) -> Result<Vec<TrackRef>>;

    /// Related artists, most relevant first.
    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>>;

    /// Resolve a playlist given either its URI or its exact name.
    fn resolve_playlist(&self, query: &str) -> Result<Playlist> {
        if let Some(playlist) = self.find_playlist(query)? {
            return Ok(playlist);
        }
        self.playlist(&Uri::from(query))
    }

    fn complete_playlist_tracks(&self, playlist: &Uri, dedup: bool) -> Result<Vec<TrackRef>> {
        let tracks = self.playlist_tracks(playlist)?;
        Ok(if dedup { remove_duplicates(&tracks, &[]) } else { tracks })
    }

    fn top_tracks(&self, artist: &ArtistRef, dedup: bool) -> Result<Vec<TrackRef>> {
        let tracks = self.artist_top_tracks(artist)?;
        Ok(if dedup { remove_duplicates(&tracks, &[]) } else { tracks })
    }

    fn complete_artist_tracks(&self, artist: &ArtistRef, dedup: bool) -> Result<Vec<TrackRef>> {
        let tracks = self.artist_tracks(artist)?;
        Ok(if dedup { remove_duplicates(&tracks, &[]) } else { tracks })
    }

    fn complete_album_tracks(&self, album: &AlbumRef, dedup: bool) -> Result<Vec<TrackRef>> {
        let tracks = self.album_tracks(album)?;
        Ok(if dedup { remove_duplicates(&tracks, &[]) } else { tracks })
    }
}

/// Write access: where finished discovery results end up.
pub trait PlaylistSink {
    /// Store `tracks` in order under a name derived from `name`, made unique
    /// among existing playlists.
    fn create_playlist(&mut self, name: &str, tracks: &[TrackRef]) -> Result<Playlist>;
}

/// Turn `name` into one not present in `existing` by appending ` (2)`, ` (3)`...
#[must_use]
pub fn unique_playlist_name(name: &str, existing: &[String]) -> String {
    if !existing.iter().any(|n| n == name) {
        return name.to_string();
    }
    (2..)
        .map(|i| format!("{name} ({i})"))
        .find(|candidate| !existing.iter().any(|n| n == candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Serialized catalog, referencing entities by URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDump {
    pub artists: Vec<ArtistEntry>,
    pub albums: Vec<AlbumEntry>,
    pub tracks: Vec<TrackEntry>,
    pub playlists: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistEntry {
    pub uri: Uri,
    pub name: String,
    /// Related artist URIs, most relevant first.
    #[serde(default)]
    pub related: Vec<Uri>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumEntry {
    pub uri: Uri,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Uri>,
    /// Track count claimed by metadata; may disagree with the actual tracks.
    pub total_tracks: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEntry {
    pub uri: Uri,
    pub name: String,
    #[serde(default)]
    pub popularity: u8,
    pub artists: Vec<Uri>,
    pub album: Uri,
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub explicit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub uri: Uri,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Uri>,
}

impl CatalogDump {
    /// Parse a dump from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_playlist_name() {
        let existing = vec!["Mix".to_string(), "Mix (2)".to_string()];
        assert_eq!(unique_playlist_name("Fresh", &existing), "Fresh");
        assert_eq!(unique_playlist_name("Mix", &existing), "Mix (3)");
    }

    #[test]
    fn test_dump_defaults_missing_sections() {
        let dump = CatalogDump::from_json(r#"{"artists": [{"uri": "a:1", "name": "A"}]}"#).unwrap();
        assert_eq!(dump.artists.len(), 1);
        assert!(dump.artists[0].related.is_empty());
        assert!(dump.tracks.is_empty());
    }
}
