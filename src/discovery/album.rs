//! Album priorities.
//!
//! Albums that are heavily represented or heavily exploited in the seed get a
//! modest boost, so that their remaining tracks surface earlier in their
//! artists' queues.

use super::source::{relative_to, Source};
use crate::catalog::Catalog;
use crate::model::{AlbumRef, TrackRef, Uri};
use anyhow::{Context, Result};
use std::collections::HashMap;

/// `1 + bonus_modifier * (share/avg_share + exploitation/avg_exploitation) / 2`.
///
/// A ratio against a zero average counts as 1.
#[must_use]
pub fn calculate_priority(
    source_share: f64,
    exploitation: f64,
    average_share: f64,
    average_exploitation: f64,
    bonus_modifier: f64,
) -> f64 {
    let share_ratio = relative_to(source_share, average_share);
    let exploitation_ratio = relative_to(exploitation, average_exploitation);
    1.0 + bonus_modifier * (share_ratio + exploitation_ratio) / 2.0
}

#[derive(Debug, Clone)]
pub struct AlbumSource {
    pub source: Source<AlbumRef>,
    pub priority: f64,
}

impl AlbumSource {
    pub fn new(album: AlbumRef) -> Self {
        Self {
            source: Source::new(album),
            priority: 1.0,
        }
    }

    pub fn uri(&self) -> &Uri {
        self.source.uri()
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Determine the album's size: the metadata count in quick mode, the
    /// number of distinct titles otherwise.
    pub fn load_total_tracks<C: Catalog + ?Sized>(&mut self, catalog: &C, quick: bool) -> Result<u32> {
        let album = self.source.resource();
        self.source.total_tracks = if quick {
            catalog
                .album_track_count(album)
                .with_context(|| format!("Failed to count tracks of album `{}'", album.name))?
        } else {
            let tracks = catalog
                .complete_album_tracks(album, true)
                .with_context(|| format!("Failed to load tracks of album `{}'", album.name))?;
            u32::try_from(tracks.len()).unwrap_or(u32::MAX)
        };
        Ok(self.source.total_tracks)
    }

    pub fn calculate_priority(&mut self, average_share: f64, average_exploitation: f64, bonus_modifier: f64) -> f64 {
        self.priority = calculate_priority(
            self.source.source_share,
            self.source.exploitation,
            average_share,
            average_exploitation,
            bonus_modifier,
        );
        self.priority
    }
}

/// Album priorities by URI; albums missing from the map count as 1.
#[derive(Debug, Clone, Default)]
pub struct AlbumPriorities(HashMap<Uri, f64>);

impl AlbumPriorities {
    pub fn from_albums(albums: &[AlbumSource]) -> Self {
        Self(albums.iter().map(|a| (a.uri().clone(), a.priority)).collect())
    }

    #[must_use]
    pub fn get(&self, album: &Uri) -> f64 {
        self.0.get(album).copied().unwrap_or(1.0)
    }

    /// Discovery weight of a track: popularity scaled by its album's priority.
    #[must_use]
    pub fn weight(&self, track: &TrackRef) -> f64 {
        f64::from(track.popularity) * self.get(&track.album.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_album_gets_bonus_modifier() {
        let priority = calculate_priority(0.1, 0.2, 0.1, 0.2, 0.1);
        assert!((priority - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_heavy_album_priority() {
        // Twice the average share, average exploitation.
        let priority = calculate_priority(0.2, 0.5, 0.1, 0.5, 0.1);
        assert!((priority - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_zero_averages_are_neutral() {
        let priority = calculate_priority(0.0, 0.0, 0.0, 0.0, 0.1);
        assert!((priority - 1.1).abs() < 1e-12);
        assert!(priority.is_finite());
    }

    #[test]
    fn test_unknown_album_defaults_to_one() {
        let mut album = AlbumSource::new(AlbumRef::new("al:1", "Known"));
        album.priority = 1.5;
        let priorities = AlbumPriorities::from_albums(&[album]);
        assert_eq!(priorities.get(&Uri::from("al:1")), 1.5);
        assert_eq!(priorities.get(&Uri::from("al:2")), 1.0);
    }
}
