//! Per-entity discovery statistics.
//!
//! A [`Source`] wraps an artist or album for the duration of one discovery
//! run and records what the seed collection says about it: which seed tracks
//! belong to it, how large its catalog is and which of its tracks the seed
//! does not contain yet.

use crate::model::{Resource, TrackRef, Uri};
use log::warn;
use std::collections::VecDeque;

/// Fraction of the seed attributed to an entity.
///
/// An empty seed gives every entity a share of 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_source_share(source_tracks: usize, total_seed_tracks: usize) -> f64 {
    if total_seed_tracks == 0 {
        return 0.0;
    }
    source_tracks as f64 / total_seed_tracks as f64
}

/// Fraction of an entity's catalog already present in the seed.
///
/// Returns 0 for an empty catalog. Catalog sizes can be metadata estimates,
/// so the ratio may come out above 1; such values are not a valid fraction
/// and are reset to 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_exploitation(source_tracks: usize, total_tracks: u32) -> f64 {
    if total_tracks == 0 {
        return 0.0;
    }
    let exploitation = source_tracks as f64 / f64::from(total_tracks);
    if (0.0..=1.0).contains(&exploitation) {
        exploitation
    } else {
        0.0
    }
}

/// `value / average`, or 1 when there is no average to compare against.
#[must_use]
pub fn relative_to(value: f64, average: f64) -> f64 {
    if average > 0.0 {
        value / average
    } else {
        1.0
    }
}

/// Discovery wrapper around an artist or album.
///
/// Equality is identity of the wrapped resource: two sources are equal when
/// their resources share a URI.
#[derive(Debug, Clone)]
pub struct Source<R> {
    resource: R,
    /// Seed tracks attributed to this entity, in seed order.
    pub source_tracks: Vec<TrackRef>,
    /// Catalog size, exact or estimated.
    pub total_tracks: u32,
    /// Catalog tracks absent from the seed, in discovery order.
    pub undiscovered_tracks: VecDeque<TrackRef>,
    pub exploitation: f64,
    pub source_share: f64,
}

impl<R: Resource> Source<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            source_tracks: Vec::new(),
            total_tracks: 0,
            undiscovered_tracks: VecDeque::new(),
            exploitation: 0.0,
            source_share: 0.0,
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn uri(&self) -> &Uri {
        self.resource.uri()
    }

    pub fn name(&self) -> &str {
        self.resource.name()
    }

    pub fn calculate_source_share(&mut self, seed_size: usize) -> f64 {
        self.source_share = calculate_source_share(self.source_tracks.len(), seed_size);
        self.source_share
    }

    pub fn calculate_exploitation(&mut self) -> f64 {
        self.exploitation = calculate_exploitation(self.source_tracks.len(), self.total_tracks);
        if self.exploitation == 0.0 && self.total_tracks > 0 && !self.source_tracks.is_empty() {
            warn!(
                "Exploitation of `{}' out of range ({} seed tracks, {} total), using 0",
                self.name(),
                self.source_tracks.len(),
                self.total_tracks
            );
        }
        self.exploitation
    }

    pub fn set_undiscovered(&mut self, tracks: impl IntoIterator<Item = TrackRef>) {
        self.undiscovered_tracks = tracks.into_iter().collect();
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.undiscovered_tracks.len()
    }
}

impl<R: Resource> PartialEq for Source<R> {
    fn eq(&self, other: &Self) -> bool {
        self.uri() == other.uri()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlbumRef, ArtistRef, Track};
    use std::sync::Arc;

    fn seed_track(i: usize) -> TrackRef {
        Arc::new(Track {
            uri: Uri::new(format!("t:{i}")),
            name: format!("Song {i}"),
            popularity: 50,
            artists: vec![ArtistRef::new("a:1", "A")],
            album: AlbumRef::new("al:1", "Al"),
            duration_ms: 1000,
            track_number: 1,
            explicit: false,
        })
    }

    #[test]
    fn test_source_share() {
        assert_eq!(calculate_source_share(5, 20), 0.25);
        assert_eq!(calculate_source_share(0, 20), 0.0);
        assert_eq!(calculate_source_share(3, 0), 0.0);
    }

    #[test]
    fn test_exploitation_bounds() {
        assert_eq!(calculate_exploitation(5, 20), 0.25);
        assert_eq!(calculate_exploitation(5, 5), 1.0);
        assert_eq!(calculate_exploitation(5, 0), 0.0);
        // Estimated total smaller than what the seed already holds.
        assert_eq!(calculate_exploitation(12, 10), 0.0);
    }

    #[test]
    fn test_exploitation_always_a_fraction() {
        for source in 0..30 {
            for total in 0..30 {
                let e = calculate_exploitation(source, total);
                assert!((0.0..=1.0).contains(&e), "{source}/{total} gave {e}");
            }
        }
    }

    #[test]
    fn test_relative_to_zero_average_is_neutral() {
        assert_eq!(relative_to(0.2, 0.1), 2.0);
        assert_eq!(relative_to(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_source_statistics() {
        let mut source = Source::new(ArtistRef::new("a:1", "A"));
        source.source_tracks = (0..4).map(seed_track).collect();
        source.total_tracks = 16;
        assert_eq!(source.calculate_source_share(8), 0.5);
        assert_eq!(source.calculate_exploitation(), 0.25);

        source.total_tracks = 2;
        assert_eq!(source.calculate_exploitation(), 0.0);
    }

    #[test]
    fn test_equality_by_uri() {
        let a = Source::new(ArtistRef::new("a:1", "A"));
        let renamed = Source::new(ArtistRef::new("a:1", "Renamed"));
        let b = Source::new(ArtistRef::new("a:2", "B"));
        assert!(a == renamed);
        assert!(a != b);
    }
}
