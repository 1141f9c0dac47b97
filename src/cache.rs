//! Per-session resource cache.
//!
//! Catalog backends hand out tracks through a [`ResourceCache`] so that every
//! lookup of the same URI yields the same `Arc<Track>`. The cache is an
//! ordinary value owned by whoever serves the session; dropping the catalog
//! drops the cache.

use crate::model::{ArtistRef, Track, TrackRef, Uri};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ResourceCache {
    tracks: HashMap<Uri, TrackRef>,
    artists: HashMap<Uri, ArtistRef>,
    hits: u64,
    misses: u64,
}

impl ResourceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached track for `track.uri`, or cache and return `track`.
    pub fn intern_track(&mut self, track: Track) -> TrackRef {
        if let Some(existing) = self.tracks.get(&track.uri) {
            self.hits += 1;
            return Arc::clone(existing);
        }
        self.misses += 1;
        for artist in &track.artists {
            self.artists
                .entry(artist.uri.clone())
                .or_insert_with(|| artist.clone());
        }
        let shared = Arc::new(track);
        self.tracks.insert(shared.uri.clone(), Arc::clone(&shared));
        shared
    }

    /// Cached track for `uri`, counted as a hit when present.
    pub fn track(&mut self, uri: &Uri) -> Option<TrackRef> {
        let track = self.tracks.get(uri).cloned();
        if track.is_some() {
            self.hits += 1;
        }
        track
    }

    pub fn intern_artist(&mut self, artist: ArtistRef) -> ArtistRef {
        self.artists
            .entry(artist.uri.clone())
            .or_insert(artist)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// (hits, misses) of track interning.
    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
