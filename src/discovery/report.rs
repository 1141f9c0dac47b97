//! What a discovery run produced and how it got there.

use super::album::AlbumSource;
use super::artist::{ArtistPool, Origin};
use crate::dedup::uniform_title;
use crate::model::{Playlist, TrackRef, Uri};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct ArtistSummary {
    pub uri: Uri,
    pub name: String,
    pub origin: Origin,
    pub source_tracks: usize,
    pub total_tracks: u32,
    pub source_share: f64,
    pub exploitation: f64,
    pub result_exploitation: f64,
    /// Queued undiscovered tracks before interleaving.
    pub available: usize,
    pub result_total: u32,
    pub spillover: u32,
    pub contribution: u32,
    pub top10: bool,
    pub related_artists: Vec<String>,
    pub share_contributors: Vec<String>,
}

impl ArtistSummary {
    pub fn from_pool(pool: &ArtistPool, i: usize) -> Self {
        let artist = &pool[i];
        Self {
            uri: artist.uri().clone(),
            name: artist.name().to_string(),
            origin: artist.origin,
            source_tracks: artist.source.source_tracks.len(),
            total_tracks: artist.source.total_tracks,
            source_share: artist.source.source_share,
            exploitation: artist.source.exploitation,
            result_exploitation: artist.calculate_result_exploitation(),
            available: artist.source.available(),
            result_total: artist.result_total,
            spillover: artist.spillover,
            contribution: artist.contribution,
            top10: artist.top10,
            related_artists: pool.names(&artist.related_artists),
            share_contributors: pool.names(&artist.share_contributors),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumSummary {
    pub uri: Uri,
    pub name: String,
    pub source_tracks: usize,
    pub total_tracks: u32,
    pub source_share: f64,
    pub exploitation: f64,
    pub priority: f64,
}

impl From<&AlbumSource> for AlbumSummary {
    fn from(album: &AlbumSource) -> Self {
        Self {
            uri: album.uri().clone(),
            name: album.name().to_string(),
            source_tracks: album.source.source_tracks.len(),
            total_tracks: album.source.total_tracks,
            source_share: album.source.source_share,
            exploitation: album.source.exploitation,
            priority: album.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub seed: Playlist,
    pub seed_size: usize,
    pub result_size: usize,
    /// The result, in playlist order.
    pub tracks: Vec<TrackRef>,
    /// Seed artists by descending allocation, then artists reached through
    /// relations.
    pub artists: Vec<ArtistSummary>,
    /// Albums by descending seed share.
    pub albums: Vec<AlbumSummary>,
    pub average_album_share: f64,
    pub average_album_exploitation: f64,
    pub average_artist_exploitation: f64,
}

impl DiscoveryReport {
    pub fn empty(seed: Playlist, result_size: usize) -> Self {
        Self {
            seed,
            seed_size: 0,
            result_size,
            tracks: Vec::new(),
            artists: Vec::new(),
            albums: Vec::new(),
            average_album_share: 0.0,
            average_album_exploitation: 0.0,
            average_artist_exploitation: 0.0,
        }
    }

    /// Sum of contributions over all artists.
    #[must_use]
    pub fn total_contribution(&self) -> u32 {
        self.artists.iter().map(|a| a.contribution).sum()
    }

    pub fn seed_artists(&self) -> impl Iterator<Item = &ArtistSummary> {
        self.artists.iter().filter(|a| a.origin == Origin::Seed)
    }

    pub fn spillover_artists(&self) -> impl Iterator<Item = &ArtistSummary> {
        self.artists.iter().filter(|a| a.origin == Origin::Spillover)
    }
}

fn percent(fraction: f64) -> f64 {
    (fraction * 10_000.0).round() / 100.0
}

fn truncated(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

impl fmt::Display for DiscoveryReport {
    /// The allocation table.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} seed tracks, {} artists, {} albums",
            self.seed.name,
            self.seed_size,
            self.seed_artists().count(),
            self.albums.len()
        )?;
        for (i, album) in self.albums.iter().enumerate() {
            writeln!(
                f,
                "{:3}  {:30} Share: {:6}%, Exploitation: {:6}%, Priority: {:.3}",
                i + 1,
                truncated(&uniform_title(&album.name), 30),
                percent(album.source_share),
                percent(album.exploitation),
                album.priority
            )?;
        }
        writeln!(f, "Average album share: {}%", percent(self.average_album_share))?;
        writeln!(f, "Average album exploitation: {}%", percent(self.average_album_exploitation))?;
        writeln!(f, "Average artist exploitation: {}%", percent(self.average_artist_exploitation))?;
        writeln!(f)?;

        for (i, artist) in self.artists.iter().enumerate() {
            write!(
                f,
                "{:3} - {:25} - Source share: {:6}%, Exploitation: {:6}%, End exploitation: {:6}%, \
                 Available: {:3}, Result total: {:3}, Spillover: {:3}, Contribution: {:3}",
                i + 1,
                truncated(&artist.name, 25),
                percent(artist.source_share),
                percent(artist.exploitation),
                percent(artist.result_exploitation),
                artist.available,
                artist.result_total,
                artist.spillover,
                artist.contribution
            )?;
            if artist.top10 {
                write!(f, ", top 10")?;
            }
            if !artist.share_contributors.is_empty() {
                write!(f, ", from {}", artist.share_contributors.join(", "))?;
            }
            writeln!(f)?;
        }
        write!(f, "TOTAL: {} of {} requested", self.total_contribution(), self.result_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let seed = Playlist {
            uri: Uri::from("p:1"),
            name: "Empty".into(),
        };
        let report = DiscoveryReport::empty(seed, 50);
        assert_eq!(report.total_contribution(), 0);
        let table = report.to_string();
        assert!(table.starts_with("Empty: 0 seed tracks"));
        assert!(table.ends_with("TOTAL: 0 of 50 requested"));
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0.123_456), 12.35);
        assert_eq!(percent(1.0), 100.0);
    }
}
