//! Per-artist allocation.
//!
//! Every artist moves through the same stages during a run:
//!
//! ```text
//! Uninitialized → StatsComputed → QuickDecision → TracksLoaded
//!               → TotalAllocated → SpilloverComputed → Expanded
//! ```
//!
//! Seed artists walk the whole path. Artists that join through relations
//! jump straight from `Uninitialized` to `TracksLoaded` the first time they
//! receive a share.
//!
//! The accounting invariant `contribution + spillover == result_total` holds
//! from `SpilloverComputed` on, and `contribution` never exceeds the number
//! of queued tracks.

use super::album::AlbumPriorities;
use super::source::{relative_to, Source};
use crate::catalog::Catalog;
use crate::dedup::remove_duplicates;
use crate::filters::{passes_all, AttributeFilter};
use crate::model::{ArtistRef, TrackRef, Uri};
use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Credited on at least one seed track.
    Seed,
    /// Reached through another artist's relations.
    Spillover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Uninitialized,
    StatsComputed,
    QuickDecision,
    TracksLoaded,
    TotalAllocated,
    SpilloverComputed,
    Expanded,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_count(value: f64) -> u32 {
    // `as` saturates, negative and NaN become 0.
    value.round() as u32
}

/// Target number of result tracks for an artist.
///
/// Raw share of the result, grown or shrunk by how the artist's exploitation
/// compares to the cohort average.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_result_total(
    source_share: f64,
    result_size: usize,
    exploitation: f64,
    average_exploitation: f64,
    exploitation_bonus_modifier: f64,
) -> u32 {
    let exploitation_quotient = relative_to(exploitation, average_exploitation);
    let exploitation_bonus = (exploitation_quotient - 1.0) * exploitation_bonus_modifier;
    round_count(source_share * result_size as f64 * (1.0 + exploitation_bonus))
}

/// Fraction of the catalog used once the allocation is fulfilled.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_result_exploitation(result_total: u32, source_tracks: usize, total_tracks: u32) -> f64 {
    if total_tracks == 0 {
        return 0.0;
    }
    ((f64::from(result_total) + source_tracks as f64) / f64::from(total_tracks)).clamp(0.0, 1.0)
}

/// Portion of `result_total` handed to related artists.
#[must_use]
pub fn calculate_spillover(result_exploitation: f64, spillover_parameter: f64, result_total: u32) -> u32 {
    let spillover_rate = result_exploitation * spillover_parameter;
    round_count(spillover_rate * f64::from(result_total)).min(result_total)
}

#[derive(Debug, Clone)]
pub struct ArtistSource {
    pub source: Source<ArtistRef>,
    pub origin: Origin,
    pub stage: Stage,
    pub quick: bool,
    /// Only the top tracks were loaded.
    pub top10: bool,
    pub result_total: u32,
    pub spillover: u32,
    pub contribution: u32,
    /// Pool indices of the relations shares went to: new, then existing
    /// spillover artists, then seed artists.
    pub related_artists: Vec<usize>,
    /// Pool indices of the artists that handed this one a share.
    pub share_contributors: Vec<usize>,
}

impl ArtistSource {
    pub fn new(artist: ArtistRef, origin: Origin, quick: bool) -> Self {
        Self {
            source: Source::new(artist),
            origin,
            stage: Stage::Uninitialized,
            quick,
            top10: false,
            result_total: 0,
            spillover: 0,
            contribution: 0,
            related_artists: Vec::new(),
            share_contributors: Vec::new(),
        }
    }

    pub fn uri(&self) -> &Uri {
        self.source.uri()
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    #[must_use]
    pub fn tracks_loaded(&self) -> bool {
        self.stage >= Stage::TracksLoaded
    }

    pub fn calculate_source_share(&mut self, seed_size: usize) -> f64 {
        self.stage = Stage::StatsComputed;
        self.source.calculate_source_share(seed_size)
    }

    /// First estimate of the allocation, before exploitation is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate_result_share(&self, result_size: usize) -> u32 {
        round_count(self.source.source_share * result_size as f64)
    }

    /// Drop quick mode when the estimated allocation is larger than top
    /// tracks could ever cover.
    pub fn decide_quick(&mut self, result_size: usize, top_tracks_limit: usize) -> bool {
        let estimate = self.estimate_result_share(result_size);
        if self.quick && usize::try_from(estimate).unwrap_or(usize::MAX) > top_tracks_limit {
            debug!("{}: estimated {} tracks, loading full catalog", self.name(), estimate);
            self.quick = false;
        }
        self.stage = Stage::QuickDecision;
        self.quick
    }

    fn undiscovered_from(&self, tracks: &[TrackRef], filters: &[AttributeFilter]) -> Vec<TrackRef> {
        remove_duplicates(tracks, &self.source.source_tracks)
            .into_iter()
            .filter(|track| passes_all(filters, track))
            .collect()
    }

    /// Serve the artist from its top tracks if they hold at least `needed`
    /// undiscovered ones. Otherwise quick mode is dropped and nothing is kept.
    pub fn load_top_tracks<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        needed: u32,
        filters: &[AttributeFilter],
    ) -> Result<bool> {
        let top = catalog
            .top_tracks(self.source.resource(), true)
            .with_context(|| format!("Failed to load top tracks of `{}'", self.name()))?;
        let undiscovered = self.undiscovered_from(&top, filters);

        if undiscovered.len() >= usize::try_from(needed).unwrap_or(usize::MAX) {
            debug!("{} using top {} tracks", self.name(), top.len());
            self.top10 = true;
            self.source.set_undiscovered(undiscovered);
            self.stage = Stage::TracksLoaded;
            Ok(true)
        } else {
            self.quick = false;
            Ok(false)
        }
    }

    /// Catalog size from metadata, without loading any tracks.
    pub fn estimate_total_tracks<C: Catalog + ?Sized>(&mut self, catalog: &C) -> Result<u32> {
        self.source.total_tracks = catalog
            .artist_track_count(self.source.resource())
            .with_context(|| format!("Failed to count tracks of `{}'", self.name()))?;
        Ok(self.source.total_tracks)
    }

    /// Load the full catalog. Its distinct titles make up `total_tracks`,
    /// those missing from the seed the queue.
    pub fn load_undiscovered_tracks<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        filters: &[AttributeFilter],
    ) -> Result<usize> {
        let unique = catalog
            .complete_artist_tracks(self.source.resource(), true)
            .with_context(|| format!("Failed to load tracks of `{}'", self.name()))?;
        self.source.total_tracks = u32::try_from(unique.len()).unwrap_or(u32::MAX);
        let undiscovered = self.undiscovered_from(&unique, filters);
        self.source.set_undiscovered(undiscovered);
        self.top10 = false;
        self.stage = Stage::TracksLoaded;
        Ok(self.source.available())
    }

    /// Load top tracks unconditionally, for an artist reached through
    /// relations.
    pub fn load_spillover_tracks<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        filters: &[AttributeFilter],
    ) -> Result<usize> {
        let top = catalog
            .top_tracks(self.source.resource(), true)
            .with_context(|| format!("Failed to load top tracks of related artist `{}'", self.name()))?;
        let undiscovered = self.undiscovered_from(&top, filters);
        self.source.set_undiscovered(undiscovered);
        self.top10 = true;
        self.stage = Stage::TracksLoaded;
        Ok(self.source.available())
    }

    /// Order the queue by popularity times album priority, highest first.
    /// Equal weights keep load order.
    pub fn set_discovery_priority(&mut self, priorities: &AlbumPriorities) {
        self.source
            .undiscovered_tracks
            .make_contiguous()
            .sort_by(|a, b| priorities.weight(b).total_cmp(&priorities.weight(a)));
    }

    pub fn calculate_exploitation(&mut self) -> f64 {
        self.source.calculate_exploitation()
    }

    pub fn calculate_result_total(
        &mut self,
        result_size: usize,
        average_exploitation: f64,
        exploitation_bonus_modifier: f64,
    ) -> u32 {
        self.result_total = calculate_result_total(
            self.source.source_share,
            result_size,
            self.source.exploitation,
            average_exploitation,
            exploitation_bonus_modifier,
        );
        self.stage = Stage::TotalAllocated;
        self.result_total
    }

    #[must_use]
    pub fn calculate_result_exploitation(&self) -> f64 {
        calculate_result_exploitation(self.result_total, self.source.source_tracks.len(), self.source.total_tracks)
    }

    /// Split `result_total` into own contribution and spillover.
    pub fn calculate_spillover(&mut self, spillover_parameter: f64) -> u32 {
        let result_exploitation = self.calculate_result_exploitation();
        self.spillover = calculate_spillover(result_exploitation, spillover_parameter, self.result_total);
        self.contribution = self.result_total - self.spillover;
        self.clamp_to_inventory();
        self.stage = Stage::SpilloverComputed;
        self.spillover
    }

    /// Move whatever the queue cannot cover from contribution to spillover.
    fn clamp_to_inventory(&mut self) {
        let available = u32::try_from(self.source.available()).unwrap_or(u32::MAX);
        if self.contribution > available {
            let shortfall = self.contribution - available;
            debug!(
                "{}: {} tracks short of its contribution, spilling them over",
                self.name(),
                shortfall
            );
            self.spillover += shortfall;
            self.contribution = available;
        }
    }

    /// Take `share` tracks of another artist's spillover.
    pub fn receive_share(&mut self, share: u32, contributor: usize) {
        self.result_total += share;
        self.contribution += share;
        if !self.share_contributors.contains(&contributor) {
            self.share_contributors.push(contributor);
        }
        self.clamp_to_inventory();
    }

    pub fn mark_expanded(&mut self, related_artists: Vec<usize>) {
        self.related_artists = related_artists;
        self.stage = Stage::Expanded;
    }

    pub fn next_track(&mut self) -> Option<TrackRef> {
        self.source.undiscovered_tracks.pop_front()
    }
}

/// All artist sources of one run, addressed by index and looked up by URI.
#[derive(Debug, Default)]
pub struct ArtistPool {
    artists: Vec<ArtistSource>,
    index: HashMap<Uri, usize>,
}

impl ArtistPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the source for `artist`, creating it if needed.
    pub fn get_or_insert(&mut self, artist: &ArtistRef, origin: Origin, quick: bool) -> usize {
        if let Some(&i) = self.index.get(&artist.uri) {
            return i;
        }
        self.insert(ArtistSource::new(artist.clone(), origin, quick))
    }

    pub fn insert(&mut self, artist: ArtistSource) -> usize {
        let i = self.artists.len();
        self.index.insert(artist.uri().clone(), i);
        self.artists.push(artist);
        i
    }

    #[must_use]
    pub fn position(&self, uri: &Uri) -> Option<usize> {
        self.index.get(uri).copied()
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtistSource> {
        self.artists.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ArtistSource> {
        self.artists.iter_mut()
    }

    /// Names of the artists at `indices`.
    pub fn names(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&i| self.artists.get(i))
            .map(|a| a.name().to_string())
            .collect()
    }
}

impl Index<usize> for ArtistPool {
    type Output = ArtistSource;

    fn index(&self, i: usize) -> &ArtistSource {
        &self.artists[i]
    }
}

impl IndexMut<usize> for ArtistPool {
    fn index_mut(&mut self, i: usize) -> &mut ArtistSource {
        &mut self.artists[i]
    }
}
