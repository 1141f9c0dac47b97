//! Spillover expansion through related artists.
//!
//! An artist with spillover hands it to its relations, one hop deep:
//! artists new to the run first, then artists already reached through an
//! earlier expansion, then seed artists with a smaller allocation.

use super::artist::{ArtistPool, ArtistSource, Origin};
use crate::catalog::Catalog;
use crate::filters::AttributeFilter;
use crate::model::ArtistRef;
use anyhow::{Context, Result};
use log::{debug, warn};

/// Split `spillover` into `recipients` shares differing by at most one, the
/// larger shares first.
#[must_use]
pub fn distribute_shares(spillover: u32, recipients: usize) -> Vec<u32> {
    let Ok(n) = u32::try_from(recipients) else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }
    let share = spillover / n;
    let remainder = spillover % n;
    (0..n).map(|i| share + u32::from(i < remainder)).collect()
}

/// Relations of one artist, sorted into distribution groups.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub new: Vec<usize>,
    pub existing: Vec<usize>,
    pub source: Vec<usize>,
}

impl Classification {
    fn contains(&self, i: usize) -> bool {
        self.new.contains(&i) || self.existing.contains(&i) || self.source.contains(&i)
    }

    /// Distribution order: new, existing, source.
    pub fn ordered(self) -> Vec<usize> {
        let mut ordered = self.new;
        ordered.extend(self.existing);
        ordered.extend(self.source);
        ordered
    }
}

pub struct RelatedArtistExpander<'a, C: ?Sized> {
    catalog: &'a C,
    quick: bool,
    filters: &'a [AttributeFilter],
}

impl<'a, C: Catalog + ?Sized> RelatedArtistExpander<'a, C> {
    pub fn new(catalog: &'a C, quick: bool, filters: &'a [AttributeFilter]) -> Self {
        Self { catalog, quick, filters }
    }

    /// Sort `related` into groups, adding sources for artists the run has not
    /// seen yet. Seed artists are only eligible when they hold a smaller
    /// allocation than `artist`.
    pub fn classify(&self, pool: &mut ArtistPool, artist: usize, related: &[ArtistRef]) -> Classification {
        let result_total = pool[artist].result_total;
        let mut classification = Classification::default();

        for resource in related {
            match pool.position(&resource.uri) {
                Some(i) if i == artist || classification.contains(i) => {}
                Some(i) if pool[i].origin == Origin::Seed => {
                    let candidate = &pool[i];
                    if !candidate.source.source_tracks.is_empty() && candidate.result_total < result_total {
                        classification.source.push(i);
                    }
                }
                Some(i) => classification.existing.push(i),
                None => {
                    let i = pool.insert(ArtistSource::new(resource.clone(), Origin::Spillover, self.quick));
                    classification.new.push(i);
                }
            }
        }
        classification
    }

    /// Hand the spillover of `artist` to its relations. Returns the number
    /// of recipients.
    ///
    /// Artists without relations keep their spillover unfulfilled.
    pub fn expand(&self, pool: &mut ArtistPool, artist: usize) -> Result<usize> {
        let spillover = pool[artist].spillover;
        if spillover == 0 {
            return Ok(0);
        }

        let related = self
            .catalog
            .related_artists(pool[artist].source.resource())
            .with_context(|| format!("Failed to load related artists of `{}'", pool[artist].name()))?;
        if related.is_empty() {
            warn!(
                "{} has no related artists, {} spillover tracks stay unallocated",
                pool[artist].name(),
                spillover
            );
            return Ok(0);
        }

        let recipients = self.classify(pool, artist, &related).ordered();
        let shares = distribute_shares(spillover, recipients.len());
        for (&recipient, share) in recipients.iter().zip(shares) {
            if share == 0 {
                continue;
            }
            let target = &mut pool[recipient];
            if !target.tracks_loaded() {
                target.load_spillover_tracks(self.catalog, self.filters)?;
            }
            target.receive_share(share, artist);
            debug!("{} -> {}: {} tracks", pool[artist].name(), pool[recipient].name(), share);
        }

        let count = recipients.len();
        if count == 0 {
            warn!("{} has no eligible related artists", pool[artist].name());
        }
        pool[artist].mark_expanded(recipients);
        Ok(count)
    }
}
