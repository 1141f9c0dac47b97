//! Merge per-artist queues into the final track list.

use super::artist::ArtistPool;
use crate::model::TrackRef;
use log::warn;
use rand::Rng;

/// Picks tracks artist by artist until every contribution is served or the
/// result is full.
///
/// The first `miniature_size` picks go to the pool's leading artists in
/// order, giving a small preview of the whole result. Every later pick is
/// uniformly random among the artists with remaining contribution. Each
/// artist's queue is consumed front to back.
#[derive(Debug, Clone, Copy)]
pub struct Interleaver {
    miniature_size: usize,
}

impl Interleaver {
    pub fn new(miniature_size: usize) -> Self {
        Self { miniature_size }
    }

    /// Interleave the artists at `order` (pool indices, largest allocation
    /// first). Artists without contribution are skipped.
    ///
    /// An artist whose queue runs dry before its contribution is served
    /// still uses up its pick, so the result can come out shorter than the
    /// sum of contributions.
    pub fn interleave<R: Rng + ?Sized>(
        &self,
        pool: &mut ArtistPool,
        order: &[usize],
        result_size: usize,
        rng: &mut R,
    ) -> Vec<TrackRef> {
        let mut remaining: Vec<(usize, u32)> = order
            .iter()
            .map(|&i| (i, pool[i].contribution))
            .filter(|&(_, contribution)| contribution > 0)
            .collect();
        let total: usize = remaining.iter().map(|&(_, c)| c as usize).sum();
        let mut result = Vec::with_capacity(total.min(result_size));
        let mut most_popular = 0;

        while !remaining.is_empty() && result.len() < result_size {
            let pick = if remaining.len() >= self.miniature_size && most_popular < self.miniature_size {
                most_popular += 1;
                most_popular - 1
            } else {
                rng.gen_range(0..remaining.len())
            };

            let (artist, countdown) = &mut remaining[pick];
            let source = &mut pool[*artist];
            match source.next_track() {
                Some(track) => result.push(track),
                None => warn!(
                    "Artist {} queued with no tracks and {} contributions left",
                    source.name(),
                    countdown
                ),
            }
            *countdown -= 1;
            if *countdown == 0 {
                remaining.remove(pick);
            }
        }
        result
    }
}
