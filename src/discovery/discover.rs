//! The discovery pipeline.

use super::album::{AlbumPriorities, AlbumSource};
use super::artist::{ArtistPool, Origin};
use super::interleave::Interleaver;
use super::related::RelatedArtistExpander;
use super::report::{AlbumSummary, ArtistSummary, DiscoveryReport};
use crate::catalog::{Catalog, PlaylistSink};
use crate::config::DiscoveryConfig;
use crate::model::{Playlist, TrackRef, Uri};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::time::Instant;

/// Result of [`Discover::extend`].
#[derive(Debug, Clone)]
pub struct Extension {
    /// The stored result, absent when nothing was found.
    pub playlist: Option<Playlist>,
    pub report: DiscoveryReport,
}

/// Grows a seed playlist into a discovery playlist.
///
/// Every seed artist gets a share of the result proportional to its share
/// of the seed, adjusted by how much of its catalog the seed already holds.
/// Part of that share spills over to related artists, more so for artists
/// that would otherwise be drained.
pub struct Discover {
    config: DiscoveryConfig,
    rng: StdRng,
}

impl Discover {
    pub fn new(config: DiscoveryConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Run discovery on `seed` and store the result as `"<seed name><suffix>"`.
    ///
    /// # Errors
    ///
    /// Fails when the catalog cannot deliver data the run needs, or when the
    /// result cannot be stored.
    pub fn extend<S: Catalog + PlaylistSink + ?Sized>(
        &mut self,
        store: &mut S,
        seed: &Playlist,
        result_size: usize,
    ) -> Result<Extension> {
        let report = self.run(&*store, seed, result_size)?;
        if report.tracks.is_empty() {
            warn!("Nothing discovered for {}, no playlist created", seed.name);
            return Ok(Extension { playlist: None, report });
        }

        let name = format!("{}{}", seed.name, self.config.playlist_suffix);
        let playlist = store
            .create_playlist(&name, &report.tracks)
            .with_context(|| format!("Failed to create playlist `{name}'"))?;
        info!("Created {} with {} tracks", playlist.name, report.tracks.len());
        Ok(Extension {
            playlist: Some(playlist),
            report,
        })
    }

    /// Compute a discovery result of at most `result_size` tracks without
    /// storing it.
    pub fn run<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        seed: &Playlist,
        result_size: usize,
    ) -> Result<DiscoveryReport> {
        let seed_tracks = catalog
            .complete_playlist_tracks(&seed.uri, true)
            .with_context(|| format!("Failed to load seed playlist `{}'", seed.name))?;
        if seed_tracks.is_empty() {
            warn!("{} has no tracks to discover from", seed.name);
            return Ok(DiscoveryReport::empty(seed.clone(), result_size));
        }

        let quick = self.config.quick;
        let (mut albums, mut pool) = group(&seed_tracks, quick);
        info!(
            "There are {} artists and {} albums in {}",
            pool.len(),
            albums.len(),
            seed.name
        );

        let started = Instant::now();
        let (average_album_share, average_album_exploitation) =
            self.prepare_albums(catalog, &mut albums, seed_tracks.len())?;
        info!("{:.2}s to load albums", started.elapsed().as_secs_f64());

        let started = Instant::now();
        let priorities = AlbumPriorities::from_albums(&albums);
        let average_artist_exploitation =
            self.prepare_artists(catalog, &mut pool, &priorities, seed_tracks.len(), result_size)?;
        info!("{:.2}s to load artists", started.elapsed().as_secs_f64());

        for artist in pool.iter_mut() {
            artist.calculate_result_total(
                result_size,
                average_artist_exploitation,
                self.config.artist_exploitation_bonus_modifier,
            );
        }

        let seed_count = pool.len();
        let mut order: Vec<usize> = (0..seed_count).collect();
        order.sort_by(|&a, &b| pool[b].result_total.cmp(&pool[a].result_total));

        for &i in &order {
            let artist = &mut pool[i];
            artist.calculate_spillover(self.config.spillover);
            debug!(
                "{}: result total {}, spillover {}, contribution {}, available {}",
                artist.name(),
                artist.result_total,
                artist.spillover,
                artist.contribution,
                artist.source.available()
            );
        }

        let expander = RelatedArtistExpander::new(catalog, quick, &self.config.filters);
        for &i in &order {
            expander.expand(&mut pool, i)?;
        }

        let mut summaries: Vec<ArtistSummary> = order.iter().map(|&i| ArtistSummary::from_pool(&pool, i)).collect();
        summaries.extend((seed_count..pool.len()).map(|i| ArtistSummary::from_pool(&pool, i)));
        order.extend((seed_count..pool.len()).filter(|&i| pool[i].contribution > 0));

        let total: u32 = order.iter().map(|&i| pool[i].contribution).sum();
        info!(
            "{} artists ({} through relations) contribute {} tracks",
            order.len(),
            pool.len() - seed_count,
            total
        );

        let tracks = Interleaver::new(self.config.miniature_size).interleave(&mut pool, &order, result_size, &mut self.rng);

        albums.sort_by(|a, b| b.source.source_share.total_cmp(&a.source.source_share));
        Ok(DiscoveryReport {
            seed: seed.clone(),
            seed_size: seed_tracks.len(),
            result_size,
            tracks,
            artists: summaries,
            albums: albums.iter().map(AlbumSummary::from).collect(),
            average_album_share,
            average_album_exploitation,
            average_artist_exploitation,
        })
    }

    /// Album statistics and priorities. Returns the average share and
    /// exploitation.
    #[allow(clippy::cast_precision_loss)]
    fn prepare_albums<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        albums: &mut [AlbumSource],
        seed_size: usize,
    ) -> Result<(f64, f64)> {
        let mut share_sum = 0.0;
        let mut exploitation_sum = 0.0;
        for album in albums.iter_mut() {
            album.load_total_tracks(catalog, self.config.quick)?;
            share_sum += album.source.calculate_source_share(seed_size);
            exploitation_sum += album.source.calculate_exploitation();
        }

        let count = albums.len().max(1) as f64;
        let average_share = share_sum / count;
        let average_exploitation = exploitation_sum / count;
        info!(
            "Average album share {:.2}%, exploitation {:.2}%",
            average_share * 100.0,
            average_exploitation * 100.0
        );

        for album in albums.iter_mut() {
            album.calculate_priority(average_share, average_exploitation, self.config.album_share_bonus_modifier);
        }
        Ok((average_share, average_exploitation))
    }

    /// Load every seed artist's queue. Returns the average exploitation over
    /// artists with a known catalog.
    #[allow(clippy::cast_precision_loss)]
    fn prepare_artists<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        pool: &mut ArtistPool,
        priorities: &AlbumPriorities,
        seed_size: usize,
        result_size: usize,
    ) -> Result<f64> {
        let filters = &self.config.filters;
        let count = pool.len();
        let mut exploitation_sum = 0.0;
        let mut counted = 0usize;

        for (i, artist) in pool.iter_mut().enumerate() {
            debug!(
                "{:5} ({}%) - {:5} tracks - {}",
                i + 1,
                100 * (i + 1) / count,
                artist.source.source_tracks.len(),
                artist.name()
            );
            artist.calculate_source_share(seed_size);

            if artist.decide_quick(result_size, self.config.top_tracks_limit) {
                let needed = artist.estimate_result_share(result_size);
                if artist.load_top_tracks(catalog, needed, filters)? {
                    artist.estimate_total_tracks(catalog)?;
                }
            }
            // Not an else: a failed top track load drops quick mode.
            if !artist.quick {
                artist.load_undiscovered_tracks(catalog, filters)?;
                artist.set_discovery_priority(priorities);
            }

            let exploitation = artist.calculate_exploitation();
            if artist.source.total_tracks > 0 {
                exploitation_sum += exploitation;
                counted += 1;
            }
        }

        let average = if counted > 0 { exploitation_sum / counted as f64 } else { 0.0 };
        info!("Average artist exploitation: {:.2}%", average * 100.0);
        Ok(average)
    }
}

/// Attribute seed tracks to their albums and every credited artist.
fn group(seed_tracks: &[TrackRef], quick: bool) -> (Vec<AlbumSource>, ArtistPool) {
    let mut albums: Vec<AlbumSource> = Vec::new();
    let mut album_index: HashMap<Uri, usize> = HashMap::new();
    let mut pool = ArtistPool::new();

    for track in seed_tracks {
        let a = *album_index.entry(track.album.uri.clone()).or_insert_with(|| {
            albums.push(AlbumSource::new(track.album.clone()));
            albums.len() - 1
        });
        albums[a].source.source_tracks.push(track.clone());

        for artist in &track.artists {
            let i = pool.get_or_insert(artist, Origin::Seed, quick);
            let source_tracks = &mut pool[i].source.source_tracks;
            if !source_tracks.iter().any(|t| t.uri == track.uri) {
                source_tracks.push(track.clone());
            }
        }
    }
    (albums, pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::discovery::fixtures::{artist, catalog_of, seed_of};
    use crate::filters::{Attribute, AttributeFilter};
    use std::collections::HashSet;

    fn config(spillover: f64) -> DiscoveryConfig {
        DiscoveryConfig {
            spillover,
            seed: Some(11),
            ..DiscoveryConfig::default()
        }
    }

    fn three_artists() -> MemoryCatalog {
        // Catalogs scale with seed presence, so exploitation is equal.
        catalog_of(&[artist("a", 70, 10), artist("b", 42, 6), artist("c", 28, 4)])
    }

    #[test]
    fn test_proportional_allocation_without_spillover() {
        let catalog = three_artists();
        let seed = seed_of(&catalog);
        let report = Discover::new(config(0.0)).run(&catalog, &seed, 100).unwrap();

        let totals: Vec<u32> = report.artists.iter().map(|a| a.result_total).collect();
        assert_eq!(totals, vec![50, 30, 20]);
        assert!(report.artists.iter().all(|a| a.spillover == 0));
        assert_eq!(report.tracks.len(), 100);

        let seed_uris: HashSet<_> = catalog
            .complete_playlist_tracks(&seed.uri, false)
            .unwrap()
            .iter()
            .map(|t| t.uri.clone())
            .collect();
        assert!(report.tracks.iter().all(|t| !seed_uris.contains(&t.uri)));
        let unique: HashSet<_> = report.tracks.iter().map(|t| t.uri.clone()).collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_accounting_invariants_hold() {
        let catalog = catalog_of(&[
            artist("a", 14, 10).related(&["x", "y"]),
            artist("b", 30, 6).related(&["y", "c"]),
            artist("c", 8, 4),
            artist("x", 15, 0),
            artist("y", 5, 0),
        ]);
        let seed = seed_of(&catalog);
        let report = Discover::new(config(0.5)).run(&catalog, &seed, 60).unwrap();

        for artist in &report.artists {
            assert!((0.0..=1.0).contains(&artist.exploitation), "{}", artist.name);
            assert!((0.0..=1.0).contains(&artist.source_share), "{}", artist.name);
            assert_eq!(artist.contribution + artist.spillover, artist.result_total, "{}", artist.name);
            assert!(artist.contribution as usize <= artist.available, "{}", artist.name);
        }
        assert!(report.spillover_artists().count() > 0);
        assert!(report.tracks.len() <= 60);
    }

    #[test]
    fn test_spillover_reaches_related_artists() {
        let catalog = catalog_of(&[artist("a", 20, 10).related(&["x"]), artist("x", 30, 0)]);
        let seed = seed_of(&catalog);
        let report = Discover::new(config(0.5)).run(&catalog, &seed, 10).unwrap();

        let a = &report.artists[0];
        assert!(a.spillover > 0);
        assert_eq!(a.related_artists, vec!["x"]);
        let x = report.spillover_artists().next().unwrap();
        assert_eq!(x.contribution, a.spillover);
        assert_eq!(x.share_contributors, vec!["a"]);
        assert!(x.top10);
        assert_eq!(report.tracks.len(), 10);
    }

    #[test]
    fn test_shortfall_reaches_related_without_spillover() {
        let catalog = catalog_of(&[artist("a", 8, 4).related(&["x"]), artist("x", 30, 0)]);
        let seed = seed_of(&catalog);
        let report = Discover::new(config(0.0)).run(&catalog, &seed, 20).unwrap();

        let a = &report.artists[0];
        assert_eq!((a.result_total, a.spillover, a.contribution), (20, 16, 4));
        let x = report.spillover_artists().next().unwrap();
        assert_eq!(x.name, "x");
        assert_eq!(x.contribution, 16);
        assert_eq!(report.tracks.len(), 20);
    }

    #[test]
    fn test_oversized_request_gives_shorter_result() {
        let catalog = catalog_of(&[artist("a", 8, 4), artist("b", 6, 2)]);
        let seed = seed_of(&catalog);
        let report = Discover::new(config(0.35)).run(&catalog, &seed, 100).unwrap();
        assert_eq!(report.tracks.len(), 8);
    }

    #[test]
    fn test_quick_mode_uses_top_tracks() {
        let catalog = catalog_of(&[artist("a", 60, 4), artist("b", 60, 4)]);
        let seed = seed_of(&catalog);
        let quick = DiscoveryConfig {
            quick: true,
            ..config(0.0)
        };
        let report = Discover::new(quick).run(&catalog, &seed, 10).unwrap();
        assert!(report.artists.iter().all(|a| a.top10));
        assert!(report.artists.iter().all(|a| a.total_tracks == 60));
        assert_eq!(report.tracks.len(), 10);
    }

    #[test]
    fn test_filters_exclude_tracks() {
        let catalog = three_artists();
        let seed = seed_of(&catalog);
        let clean = DiscoveryConfig {
            filters: vec![AttributeFilter::exclude(Attribute::Explicit)],
            ..config(0.0)
        };
        let report = Discover::new(clean).run(&catalog, &seed, 50).unwrap();
        assert!(!report.tracks.is_empty());
        assert!(report.tracks.iter().all(|t| !t.explicit));
    }

    #[test]
    fn test_same_seed_same_result() {
        let catalog = three_artists();
        let seed = seed_of(&catalog);
        let uris = || {
            Discover::new(config(0.35))
                .run(&catalog, &seed, 40)
                .unwrap()
                .tracks
                .iter()
                .map(|t| t.uri.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(uris(), uris());
    }

    #[test]
    fn test_extend_stores_result() {
        let mut catalog = three_artists();
        let seed = seed_of(&catalog);
        let extension = Discover::new(config(0.0)).extend(&mut catalog, &seed, 20).unwrap();
        let playlist = extension.playlist.unwrap();
        assert_eq!(playlist.name, "Seed Discovery");
        assert_eq!(catalog.playlist_tracks(&playlist.uri).unwrap().len(), 20);

        let again = Discover::new(config(0.0)).extend(&mut catalog, &seed, 20).unwrap();
        assert_eq!(again.playlist.unwrap().name, "Seed Discovery (2)");
    }

    #[test]
    fn test_empty_seed_creates_nothing() {
        let mut catalog = catalog_of(&[artist("a", 5, 0)]);
        let seed = seed_of(&catalog);
        let extension = Discover::new(config(0.35)).extend(&mut catalog, &seed, 20).unwrap();
        assert!(extension.playlist.is_none());
        assert!(extension.report.tracks.is_empty());
        assert_eq!(catalog.playlists().count(), 1);
    }

    #[test]
    fn test_group_credits_every_artist() {
        let catalog = three_artists();
        let seed = seed_of(&catalog);
        let tracks = catalog.playlist_tracks(&seed.uri).unwrap();
        let (albums, pool) = group(&tracks, false);
        assert_eq!(albums.len(), 3);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool[0].source.source_tracks.len(), 10);
    }
}
