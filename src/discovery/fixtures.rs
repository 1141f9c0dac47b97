//! Small synthetic catalogs for discovery tests.
//!
//! Artist `x` has URI `artist:x` and a single album `album:x` whose tracks
//! `track:x:1..=n` are named `Song i` with popularity `100 - i`. The playlist
//! `Seed` holds the first `seed` tracks of every artist, artist by artist.

use crate::catalog::{AlbumEntry, ArtistEntry, Catalog, CatalogDump, MemoryCatalog, PlaylistEntry, TrackEntry};
use crate::model::{Playlist, Uri};

pub struct ArtistFixture {
    name: &'static str,
    catalog: usize,
    seed: usize,
    related: Vec<&'static str>,
}

pub fn artist(name: &'static str, catalog: usize, seed: usize) -> ArtistFixture {
    assert!(seed <= catalog);
    ArtistFixture {
        name,
        catalog,
        seed,
        related: Vec::new(),
    }
}

impl ArtistFixture {
    pub fn related(mut self, names: &[&'static str]) -> Self {
        self.related = names.to_vec();
        self
    }
}

fn track_uri(name: &str, i: usize) -> Uri {
    Uri::new(format!("track:{name}:{i}"))
}

pub fn dump_of(artists: &[ArtistFixture]) -> CatalogDump {
    let mut dump = CatalogDump::default();
    let mut seed = Vec::new();
    for fixture in artists {
        dump.artists.push(ArtistEntry {
            uri: Uri::new(format!("artist:{}", fixture.name)),
            name: fixture.name.to_string(),
            related: fixture.related.iter().map(|r| Uri::new(format!("artist:{r}"))).collect(),
        });
        dump.albums.push(AlbumEntry {
            uri: Uri::new(format!("album:{}", fixture.name)),
            name: format!("{} LP", fixture.name),
            artists: vec![Uri::new(format!("artist:{}", fixture.name))],
            total_tracks: Some(u32::try_from(fixture.catalog).unwrap()),
        });
        for i in 1..=fixture.catalog {
            dump.tracks.push(TrackEntry {
                uri: track_uri(fixture.name, i),
                name: format!("Song {i}"),
                popularity: u8::try_from(100usize.saturating_sub(i)).unwrap(),
                artists: vec![Uri::new(format!("artist:{}", fixture.name))],
                album: Uri::new(format!("album:{}", fixture.name)),
                duration_ms: 200_000,
                track_number: u32::try_from(i).unwrap(),
                explicit: i % 5 == 0,
            });
        }
        seed.extend((1..=fixture.seed).map(|i| track_uri(fixture.name, i)));
    }
    dump.playlists.push(PlaylistEntry {
        uri: Uri::from("playlist:seed"),
        name: "Seed".to_string(),
        tracks: seed,
    });
    dump
}

pub fn catalog_of(artists: &[ArtistFixture]) -> MemoryCatalog {
    MemoryCatalog::from_dump(&dump_of(artists)).unwrap()
}

pub fn seed_of(catalog: &MemoryCatalog) -> Playlist {
    catalog.resolve_playlist("Seed").unwrap()
}
