//! In-memory catalog built from a [`CatalogDump`].

use super::{unique_playlist_name, Catalog, CatalogDump, PlaylistSink, TOP_TRACKS};
use crate::cache::ResourceCache;
use crate::model::{AlbumRef, ArtistRef, Playlist, Track, TrackRef, Uri};
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;

struct AlbumInfo {
    album: AlbumRef,
    artists: Vec<Uri>,
    total_tracks: Option<u32>,
    /// Position in the dump, used to order an artist's discography.
    position: usize,
}

struct StoredPlaylist {
    playlist: Playlist,
    tracks: Vec<TrackRef>,
}

/// Catalog and playlist sink living entirely in memory.
///
/// Every reference in the dump is resolved up front, so lookups never fail
/// for resources the dump mentions.
pub struct MemoryCatalog {
    artists: HashMap<Uri, ArtistRef>,
    related: HashMap<Uri, Vec<ArtistRef>>,
    albums: HashMap<Uri, AlbumInfo>,
    tracks: Vec<TrackRef>,
    playlists: Vec<StoredPlaylist>,
}

impl MemoryCatalog {
    /// Resolve all references of `dump`.
    ///
    /// # Errors
    ///
    /// Fails when a track, album, relation or playlist references an artist,
    /// album or track missing from the dump.
    pub fn from_dump(dump: &CatalogDump) -> Result<Self> {
        let mut cache = ResourceCache::new();

        let artists: HashMap<Uri, ArtistRef> = dump
            .artists
            .iter()
            .map(|a| {
                let artist = cache.intern_artist(ArtistRef::new(a.uri.clone(), a.name.clone()));
                (a.uri.clone(), artist)
            })
            .collect();
        let artist = |uri: &Uri| -> Result<ArtistRef> {
            artists
                .get(uri)
                .cloned()
                .ok_or_else(|| anyhow!("Unknown artist `{uri}'"))
        };

        let mut related = HashMap::new();
        for entry in &dump.artists {
            let list = entry
                .related
                .iter()
                .map(&artist)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Invalid relations of `{}'", entry.uri))?;
            related.insert(entry.uri.clone(), list);
        }

        let mut albums = HashMap::new();
        for (position, entry) in dump.albums.iter().enumerate() {
            for uri in &entry.artists {
                artist(uri).with_context(|| format!("Invalid album `{}'", entry.uri))?;
            }
            albums.insert(
                entry.uri.clone(),
                AlbumInfo {
                    album: AlbumRef::new(entry.uri.clone(), entry.name.clone()),
                    artists: entry.artists.clone(),
                    total_tracks: entry.total_tracks,
                    position,
                },
            );
        }

        let mut tracks = Vec::with_capacity(dump.tracks.len());
        for entry in &dump.tracks {
            let album = albums
                .get(&entry.album)
                .map(|info| info.album.clone())
                .ok_or_else(|| anyhow!("Track `{}' references unknown album `{}'", entry.uri, entry.album))?;
            let credited = entry
                .artists
                .iter()
                .map(&artist)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Invalid track `{}'", entry.uri))?;
            tracks.push(cache.intern_track(Track {
                uri: entry.uri.clone(),
                name: entry.name.clone(),
                popularity: entry.popularity.min(100),
                artists: credited,
                album,
                duration_ms: entry.duration_ms,
                track_number: entry.track_number,
                explicit: entry.explicit,
            }));
        }

        let mut playlists = Vec::with_capacity(dump.playlists.len());
        for entry in &dump.playlists {
            let members = entry
                .tracks
                .iter()
                .map(|uri| {
                    cache
                        .track(uri)
                        .ok_or_else(|| anyhow!("Playlist `{}' references unknown track `{uri}'", entry.uri))
                })
                .collect::<Result<Vec<_>>>()?;
            playlists.push(StoredPlaylist {
                playlist: Playlist {
                    uri: entry.uri.clone(),
                    name: entry.name.clone(),
                },
                tracks: members,
            });
        }

        log::debug!(
            "Memory catalog: {} artists, {} albums, {} tracks, {} playlists",
            artists.len(),
            albums.len(),
            tracks.len(),
            playlists.len()
        );

        Ok(Self {
            artists,
            related,
            albums,
            tracks,
            playlists,
        })
    }

    /// Parse JSON text and build a catalog from it.
    pub fn from_json(text: &str) -> Result<Self> {
        let dump = CatalogDump::from_json(text).context("Invalid catalog dump")?;
        Self::from_dump(&dump)
    }

    /// All stored playlists, in creation order.
    pub fn playlists(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.iter().map(|p| &p.playlist)
    }

    fn album_info(&self, album: &AlbumRef) -> Result<&AlbumInfo> {
        self.albums
            .get(&album.uri)
            .ok_or_else(|| anyhow!("Unknown album `{}'", album.uri))
    }

    fn ensure_artist(&self, artist: &ArtistRef) -> Result<()> {
        if self.artists.contains_key(&artist.uri) {
            Ok(())
        } else {
            bail!("Unknown artist `{}'", artist.uri)
        }
    }

    fn stored(&self, uri: &Uri) -> Result<&StoredPlaylist> {
        self.playlists
            .iter()
            .find(|p| &p.playlist.uri == uri)
            .ok_or_else(|| anyhow!("Unknown playlist `{uri}'"))
    }
}

impl Catalog for MemoryCatalog {
    fn playlist(&self, uri: &Uri) -> Result<Playlist> {
        Ok(self.stored(uri)?.playlist.clone())
    }

    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
        Ok(self
            .playlists
            .iter()
            .find(|p| p.playlist.name == name)
            .map(|p| p.playlist.clone()))
    }

    fn playlist_tracks(&self, playlist: &Uri) -> Result<Vec<TrackRef>> {
        Ok(self.stored(playlist)?.tracks.clone())
    }

    fn artist_track_count(&self, artist: &ArtistRef) -> Result<u32> {
        self.ensure_artist(artist)?;
        Ok(self
            .albums
            .values()
            .filter(|info| info.artists.contains(&artist.uri))
            .map(|info| {
                info.total_tracks.unwrap_or_else(|| {
                    let actual = self.tracks.iter().filter(|t| t.album == info.album).count();
                    u32::try_from(actual).unwrap_or(u32::MAX)
                })
            })
            .sum())
    }

    fn artist_top_tracks(&self, artist: &ArtistRef) -> Result<Vec<TrackRef>> {
        let mut tracks = self.artist_tracks(artist)?;
        tracks.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        tracks.truncate(TOP_TRACKS);
        Ok(tracks)
    }

    fn artist_tracks(&self, artist: &ArtistRef) -> Result<Vec<TrackRef>> {
        self.ensure_artist(artist)?;
        let mut tracks: Vec<TrackRef> = self
            .tracks
            .iter()
            .filter(|t| t.is_by(&artist.uri))
            .cloned()
            .collect();
        tracks.sort_by_key(|t| {
            let position = self.albums.get(&t.album.uri).map_or(usize::MAX, |info| info.position);
            (position, t.track_number)
        });
        Ok(tracks)
    }

    fn album_track_count(&self, album: &AlbumRef) -> Result<u32> {
        let info = self.album_info(album)?;
        match info.total_tracks {
            Some(total) => Ok(total),
            None => Ok(u32::try_from(self.album_tracks(album)?.len()).unwrap_or(u32::MAX)),
        }
    }

    fn album_tracks(&self, album: &AlbumRef) -> Result<Vec<TrackRef>> {
        self.album_info(album)?;
        let mut tracks: Vec<TrackRef> = self
            .tracks
            .iter()
            .filter(|t| t.album == *album)
            .cloned()
            .collect();
        tracks.sort_by_key(|t| t.track_number);
        Ok(tracks)
    }

    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>> {
        self.ensure_artist(artist)?;
        Ok(self.related.get(&artist.uri).cloned().unwrap_or_default())
    }
}

impl PlaylistSink for MemoryCatalog {
    fn create_playlist(&mut self, name: &str, tracks: &[TrackRef]) -> Result<Playlist> {
        let existing: Vec<String> = self.playlists().map(|p| p.name.clone()).collect();
        let playlist = Playlist {
            uri: Uri::new(format!("memory:playlist:{}", self.playlists.len() + 1)),
            name: unique_playlist_name(name, &existing),
        };
        self.playlists.push(StoredPlaylist {
            playlist: playlist.clone(),
            tracks: tracks.to_vec(),
        });
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AlbumEntry, ArtistEntry, PlaylistEntry, TrackEntry};

    fn dump() -> CatalogDump {
        CatalogDump {
            artists: vec![
                ArtistEntry { uri: "a:1".into(), name: "One".into(), related: vec!["a:2".into()] },
                ArtistEntry { uri: "a:2".into(), name: "Two".into(), related: vec![] },
            ],
            albums: vec![
                AlbumEntry { uri: "al:1".into(), name: "First".into(), artists: vec!["a:1".into()], total_tracks: Some(14) },
                AlbumEntry { uri: "al:2".into(), name: "Second".into(), artists: vec!["a:1".into()], total_tracks: None },
            ],
            tracks: (1..=12)
                .map(|i| TrackEntry {
                    uri: Uri::new(format!("t:{i}")),
                    name: format!("Song {i}"),
                    popularity: u8::try_from(i * 5).unwrap(),
                    artists: vec!["a:1".into()],
                    album: if i <= 6 { "al:2".into() } else { "al:1".into() },
                    duration_ms: 1000,
                    track_number: u32::try_from(i).unwrap(),
                    explicit: false,
                })
                .collect(),
            playlists: vec![PlaylistEntry { uri: "p:1".into(), name: "Seed".into(), tracks: vec!["t:1".into(), "t:2".into()] }],
        }
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let mut broken = dump();
        broken.tracks[0].album = "al:missing".into();
        assert!(MemoryCatalog::from_dump(&broken).is_err());
    }

    #[test]
    fn test_artist_queries() {
        let catalog = MemoryCatalog::from_dump(&dump()).unwrap();
        let one = ArtistRef::new("a:1", "One");

        let top = catalog.artist_top_tracks(&one).unwrap();
        assert_eq!(top.len(), TOP_TRACKS);
        assert_eq!(top[0].name, "Song 12");

        // Album order follows the dump: al:1 (tracks 7-12) before al:2.
        let all = catalog.artist_tracks(&one).unwrap();
        assert_eq!(all[0].name, "Song 7");
        assert_eq!(all.len(), 12);

        // 14 from metadata plus 6 counted on the album without metadata.
        assert_eq!(catalog.artist_track_count(&one).unwrap(), 20);

        let related = catalog.related_artists(&one).unwrap();
        assert_eq!(related, vec![ArtistRef::new("a:2", "Two")]);
        assert!(catalog.related_artists(&ArtistRef::new("a:2", "Two")).unwrap().is_empty());
    }

    #[test]
    fn test_playlist_roundtrip_through_sink() {
        let mut catalog = MemoryCatalog::from_dump(&dump()).unwrap();
        let seed = catalog.resolve_playlist("Seed").unwrap();
        let tracks = catalog.playlist_tracks(&seed.uri).unwrap();
        assert_eq!(tracks.len(), 2);

        let created = catalog.create_playlist("Seed", &tracks).unwrap();
        assert_eq!(created.name, "Seed (2)");
        assert_eq!(catalog.resolve_playlist(created.uri.as_str()).unwrap(), created);
        assert_eq!(catalog.playlist_tracks(&created.uri).unwrap().len(), 2);
    }
}
