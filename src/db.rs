//! # Database Module
//!
//! SQLite storage for the catalog and for discovery results.
//!
//! ## Schema
//!
//! - `artists`, `albums`, `tracks`: catalog entities keyed by URI
//! - `album_artists`, `track_artists`: ordered credits
//! - `related_artists`: relevance-ranked artist relations
//! - `playlists`, `playlist_tracks`: seed playlists and stored results
//!
//! The database is filled from a [`CatalogDump`] with [`import_dump`] and read
//! through [`SqliteCatalog`], which implements both [`Catalog`] and
//! [`PlaylistSink`].

use crate::cache::ResourceCache;
use crate::catalog::{unique_playlist_name, Catalog, CatalogDump, MemoryCatalog, PlaylistSink, TOP_TRACKS};
use crate::model::{AlbumRef, ArtistRef, Playlist, Track, TrackRef, Uri};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, trace};
use rusqlite::{Connection, OptionalExtension};
use std::cell::RefCell;
use std::fs;
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS artists (
    uri  TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS related_artists (
    artist_uri  TEXT    NOT NULL REFERENCES artists(uri),
    related_uri TEXT    NOT NULL REFERENCES artists(uri),
    rank        INTEGER NOT NULL,
    PRIMARY KEY (artist_uri, related_uri)
);
CREATE TABLE IF NOT EXISTS albums (
    uri          TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    total_tracks INTEGER
);
CREATE TABLE IF NOT EXISTS album_artists (
    album_uri  TEXT    NOT NULL REFERENCES albums(uri),
    artist_uri TEXT    NOT NULL REFERENCES artists(uri),
    position   INTEGER NOT NULL,
    PRIMARY KEY (album_uri, artist_uri)
);
CREATE TABLE IF NOT EXISTS tracks (
    uri          TEXT    PRIMARY KEY,
    name         TEXT    NOT NULL,
    popularity   INTEGER NOT NULL DEFAULT 0,
    album_uri    TEXT    NOT NULL REFERENCES albums(uri),
    duration_ms  INTEGER NOT NULL DEFAULT 0,
    track_number INTEGER NOT NULL DEFAULT 0,
    explicit     INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS track_artists (
    track_uri  TEXT    NOT NULL REFERENCES tracks(uri),
    artist_uri TEXT    NOT NULL REFERENCES artists(uri),
    position   INTEGER NOT NULL,
    PRIMARY KEY (track_uri, artist_uri)
);
CREATE TABLE IF NOT EXISTS playlists (
    uri  TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS playlist_tracks (
    playlist_uri TEXT    NOT NULL REFERENCES playlists(uri),
    track_uri    TEXT    NOT NULL REFERENCES tracks(uri),
    position     INTEGER NOT NULL,
    PRIMARY KEY (playlist_uri, position)
);
CREATE INDEX IF NOT EXISTS idx_track_artists_artist ON track_artists(artist_uri);
CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album_uri);
CREATE INDEX IF NOT EXISTS idx_album_artists_artist ON album_artists(artist_uri);
";

/// Columns every track query selects, in this order.
const TRACK_COLUMNS: &str =
    "t.uri, t.name, t.popularity, t.album_uri, al.name, t.duration_ms, t.track_number, t.explicit";

/// Open the database at `path`.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("Failed to enable foreign keys")?;
    Ok(conn)
}

/// Create the schema at `path`.
///
/// # Errors
///
/// Fails when a database already exists and `force` is not set, or when the
/// schema cannot be created.
pub fn init_database(path: &Path, force: bool) -> Result<Connection> {
    if path.exists() {
        if !force {
            bail!(
                "Database already exists at {}. Use --force to recreate it.",
                path.display()
            );
        }
        info!("Removing existing database at {}", path.display());
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let conn = connect(path)?;
    conn.execute_batch(SCHEMA)
        .with_context(|| format!("Failed to create schema in {}", path.display()))?;
    info!("Initialized catalog database at {}", path.display());
    Ok(conn)
}

/// Row counts written by [`import_dump`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
    pub playlists: usize,
}

/// Write `dump` into the database in one transaction. Entities already
/// present are replaced.
///
/// # Errors
///
/// The dump is checked for dangling references before anything is written;
/// an inconsistent dump leaves the database untouched.
pub fn import_dump(conn: &mut Connection, dump: &CatalogDump) -> Result<ImportStats> {
    MemoryCatalog::from_dump(dump).context("Refusing to import an inconsistent catalog dump")?;

    let tx = conn.transaction()?;
    {
        let mut artist = tx.prepare(
            "INSERT INTO artists (uri, name) VALUES (?1, ?2)
             ON CONFLICT(uri) DO UPDATE SET name = excluded.name",
        )?;
        for entry in &dump.artists {
            artist
                .execute((entry.uri.as_str(), &entry.name))
                .with_context(|| format!("Failed to insert artist {}", entry.uri))?;
        }

        let mut clear_related = tx.prepare("DELETE FROM related_artists WHERE artist_uri = ?1")?;
        let mut related = tx.prepare(
            "INSERT OR REPLACE INTO related_artists (artist_uri, related_uri, rank) VALUES (?1, ?2, ?3)",
        )?;
        for entry in &dump.artists {
            clear_related.execute([entry.uri.as_str()])?;
            for (rank, other) in entry.related.iter().enumerate() {
                related
                    .execute((entry.uri.as_str(), other.as_str(), rank))
                    .with_context(|| format!("Failed to relate {} to {}", entry.uri, other))?;
            }
        }

        let mut album = tx.prepare(
            "INSERT INTO albums (uri, name, total_tracks) VALUES (?1, ?2, ?3)
             ON CONFLICT(uri) DO UPDATE SET name = excluded.name, total_tracks = excluded.total_tracks",
        )?;
        let mut clear_album_artists = tx.prepare("DELETE FROM album_artists WHERE album_uri = ?1")?;
        let mut album_artist = tx.prepare(
            "INSERT OR REPLACE INTO album_artists (album_uri, artist_uri, position) VALUES (?1, ?2, ?3)",
        )?;
        for entry in &dump.albums {
            album
                .execute((entry.uri.as_str(), &entry.name, entry.total_tracks))
                .with_context(|| format!("Failed to insert album {}", entry.uri))?;
            clear_album_artists.execute([entry.uri.as_str()])?;
            for (position, artist_uri) in entry.artists.iter().enumerate() {
                album_artist.execute((entry.uri.as_str(), artist_uri.as_str(), position))?;
            }
        }

        let mut track = tx.prepare(
            "INSERT INTO tracks
                (uri, name, popularity, album_uri, duration_ms, track_number, explicit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(uri) DO UPDATE SET
                name = excluded.name, popularity = excluded.popularity, album_uri = excluded.album_uri,
                duration_ms = excluded.duration_ms, track_number = excluded.track_number,
                explicit = excluded.explicit",
        )?;
        let mut clear_track_artists = tx.prepare("DELETE FROM track_artists WHERE track_uri = ?1")?;
        let mut track_artist = tx.prepare(
            "INSERT OR REPLACE INTO track_artists (track_uri, artist_uri, position) VALUES (?1, ?2, ?3)",
        )?;
        for entry in &dump.tracks {
            track
                .execute((
                    entry.uri.as_str(),
                    &entry.name,
                    entry.popularity.min(100),
                    entry.album.as_str(),
                    entry.duration_ms,
                    entry.track_number,
                    entry.explicit,
                ))
                .with_context(|| format!("Failed to insert track {}", entry.uri))?;
            clear_track_artists.execute([entry.uri.as_str()])?;
            for (position, artist_uri) in entry.artists.iter().enumerate() {
                track_artist.execute((entry.uri.as_str(), artist_uri.as_str(), position))?;
            }
        }

        let mut playlist = tx.prepare(
            "INSERT INTO playlists (uri, name) VALUES (?1, ?2)
             ON CONFLICT(uri) DO UPDATE SET name = excluded.name",
        )?;
        let mut clear_members = tx.prepare("DELETE FROM playlist_tracks WHERE playlist_uri = ?1")?;
        let mut member =
            tx.prepare("INSERT INTO playlist_tracks (playlist_uri, track_uri, position) VALUES (?1, ?2, ?3)")?;
        for entry in &dump.playlists {
            playlist
                .execute((entry.uri.as_str(), &entry.name))
                .with_context(|| format!("Failed to insert playlist {}", entry.uri))?;
            clear_members.execute([entry.uri.as_str()])?;
            for (position, track_uri) in entry.tracks.iter().enumerate() {
                member.execute((entry.uri.as_str(), track_uri.as_str(), position))?;
            }
        }
    }
    tx.commit().context("Committing catalog import failed")?;

    let stats = ImportStats {
        artists: dump.artists.len(),
        albums: dump.albums.len(),
        tracks: dump.tracks.len(),
        playlists: dump.playlists.len(),
    };
    info!("Imported {stats:?}");
    Ok(stats)
}

/// A stored playlist and its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub playlist: Playlist,
    pub tracks: usize,
}

/// All stored playlists, by name.
pub fn list_playlists(conn: &Connection) -> Result<Vec<PlaylistInfo>> {
    let mut stmt = conn
        .prepare(
            "SELECT p.uri, p.name, COUNT(pt.track_uri)
             FROM playlists p LEFT JOIN playlist_tracks pt ON pt.playlist_uri = p.uri
             GROUP BY p.uri, p.name
             ORDER BY p.name",
        )
        .context("Invalid SQL statement when listing playlists")?;

    let rows = stmt.query_map([], |row| {
        Ok(PlaylistInfo {
            playlist: Playlist {
                uri: Uri::new(row.get::<_, String>(0)?),
                name: row.get(1)?,
            },
            tracks: usize::try_from(row.get::<_, i64>(2)?).unwrap_or(0),
        })
    })?;

    let mut playlists = Vec::new();
    for playlist in rows {
        playlists.push(playlist.context("Failed to read playlist row")?);
    }
    Ok(playlists)
}

fn playlist_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM playlists")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

struct TrackRow {
    uri: String,
    name: String,
    popularity: u8,
    album_uri: String,
    album_name: String,
    duration_ms: u32,
    track_number: u32,
    explicit: bool,
}

/// Catalog and playlist sink backed by a SQLite database.
///
/// Tracks are interned in a [`ResourceCache`] owned by the catalog, so the
/// same URI always yields the same `Arc<Track>` for the catalog's lifetime.
pub struct SqliteCatalog {
    conn: Connection,
    cache: RefCell<ResourceCache>,
}

impl SqliteCatalog {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            cache: RefCell::new(ResourceCache::new()),
        }
    }

    /// Open an existing database.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "No catalog database at {}. Run `deepcut init-db` and `deepcut import` first.",
                path.display()
            );
        }
        Ok(Self::new(connect(path)?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Tracks held by the cache, with (hits, misses) of track interning.
    pub fn cache_stats(&self) -> (usize, u64, u64) {
        let cache = self.cache.borrow();
        let (hits, misses) = cache.stats();
        (cache.len(), hits, misses)
    }

    /// Run a track query whose single parameter is `param` and whose select
    /// list starts with [`TRACK_COLUMNS`].
    fn query_tracks(&self, sql: &str, param: &str) -> Result<Vec<TrackRef>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .with_context(|| format!("Invalid SQL statement: {sql}"))?;
        let rows = stmt
            .query_map([param], |row| {
                Ok(TrackRow {
                    uri: row.get(0)?,
                    name: row.get(1)?,
                    popularity: row.get(2)?,
                    album_uri: row.get(3)?,
                    album_name: row.get(4)?,
                    duration_ms: row.get(5)?,
                    track_number: row.get(6)?,
                    explicit: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read track rows")?;

        rows.into_iter().map(|row| self.resolve_track(row)).collect()
    }

    fn resolve_track(&self, row: TrackRow) -> Result<TrackRef> {
        let uri = Uri::new(row.uri);
        if let Some(track) = self.cache.borrow_mut().track(&uri) {
            return Ok(track);
        }

        let mut stmt = self.conn.prepare_cached(
            "SELECT ar.uri, ar.name FROM track_artists ta
             JOIN artists ar ON ar.uri = ta.artist_uri
             WHERE ta.track_uri = ?1 ORDER BY ta.position",
        )?;
        let artists = stmt
            .query_map([uri.as_str()], |row| {
                Ok(ArtistRef::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to load artists of track {uri}"))?;

        trace!("Caching track {uri}");
        Ok(self.cache.borrow_mut().intern_track(Track {
            uri,
            name: row.name,
            popularity: row.popularity,
            artists,
            album: AlbumRef::new(row.album_uri, row.album_name),
            duration_ms: row.duration_ms,
            track_number: row.track_number,
            explicit: row.explicit,
        }))
    }

    fn ensure_artist(&self, artist: &ArtistRef) -> Result<()> {
        let found: Option<String> = self
            .conn
            .query_row("SELECT uri FROM artists WHERE uri = ?1", [artist.uri.as_str()], |row| row.get(0))
            .optional()?;
        match found {
            Some(_) => Ok(()),
            None => bail!("Unknown artist `{}'", artist.uri),
        }
    }

    fn next_playlist_uri(&self) -> Result<Uri> {
        let mut n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM playlists", [], |row| row.get(0))?;
        loop {
            n += 1;
            let uri = Uri::new(format!("deepcut:playlist:{n}"));
            let taken: Option<String> = self
                .conn
                .query_row("SELECT uri FROM playlists WHERE uri = ?1", [uri.as_str()], |row| row.get(0))
                .optional()?;
            if taken.is_none() {
                return Ok(uri);
            }
        }
    }
}

impl Catalog for SqliteCatalog {
    fn playlist(&self, uri: &Uri) -> Result<Playlist> {
        self.conn
            .query_row("SELECT uri, name FROM playlists WHERE uri = ?1", [uri.as_str()], |row| {
                Ok(Playlist {
                    uri: Uri::new(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                })
            })
            .optional()?
            .ok_or_else(|| anyhow!("Unknown playlist `{uri}'"))
    }

    fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
        Ok(self
            .conn
            .query_row(
                "SELECT uri, name FROM playlists WHERE name = ?1 ORDER BY rowid LIMIT 1",
                [name],
                |row| {
                    Ok(Playlist {
                        uri: Uri::new(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn playlist_tracks(&self, playlist: &Uri) -> Result<Vec<TrackRef>> {
        self.playlist(playlist)?;
        self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM playlist_tracks pt
                 JOIN tracks t ON t.uri = pt.track_uri
                 JOIN albums al ON al.uri = t.album_uri
                 WHERE pt.playlist_uri = ?1 ORDER BY pt.position"
            ),
            playlist.as_str(),
        )
    }

    fn artist_track_count(&self, artist: &ArtistRef) -> Result<u32> {
        self.ensure_artist(artist)?;
        let count: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(COALESCE(al.total_tracks,
                        (SELECT COUNT(*) FROM tracks t WHERE t.album_uri = al.uri))), 0)
             FROM album_artists aa JOIN albums al ON al.uri = aa.album_uri
             WHERE aa.artist_uri = ?1",
            [artist.uri.as_str()],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn artist_top_tracks(&self, artist: &ArtistRef) -> Result<Vec<TrackRef>> {
        self.ensure_artist(artist)?;
        let mut tracks = self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM track_artists ta
                 JOIN tracks t ON t.uri = ta.track_uri
                 JOIN albums al ON al.uri = t.album_uri
                 WHERE ta.artist_uri = ?1
                 ORDER BY t.popularity DESC, al.rowid, t.track_number"
            ),
            artist.uri.as_str(),
        )?;
        tracks.truncate(TOP_TRACKS);
        Ok(tracks)
    }

    fn artist_tracks(&self, artist: &ArtistRef) -> Result<Vec<TrackRef>> {
        self.ensure_artist(artist)?;
        self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM track_artists ta
                 JOIN tracks t ON t.uri = ta.track_uri
                 JOIN albums al ON al.uri = t.album_uri
                 WHERE ta.artist_uri = ?1
                 ORDER BY al.rowid, t.track_number"
            ),
            artist.uri.as_str(),
        )
    }

    fn album_track_count(&self, album: &AlbumRef) -> Result<u32> {
        let row: Option<(Option<u32>, i64)> = self
            .conn
            .query_row(
                "SELECT total_tracks, (SELECT COUNT(*) FROM tracks WHERE album_uri = ?1)
                 FROM albums WHERE uri = ?1",
                [album.uri.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((Some(total), _)) => Ok(total),
            Some((None, actual)) => Ok(u32::try_from(actual).unwrap_or(u32::MAX)),
            None => bail!("Unknown album `{}'", album.uri),
        }
    }

    fn album_tracks(&self, album: &AlbumRef) -> Result<Vec<TrackRef>> {
        let known: Option<String> = self
            .conn
            .query_row("SELECT uri FROM albums WHERE uri = ?1", [album.uri.as_str()], |row| row.get(0))
            .optional()?;
        if known.is_none() {
            bail!("Unknown album `{}'", album.uri);
        }
        self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM tracks t
                 JOIN albums al ON al.uri = t.album_uri
                 WHERE t.album_uri = ?1 ORDER BY t.track_number"
            ),
            album.uri.as_str(),
        )
    }

    fn related_artists(&self, artist: &ArtistRef) -> Result<Vec<ArtistRef>> {
        self.ensure_artist(artist)?;
        let mut stmt = self.conn.prepare_cached(
            "SELECT ar.uri, ar.name FROM related_artists r
             JOIN artists ar ON ar.uri = r.related_uri
             WHERE r.artist_uri = ?1 ORDER BY r.rank",
        )?;
        let related = stmt
            .query_map([artist.uri.as_str()], |row| {
                Ok(ArtistRef::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to load related artists of {}", artist.uri))?;
        Ok(related)
    }
}

impl PlaylistSink for SqliteCatalog {
    fn create_playlist(&mut self, name: &str, tracks: &[TrackRef]) -> Result<Playlist> {
        let playlist = Playlist {
            uri: self.next_playlist_uri()?,
            name: unique_playlist_name(name, &playlist_names(&self.conn)?),
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO playlists (uri, name) VALUES (?1, ?2)",
            (playlist.uri.as_str(), &playlist.name),
        )
        .with_context(|| format!("Failed to create playlist `{}'", playlist.name))?;
        {
            let mut member =
                tx.prepare("INSERT INTO playlist_tracks (playlist_uri, track_uri, position) VALUES (?1, ?2, ?3)")?;
            for (position, track) in tracks.iter().enumerate() {
                member
                    .execute((playlist.uri.as_str(), track.uri.as_str(), position))
                    .with_context(|| format!("Failed to add {} to `{}'", track.uri, playlist.name))?;
            }
        }
        tx.commit().context("Committing playlist failed")?;

        debug!("Stored {} as {} ({} tracks)", playlist.name, playlist.uri, tracks.len());
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AlbumEntry, ArtistEntry, PlaylistEntry, TrackEntry};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn dump() -> CatalogDump {
        CatalogDump {
            artists: vec![
                ArtistEntry { uri: "a:1".into(), name: "One".into(), related: vec!["a:2".into()] },
                ArtistEntry { uri: "a:2".into(), name: "Two".into(), related: vec![] },
            ],
            albums: vec![
                AlbumEntry { uri: "al:1".into(), name: "First".into(), artists: vec!["a:1".into()], total_tracks: Some(20) },
                AlbumEntry { uri: "al:2".into(), name: "Second".into(), artists: vec!["a:1".into()], total_tracks: None },
            ],
            tracks: (1..=12)
                .map(|i| TrackEntry {
                    uri: Uri::new(format!("t:{i}")),
                    name: format!("Song {i}"),
                    popularity: u8::try_from(i * 5).unwrap(),
                    artists: if i == 12 { vec!["a:1".into(), "a:2".into()] } else { vec!["a:1".into()] },
                    album: if i <= 6 { "al:2".into() } else { "al:1".into() },
                    duration_ms: 1000,
                    track_number: u32::try_from(i).unwrap(),
                    explicit: i % 2 == 0,
                })
                .collect(),
            playlists: vec![PlaylistEntry { uri: "p:1".into(), name: "Seed".into(), tracks: vec!["t:2".into(), "t:1".into()] }],
        }
    }

    fn catalog() -> (TempDir, SqliteCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = init_database(&dir.path().join("catalog.db"), false).unwrap();
        import_dump(&mut conn, &dump()).unwrap();
        (dir, SqliteCatalog::new(conn))
    }

    #[test]
    fn test_init_refuses_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        init_database(&path, false).unwrap();
        assert!(init_database(&path, false).is_err());
        assert!(init_database(&path, true).is_ok());
    }

    #[test]
    fn test_import_rejects_dangling_references() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = init_database(&dir.path().join("catalog.db"), false).unwrap();
        let mut broken = dump();
        broken.playlists[0].tracks.push("t:missing".into());
        assert!(import_dump(&mut conn, &broken).is_err());
        assert!(list_playlists(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_import_twice_replaces() {
        let (_dir, mut catalog) = catalog();
        let stats = import_dump(&mut catalog.conn, &dump()).unwrap();
        assert_eq!(stats.tracks, 12);
        let playlists = list_playlists(catalog.connection()).unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].tracks, 2);
    }

    #[test]
    fn test_reimport_replaces_credits() {
        let (dir, mut catalog) = catalog();
        let mut recredited = dump();
        recredited.tracks[11].artists = vec!["a:2".into()];
        recredited.albums[1].artists = vec!["a:2".into()];
        import_dump(&mut catalog.conn, &recredited).unwrap();
        drop(catalog);

        let catalog = SqliteCatalog::open(&dir.path().join("catalog.db")).unwrap();
        let one = ArtistRef::new("a:1", "One");
        let two = ArtistRef::new("a:2", "Two");
        assert_eq!(catalog.artist_tracks(&one).unwrap().len(), 11);
        assert_eq!(catalog.artist_track_count(&one).unwrap(), 20);
        assert_eq!(catalog.artist_track_count(&two).unwrap(), 6);

        let moved = catalog.artist_tracks(&two).unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].artist_names(), "Two");
    }

    #[test]
    fn test_playlist_queries() {
        let (_dir, catalog) = catalog();
        let seed = catalog.resolve_playlist("Seed").unwrap();
        assert_eq!(seed.uri, Uri::from("p:1"));
        assert_eq!(catalog.resolve_playlist("p:1").unwrap(), seed);
        assert!(catalog.resolve_playlist("nope").is_err());

        let tracks = catalog.playlist_tracks(&seed.uri).unwrap();
        let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Song 2", "Song 1"]);
        assert!(tracks[0].explicit);
        assert_eq!(tracks[0].album.name, "Second");
    }

    #[test]
    fn test_artist_queries_match_memory_catalog() {
        let (_dir, catalog) = catalog();
        let memory = MemoryCatalog::from_dump(&dump()).unwrap();
        let one = ArtistRef::new("a:1", "One");
        let uris = |tracks: Vec<TrackRef>| tracks.iter().map(|t| t.uri.clone()).collect::<Vec<_>>();

        assert_eq!(uris(catalog.artist_tracks(&one).unwrap()), uris(memory.artist_tracks(&one).unwrap()));
        assert_eq!(
            uris(catalog.artist_top_tracks(&one).unwrap()),
            uris(memory.artist_top_tracks(&one).unwrap())
        );
        assert_eq!(catalog.artist_track_count(&one).unwrap(), 26);
        assert_eq!(catalog.artist_track_count(&one).unwrap(), memory.artist_track_count(&one).unwrap());
        assert_eq!(catalog.related_artists(&one).unwrap(), vec![ArtistRef::new("a:2", "Two")]);
        assert!(catalog.artist_tracks(&ArtistRef::new("a:9", "Nine")).is_err());
    }

    #[test]
    fn test_album_queries() {
        let (_dir, catalog) = catalog();
        let second = AlbumRef::new("al:2", "Second");
        assert_eq!(catalog.album_track_count(&second).unwrap(), 6);
        assert_eq!(catalog.album_track_count(&AlbumRef::new("al:1", "First")).unwrap(), 20);
        assert_eq!(catalog.album_tracks(&second).unwrap().len(), 6);
        assert!(catalog.album_tracks(&AlbumRef::new("al:9", "Nope")).is_err());
    }

    #[test]
    fn test_tracks_are_interned() {
        let (_dir, catalog) = catalog();
        let seed = Uri::from("p:1");
        let first = catalog.playlist_tracks(&seed).unwrap();
        let second = catalog.playlist_tracks(&seed).unwrap();
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(catalog.cache_stats(), (2, 2, 2));

        let duet = catalog.artist_tracks(&ArtistRef::new("a:2", "Two")).unwrap();
        assert_eq!(duet[0].artist_names(), "One, Two");
    }

    #[test]
    fn test_create_playlist_unique_name() {
        let (_dir, mut catalog) = catalog();
        let tracks = catalog.playlist_tracks(&Uri::from("p:1")).unwrap();

        let first = catalog.create_playlist("Seed", &tracks).unwrap();
        assert_eq!(first.name, "Seed (2)");
        let second = catalog.create_playlist("Seed", &tracks).unwrap();
        assert_eq!(second.name, "Seed (3)");
        assert_ne!(first.uri, second.uri);

        let stored = catalog.playlist_tracks(&second.uri).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].name, "Song 2");
        assert_eq!(list_playlists(catalog.connection()).unwrap().len(), 3);
    }
}
