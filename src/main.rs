//! # Deepcut
//!
//! Command-line front end of the discovery engine. The catalog lives in a
//! SQLite database filled from JSON dumps; discovery results are written back
//! to it as playlists.
//!
//! ## Usage
//!
//! ```bash
//! # Create the database and load a catalog
//! deepcut init-db
//! deepcut import catalog.json
//!
//! # Grow a playlist
//! deepcut discover "Late Night" --size 50
//!
//! # See what would happen, as JSON
//! deepcut discover "Late Night" --dry-run --json
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use deepcut::catalog::{Catalog, CatalogDump};
use deepcut::cli::{self, Command};
use deepcut::completion;
use deepcut::config::{DiscoveryConfig, RuntimeConfig};
use deepcut::db::{self, SqliteCatalog};
use deepcut::discovery::{Discover, DiscoveryReport};
use deepcut::filters::{Attribute, AttributeFilter};
use deepcut::model::Playlist;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Command-line overrides of the discovery configuration.
struct DiscoverOptions {
    quick: bool,
    spillover: Option<f64>,
    seed: Option<u64>,
    no_explicit: bool,
    min_popularity: Option<u8>,
}

impl DiscoverOptions {
    fn apply(self, config: &mut DiscoveryConfig) -> Result<()> {
        config.quick |= self.quick;
        if let Some(spillover) = self.spillover {
            config.spillover = spillover;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_explicit {
            config.filters.push(AttributeFilter::exclude(Attribute::Explicit));
        }
        if let Some(min) = self.min_popularity {
            config
                .filters
                .push(AttributeFilter::new(Attribute::Popularity, Some(f64::from(min)), None, false)?);
        }
        config.validate()
    }
}

fn import(db_path: &Path, file: &Path) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let dump = CatalogDump::from_json(&text).with_context(|| format!("Invalid catalog dump {}", file.display()))?;
    let mut conn = if db_path.exists() {
        db::connect(db_path)?
    } else {
        db::init_database(db_path, false)?
    };
    let stats = db::import_dump(&mut conn, &dump)?;
    println!(
        "Imported {} artists, {} albums, {} tracks and {} playlists",
        stats.artists, stats.albums, stats.tracks, stats.playlists
    );
    Ok(())
}

fn list_playlists(db_path: &Path) -> Result<()> {
    let catalog = SqliteCatalog::open(db_path)?;
    let playlists = db::list_playlists(catalog.connection())?;
    if playlists.is_empty() {
        println!("No playlists. Import a catalog dump first.");
    }
    for info in playlists {
        println!("{:5} tracks  {}  ({})", info.tracks, info.playlist.name, info.playlist.uri);
    }
    Ok(())
}

fn print_report(report: &DiscoveryReport, created: Option<&Playlist>) {
    println!("{report}");
    println!();
    for (i, track) in report.tracks.iter().enumerate() {
        println!("{:4}. {} - {}", i + 1, track.artist_names(), track.name);
    }
    match created {
        Some(playlist) => println!("\nCreated `{}' ({}) with {} tracks", playlist.name, playlist.uri, report.tracks.len()),
        None => println!("\nNothing stored"),
    }
}

fn discover(
    runtime: &RuntimeConfig,
    query: &str,
    size: usize,
    options: DiscoverOptions,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let mut config = runtime.load_discovery()?;
    options.apply(&mut config)?;

    let mut catalog = SqliteCatalog::open(&runtime.db_path)?;
    let seed = catalog.resolve_playlist(query)?;
    info!("Discovering {size} tracks from {} ({})", seed.name, seed.uri);

    let mut discover = Discover::new(config);
    let (report, created) = if dry_run {
        (discover.run(&catalog, &seed, size)?, None)
    } else {
        let extension = discover.extend(&mut catalog, &seed, size)?;
        (extension.report, extension.playlist)
    };

    let (cached, hits, misses) = catalog.cache_stats();
    debug!("Track cache: {cached} tracks, {hits} hits, {misses} misses");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, created.as_ref());
    }
    Ok(())
}

/// Parses arguments and routes commands. Logging is controlled through
/// `RUST_LOG`, e.g. `RUST_LOG=deepcut=debug deepcut discover Seed`.
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
        Command::CompletePlaylists => {
            let runtime = RuntimeConfig::new(args.db, args.config)?;
            completion::print_playlist_completions(&runtime.db_path)?;
        }
        Command::InitDb { force } => {
            let runtime = RuntimeConfig::new(args.db, args.config)?;
            db::init_database(&runtime.db_path, force)?;
            println!("Catalog database ready at {}", runtime.db_path.display());
        }
        Command::Import { file } => {
            let runtime = RuntimeConfig::new(args.db, args.config)?;
            import(&runtime.db_path, &file)?;
        }
        Command::Playlists => {
            let runtime = RuntimeConfig::new(args.db, args.config)?;
            list_playlists(&runtime.db_path)?;
        }
        Command::Discover {
            playlist,
            size,
            quick,
            spillover,
            seed,
            no_explicit,
            min_popularity,
            dry_run,
            json,
        } => {
            let runtime = RuntimeConfig::new(args.db, args.config)?;
            let options = DiscoverOptions {
                quick,
                spillover,
                seed,
                no_explicit,
                min_popularity,
            };
            discover(&runtime, &playlist, size, options, dry_run, json)?;
        }
    }

    Ok(())
}
