//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `deepcut` binary.
//!
//! ## Commands
//!
//! - `init-db`: Create the catalog database
//! - `import`: Load a JSON catalog dump into the database
//! - `playlists`: List stored playlists
//! - `discover`: Grow a discovery playlist from a seed playlist
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! deepcut init-db
//! deepcut import catalog.json
//! deepcut discover "Late Night" --size 50 --quick
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "deepcut")]
#[command(about = "Deepcut: discovery playlists grown from the artists already in your collection")]
#[command(version)]
pub struct Args {
    /// Catalog database to use instead of the one in the data directory
    #[arg(long, global = true, env = "DEEPCUT_DB")]
    pub db: Option<PathBuf>,

    /// Discovery configuration file to use instead of the default
    #[arg(long, global = true, env = "DEEPCUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the catalog database
    ///
    /// Fails if a database already exists, unless `--force` is given.
    InitDb {
        /// Delete and recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Import a JSON catalog dump
    ///
    /// The dump lists artists (with related artists), albums, tracks and
    /// playlists, referencing each other by URI. Entities already in the
    /// database are replaced.
    Import {
        /// Path to the dump file
        file: PathBuf,
    },

    /// List stored playlists
    Playlists,

    /// Create a discovery playlist from a seed playlist
    ///
    /// Every artist of the seed gets a share of the result proportional to
    /// its share of the seed. Part of each share spills over to related
    /// artists. The result is stored as "<seed> Discovery".
    Discover {
        /// Seed playlist, by exact name or URI
        playlist: String,

        /// Number of tracks to aim for
        #[arg(short, long, default_value = "100")]
        size: usize,

        /// Load only top tracks for artists with small allocations
        #[arg(short, long)]
        quick: bool,

        /// Spillover parameter; with 0, related artists only cover shortfalls
        #[arg(long)]
        spillover: Option<f64>,

        /// Seed for the random interleaving
        #[arg(long)]
        seed: Option<u64>,

        /// Leave out explicit tracks
        #[arg(long)]
        no_explicit: bool,

        /// Leave out tracks less popular than this (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        min_popularity: Option<u8>,

        /// Print the result without storing it
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// Outputs a completion script for the given shell.
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Print playlist names for shell completion
    #[command(hide = true)]
    CompletePlaylists,
}
