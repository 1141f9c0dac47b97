//! Discovery playlists grown from the artists already in a collection.
//!
//! Given a seed playlist, deepcut works out how much each artist contributes
//! to it, how much of each artist's catalog the seed already covers, and
//! allocates a result of the requested size accordingly. Artists whose
//! catalog would be drained hand part of their allocation to related artists.
//!
//! Core modules:
//! - [`discovery`] - Allocation, spillover and interleaving
//! - [`catalog`] - Read/write access to the music catalog
//! - [`db`] - SQLite backed catalog
//!
//! ### Supporting Modules
//!
//! - [`model`] - Artists, albums, tracks and playlists
//! - [`cache`] - Resource interning for catalog backends
//! - [`dedup`] - Title based duplicate removal
//! - [`filters`] - Track attribute filters
//! - [`config`] - Data directory and discovery configuration
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use deepcut::catalog::{Catalog, MemoryCatalog};
//! use deepcut::config::DiscoveryConfig;
//! use deepcut::discovery::Discover;
//!
//! let catalog = MemoryCatalog::from_json(&std::fs::read_to_string("catalog.json")?)?;
//! let seed = catalog.resolve_playlist("Late Night")?;
//!
//! let mut discover = Discover::new(DiscoveryConfig::default());
//! let report = discover.run(&catalog, &seed, 50)?;
//! println!("{report}");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Fallible functions return `anyhow::Result`. Catalog lookups of unknown
//! resources and malformed dumps are errors; an artist without related
//! artists or an empty seed is not.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod dedup;
pub mod discovery;
pub mod filters;
pub mod model;
