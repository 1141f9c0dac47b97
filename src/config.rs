//! # Configuration Module
//!
//! Data directory management and the tunables of the discovery engine.
//!
//! ## Data Storage
//!
//! Deepcut keeps its catalog database and configuration file in the
//! platform-standard data directory:
//! - Linux: `~/.local/share/deepcut/`
//! - macOS: `~/Library/Application Support/deepcut/`
//! - Windows: `%APPDATA%\deepcut\`
//!
//! ## Configuration File
//!
//! `config.json` in the data directory holds a [`DiscoveryConfig`]. Every
//! field is optional; missing fields take their defaults:
//!
//! ```json
//! {
//!   "spillover": 0.35,
//!   "quick": true,
//!   "filters": [{ "attribute": "explicit", "reverse": true }]
//! }
//! ```

use crate::filters::AttributeFilter;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "deepcut";
const DB_FILE: &str = "catalog.db";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate data directory for Deepcut, creating it
/// if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The deepcut subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create Deepcut data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Returns the path of the catalog database (`catalog.db` in the data directory).
///
/// # Examples
///
/// ```no_run
/// use deepcut::config::get_db_path;
///
/// let db_path = get_db_path()?;
/// println!("Catalog location: {}", db_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// Returns the path of the discovery configuration file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

/// Tunables of one discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Fraction of an artist's allocation, scaled by how used up the artist
    /// would be, that is handed to related artists. With 0, only inventory
    /// shortfalls reach them.
    pub spillover: f64,
    /// Load only top tracks when they are provably enough.
    pub quick: bool,
    /// How much albums with large shares or exploitation are prioritised.
    pub album_share_bonus_modifier: f64,
    /// How much above-average exploitation grows an artist's allocation.
    pub artist_exploitation_bonus_modifier: f64,
    /// Largest estimated allocation still served from top tracks in quick mode.
    pub top_tracks_limit: usize,
    /// Number of leading picks taken from the biggest artists in order.
    pub miniature_size: usize,
    /// Appended to the seed's name to name the result.
    pub playlist_suffix: String,
    /// Seed for the interleaving RNG; random when absent.
    pub seed: Option<u64>,
    /// Tracks failing any filter are never allocated.
    pub filters: Vec<AttributeFilter>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            spillover: 0.35,
            quick: false,
            album_share_bonus_modifier: 0.1,
            artist_exploitation_bonus_modifier: 0.1,
            top_tracks_limit: 10,
            miniature_size: 4,
            playlist_suffix: " Discovery".to_string(),
            seed: None,
            filters: Vec::new(),
        }
    }
}

impl DiscoveryConfig {
    /// Read the configuration at `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read, parsed or
    /// validated.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("Failed to write configuration {}", path.display()))
    }

    /// Reject parameters the allocation math cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("spillover", self.spillover),
            ("album_share_bonus_modifier", self.album_share_bonus_modifier),
            ("artist_exploitation_bonus_modifier", self.artist_exploitation_bonus_modifier),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("Configuration value `{name}' must be a non-negative number, got {value}");
            }
        }
        for filter in &self.filters {
            filter.validate()?;
        }
        Ok(())
    }
}

/// Locations used by one invocation of the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl RuntimeConfig {
    /// Use the default locations, overridden by whichever paths are given.
    pub fn new(db_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(path) => path,
            None => get_db_path()?,
        };
        let config_path = match config_path {
            Some(path) => path,
            None => get_config_path()?,
        };
        Ok(Self { db_path, config_path })
    }

    pub fn load_discovery(&self) -> Result<DiscoveryConfig> {
        DiscoveryConfig::load(&self.config_path)
    }
}
