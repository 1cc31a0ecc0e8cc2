//! Configuration loaded from `config.toml`
//!
//! Missing or unreadable files fall back to defaults so the tool always starts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input::Edge;
use crate::store::Surface;

/// Where persisted state lives and which schema version this build writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_prefs_path")]
    pub prefs_path: PathBuf,
    #[serde(default = "default_host_path")]
    pub host_snapshot_path: PathBuf,
    #[serde(default = "default_database_version")]
    pub database_version: i32,
}

/// `$XDG_STATE_HOME/lockwidgets`, falling back to `~/.local/state` then `/tmp`
pub fn state_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("lockwidgets")
}

fn default_prefs_path() -> PathBuf { state_dir().join("prefs.json") }
fn default_host_path() -> PathBuf { state_dir().join("widget_host.json") }
fn default_database_version() -> i32 { crate::migrations::DATABASE_VERSION }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefs_path: default_prefs_path(),
            host_snapshot_path: default_host_path(),
            database_version: default_database_version(),
        }
    }
}

/// Pixel geometry used to size one resize step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_frame_width")]
    pub frame_width_px: i32,
    #[serde(default = "default_frame_height")]
    pub frame_height_px: i32,
    #[serde(default = "default_screen_width")]
    pub screen_width_px: i32,
    #[serde(default = "default_drawer_row_height")]
    pub drawer_row_height_px: i32,
}

fn default_frame_width() -> i32 { 900 }
fn default_frame_height() -> i32 { 600 }
fn default_screen_width() -> i32 { 1080 }
fn default_drawer_row_height() -> i32 { 200 }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            frame_width_px: default_frame_width(),
            frame_height_px: default_frame_height(),
            screen_width_px: default_screen_width(),
            drawer_row_height_px: default_drawer_row_height(),
        }
    }
}

impl GridConfig {
    /// Drag distance for one resize step: one grid cell along the handle's axis
    pub fn threshold_px(&self, surface: Surface, edge: Edge, cols: i32, rows: i32) -> i32 {
        match (surface, edge.is_horizontal()) {
            (Surface::Frame, true) => self.frame_width_px / cols.max(1),
            (Surface::Frame, false) => self.frame_height_px / rows.max(1),
            (Surface::Drawer, true) => self.screen_width_px / cols.max(1),
            (Surface::Drawer, false) => self.drawer_row_height_px,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub grid: GridConfig,
}

impl Config {
    /// Default location, next to the other state files
    pub fn default_path() -> PathBuf {
        state_dir().join("config.toml")
    }

    /// Load config from file, or return defaults if missing or invalid
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    tracing::error!("Failed to parse {:?}: {}", path, e);
                }
            },
            Err(e) => {
                tracing::debug!("No config at {:?}: {}", path, e);
            }
        }

        tracing::info!("Using default config");
        Self::default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
