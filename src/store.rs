//! Persisted preferences
//!
//! The whole document is read once, mutated in memory and written back with
//! [`PrefStore::save`]. Widget collections are kept as JSON text, the same
//! text that ends up inside backups.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::widgets::{parse_widgets, widgets_to_string, WidgetRecord, WidgetSize};

pub const KEY_CURRENT_WIDGETS: &str = "current_widgets";
pub const KEY_FRAME_ROW_COUNT: &str = "frame_row_count";
pub const KEY_FRAME_COL_COUNT: &str = "frame_col_count";

/// Which widget collection an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The lock screen frame
    Frame,
    /// The slide-out drawer
    Drawer,
}

/// On-disk preference document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(default)]
    pub current_widgets: Option<String>,
    #[serde(default)]
    pub drawer_widgets: Option<String>,
    #[serde(default = "default_count")]
    pub frame_row_count: i32,
    #[serde(default = "default_count")]
    pub frame_col_count: i32,
    #[serde(default = "default_drawer_cols")]
    pub drawer_col_count: i32,
    /// Sizes from before they were stored on each record
    #[serde(default)]
    pub widget_sizes: BTreeMap<i32, WidgetSize>,
    #[serde(default)]
    pub wallpaper_dim_amount: f32,
    #[serde(default)]
    pub dim_amount_scaled: bool,
    #[serde(default)]
    pub database_version: i32,
}

fn default_count() -> i32 { 1 }
fn default_drawer_cols() -> i32 { 2 }

impl Default for Prefs {
    fn default() -> Self {
        Self {
            current_widgets: None,
            drawer_widgets: None,
            frame_row_count: default_count(),
            frame_col_count: default_count(),
            drawer_col_count: default_drawer_cols(),
            widget_sizes: BTreeMap::new(),
            wallpaper_dim_amount: 0.0,
            dim_amount_scaled: false,
            database_version: 0,
        }
    }
}

/// Preference document plus where it lives
#[derive(Debug, Clone, Default)]
pub struct PrefStore {
    path: Option<PathBuf>,
    pub prefs: Prefs,
}

impl PrefStore {
    /// Store that is never written to disk
    pub fn in_memory(prefs: Prefs) -> Self {
        Self { path: None, prefs }
    }

    /// Load the document at `path`; a missing file yields defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let prefs = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Prefs::default(),
            Ok(contents) => {
                let prefs: Prefs = serde_json::from_str(&contents).map_err(|source| Error::InvalidStore {
                    path: path.clone(),
                    source,
                })?;
                tracing::info!("Loaded prefs from {:?}", path);
                prefs
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No prefs at {:?}, starting empty", path);
                Prefs::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path: Some(path), prefs })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the document back; in-memory stores are left alone
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.prefs)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        tracing::debug!("Saved prefs to {:?}", path);
        Ok(())
    }

    /// Raw collection text for a surface
    pub fn widgets_string(&self, surface: Surface) -> Option<&str> {
        match surface {
            Surface::Frame => self.prefs.current_widgets.as_deref(),
            Surface::Drawer => self.prefs.drawer_widgets.as_deref(),
        }
    }

    /// Replace the raw collection text; callers validate it first
    pub fn set_widgets_string(&mut self, surface: Surface, text: Option<String>) {
        match surface {
            Surface::Frame => self.prefs.current_widgets = text,
            Surface::Drawer => self.prefs.drawer_widgets = text,
        }
    }

    /// Parsed collection; unreadable text is logged and treated as empty
    pub fn widgets(&self, surface: Surface) -> Vec<WidgetRecord> {
        let Some(text) = self.widgets_string(surface) else {
            return Vec::new();
        };

        match parse_widgets(text) {
            Ok(widgets) => widgets,
            Err(e) => {
                tracing::warn!(?surface, "Stored widget collection is unreadable: {}", e);
                Vec::new()
            }
        }
    }

    pub fn set_widgets(&mut self, surface: Surface, widgets: &[WidgetRecord]) -> Result<()> {
        let text = widgets_to_string(widgets)?;
        self.set_widgets_string(surface, Some(text));
        Ok(())
    }

    /// Column count for a surface, never below one
    pub fn col_count(&self, surface: Surface) -> i32 {
        match surface {
            Surface::Frame => self.prefs.frame_col_count.max(1),
            Surface::Drawer => self.prefs.drawer_col_count.max(1),
        }
    }

    /// Row count for a surface; the drawer scrolls, so it is unbounded
    pub fn row_count(&self, surface: Surface) -> i32 {
        match surface {
            Surface::Frame => self.prefs.frame_row_count.max(1),
            Surface::Drawer => i32::MAX,
        }
    }

    pub fn database_version(&self) -> i32 {
        self.prefs.database_version
    }

    pub fn set_database_version(&mut self, version: i32) {
        self.prefs.database_version = version;
    }
}
