//! Access to the live widget host
//!
//! Migrations and restores need to ask the platform what a bound widget id
//! currently points at, and to release ids that are no longer used.
//! [`SnapshotHost`] answers from a JSON description of installed widgets.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the host currently knows about a bound widget id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetInfo {
    /// Flattened provider component (`package/class`)
    pub provider: String,
    pub label: String,
    /// PNG preview image, if the provider ships one
    pub preview_png: Option<Vec<u8>>,
}

pub trait WidgetHost {
    /// Look up a bound id; `None` when the host no longer recognizes it
    fn widget_info(&self, id: i32) -> Option<WidgetInfo>;

    /// Release a bound id
    fn delete_widget_id(&mut self, id: i32);
}

/// One installed widget as described in a snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub provider: String,
    pub label: String,
    /// Preview image, relative to the snapshot file
    #[serde(default)]
    pub preview: Option<PathBuf>,
}

/// Widget host backed by a JSON file mapping ids to entries
#[derive(Debug, Clone, Default)]
pub struct SnapshotHost {
    path: Option<PathBuf>,
    widgets: BTreeMap<i32, SnapshotEntry>,
}

impl SnapshotHost {
    pub fn new(widgets: BTreeMap<i32, SnapshotEntry>) -> Self {
        Self { path: None, widgets }
    }

    /// Load a snapshot; a missing file is an empty host
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let widgets = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("No widget host snapshot at {:?}", path);
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Loaded {} bound widgets from {:?}", widgets.len(), path);
        Ok(Self { path: Some(path), widgets })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_string_pretty(&self.widgets)?)?;
        }
        Ok(())
    }

    pub fn contains(&self, id: i32) -> bool {
        self.widgets.contains_key(&id)
    }

    fn read_preview(&self, preview: &Path) -> Option<Vec<u8>> {
        let full = match (&self.path, preview.is_relative()) {
            (Some(base), true) => base.parent().map(|p| p.join(preview))?,
            _ => preview.to_path_buf(),
        };

        match fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!("No preview at {:?}: {}", full, e);
                None
            }
        }
    }
}

impl WidgetHost for SnapshotHost {
    fn widget_info(&self, id: i32) -> Option<WidgetInfo> {
        let entry = self.widgets.get(&id)?;
        Some(WidgetInfo {
            provider: entry.provider.clone(),
            label: entry.label.clone(),
            preview_png: entry.preview.as_deref().and_then(|p| self.read_preview(p)),
        })
    }

    fn delete_widget_id(&mut self, id: i32) {
        if self.widgets.remove(&id).is_some() {
            tracing::debug!(id, "Released widget id");
        }
    }
}
