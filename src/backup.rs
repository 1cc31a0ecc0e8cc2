//! Backup and restore of widget collections
//!
//! A backup is a flat JSON object of string values:
//!
//! ```json
//! {"current_widgets": "[{\"id\":1,...}]", "frame_row_count": "2", "frame_col_count": "3"}
//! ```
//!
//! Very old backups are just the bare widget collection; those are still
//! accepted. Restores validate everything before touching the store.

use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::host::WidgetHost;
use crate::store::{PrefStore, Surface, KEY_CURRENT_WIDGETS, KEY_FRAME_COL_COUNT, KEY_FRAME_ROW_COUNT};
use crate::widgets::parse_widgets;

/// Keys written by builds with multiple frames; only the primary frame is restored
const SECONDARY_FRAME_KEYS: [&str; 3] = ["secondaryFramesNewest", "frameWidgetsMapNew", "frameGridsMapNew"];

pub struct BackupRestoreManager<'a> {
    store: &'a mut PrefStore,
    host: &'a mut dyn WidgetHost,
}

impl<'a> BackupRestoreManager<'a> {
    pub fn new(store: &'a mut PrefStore, host: &'a mut dyn WidgetHost) -> Self {
        Self { store, host }
    }

    /// Serialize a surface's widgets and grid size
    pub fn create_backup_string(&self, surface: Surface) -> Result<String> {
        let mut data: BTreeMap<&str, String> = BTreeMap::new();

        if let Some(widgets) = self.store.widgets_string(surface) {
            data.insert(KEY_CURRENT_WIDGETS, widgets.to_string());
        }
        data.insert(KEY_FRAME_ROW_COUNT, self.store.row_count(surface).to_string());
        data.insert(KEY_FRAME_COL_COUNT, self.store.col_count(surface).to_string());

        Ok(serde_json::to_string(&data)?)
    }

    /// Replace a surface's widgets from backup text
    ///
    /// Returns `false`, with nothing changed, if the text is not a usable backup.
    pub fn restore_backup_string(&mut self, text: &str, surface: Surface) -> bool {
        if text.trim().is_empty() {
            tracing::debug!("Backup string is empty");
            return false;
        }

        match serde_json::from_str::<BTreeMap<String, Option<String>>>(text) {
            Ok(data) => self.handle_data_map(data, surface),
            Err(e) => {
                tracing::debug!("No data map ({}), trying old restore", e);
                self.handle_widget_string(Some(text), surface)
            }
        }
    }

    fn handle_data_map(&mut self, data: BTreeMap<String, Option<String>>, surface: Surface) -> bool {
        if data.is_empty() {
            tracing::debug!("Backup data empty");
            return false;
        }

        let secondary: Vec<&str> = SECONDARY_FRAME_KEYS
            .into_iter()
            .filter(|key| data.contains_key(*key))
            .collect();
        if !secondary.is_empty() {
            tracing::info!(?secondary, "Backup has secondary frames; restoring the primary frame only");
        }

        let parse_count = |key: &str| -> Option<i32> {
            data.get(key)?.as_deref()?.trim().parse().ok()
        };
        let rows = parse_count(KEY_FRAME_ROW_COUNT);
        let cols = parse_count(KEY_FRAME_COL_COUNT);

        let widgets = data.get(KEY_CURRENT_WIDGETS).and_then(|w| w.as_deref());
        if !self.handle_widget_string(widgets, surface) {
            return false;
        }

        match surface {
            Surface::Frame => {
                if let Some(rows) = rows {
                    self.store.prefs.frame_row_count = rows;
                }
                if let Some(cols) = cols {
                    self.store.prefs.frame_col_count = cols;
                }
            }
            Surface::Drawer => {
                if let Some(cols) = cols {
                    self.store.prefs.drawer_col_count = cols;
                }
            }
        }

        true
    }

    fn handle_widget_string(&mut self, widgets: Option<&str>, surface: Surface) -> bool {
        let Some(widgets) = widgets.filter(|w| !w.trim().is_empty()) else {
            tracing::debug!("Widget string is empty");
            return false;
        };

        let restored = match parse_widgets(widgets) {
            Ok(restored) => restored,
            Err(e) => {
                tracing::info!("Invalid widget string: {}", e);
                return false;
            }
        };

        // Release ids the restored collection no longer references
        let keep: HashSet<i32> = restored.iter().map(|w| w.id).collect();
        for old in self.store.widgets(surface) {
            if !keep.contains(&old.id) {
                self.host.delete_widget_id(old.id);
            }
        }

        tracing::info!(?surface, count = restored.len(), "Restored widgets from backup");
        self.store.set_widgets_string(surface, Some(widgets.to_string()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SnapshotEntry, SnapshotHost};
    use crate::widgets::{WidgetRecord, WidgetType};

    fn entry() -> SnapshotEntry {
        SnapshotEntry {
            provider: "com.a/.A".into(),
            label: "A".into(),
            preview: None,
        }
    }

    fn setup() -> (PrefStore, SnapshotHost) {
        let mut store = PrefStore::default();
        store
            .set_widgets(
                Surface::Frame,
                &[
                    WidgetRecord::new(1, WidgetType::Widget),
                    WidgetRecord::new(2, WidgetType::Widget),
                ],
            )
            .unwrap();
        store.prefs.frame_row_count = 2;
        store.prefs.frame_col_count = 3;

        let host = SnapshotHost::new([(1, entry()), (2, entry())].into_iter().collect());
        (store, host)
    }

    #[test]
    fn test_backup_contains_widgets_and_grid() {
        let (mut store, mut host) = setup();
        let manager = BackupRestoreManager::new(&mut store, &mut host);
        let backup = manager.create_backup_string(Surface::Frame).unwrap();

        let data: BTreeMap<String, String> = serde_json::from_str(&backup).unwrap();
        assert_eq!(data[KEY_FRAME_ROW_COUNT], "2");
        assert_eq!(data[KEY_FRAME_COL_COUNT], "3");
        assert_eq!(parse_widgets(&data[KEY_CURRENT_WIDGETS]).unwrap().len(), 2);
    }

    #[test]
    fn test_drawer_backup_rows_unbounded() {
        let (mut store, mut host) = setup();
        let manager = BackupRestoreManager::new(&mut store, &mut host);
        let backup = manager.create_backup_string(Surface::Drawer).unwrap();

        let data: BTreeMap<String, String> = serde_json::from_str(&backup).unwrap();
        assert_eq!(data[KEY_FRAME_ROW_COUNT], i32::MAX.to_string());
        assert_eq!(data[KEY_FRAME_COL_COUNT], "2");
        assert!(!data.contains_key(KEY_CURRENT_WIDGETS));
    }

    #[test]
    fn test_restore_into_other_store() {
        let (mut store, mut host) = setup();
        let backup = BackupRestoreManager::new(&mut store, &mut host)
            .create_backup_string(Surface::Frame)
            .unwrap();

        let mut target = PrefStore::default();
        let mut target_host = SnapshotHost::default();
        let mut manager = BackupRestoreManager::new(&mut target, &mut target_host);
        assert!(manager.restore_backup_string(&backup, Surface::Frame));

        assert_eq!(target.widgets(Surface::Frame).len(), 2);
        assert_eq!(target.prefs.frame_row_count, 2);
        assert_eq!(target.prefs.frame_col_count, 3);
    }

    #[test]
    fn test_invalid_input_changes_nothing() {
        for text in ["", "   ", "not json", "{}", r#"{"current_widgets": "oops"}"#, r#"{"frame_row_count": "4"}"#, "null"] {
            let (mut store, mut host) = setup();
            let before = serde_json::to_string(&store.prefs).unwrap();

            let mut manager = BackupRestoreManager::new(&mut store, &mut host);
            assert!(!manager.restore_backup_string(text, Surface::Frame), "accepted {:?}", text);

            assert_eq!(serde_json::to_string(&store.prefs).unwrap(), before);
            assert!(host.contains(1) && host.contains(2));
        }
    }

    #[test]
    fn test_legacy_bare_collection() {
        let (mut store, mut host) = setup();
        let mut manager = BackupRestoreManager::new(&mut store, &mut host);
        assert!(manager.restore_backup_string(r#"[{"id": 2, "type": "WIDGET"}, {"id": 7, "type": "SHORTCUT"}]"#, Surface::Frame));

        let ids: Vec<i32> = store.widgets(Surface::Frame).iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2, 7]);
        // Grid is untouched by legacy restores
        assert_eq!(store.prefs.frame_col_count, 3);
        // Only the dropped id is released
        assert!(!host.contains(1));
        assert!(host.contains(2));
    }

    #[test]
    fn test_unparseable_counts_are_skipped() {
        let (mut store, mut host) = setup();
        let text = r#"{"current_widgets": "[]", "frame_row_count": "many", "frame_col_count": "5"}"#;
        let mut manager = BackupRestoreManager::new(&mut store, &mut host);
        assert!(manager.restore_backup_string(text, Surface::Frame));

        assert!(store.widgets(Surface::Frame).is_empty());
        assert_eq!(store.prefs.frame_row_count, 2);
        assert_eq!(store.prefs.frame_col_count, 5);
    }

    #[test]
    fn test_drawer_restore_sets_drawer_columns() {
        let (mut store, mut host) = setup();
        let text = r#"{"current_widgets": "[{\"id\": 4}]", "frame_row_count": "9", "frame_col_count": "4"}"#;
        let mut manager = BackupRestoreManager::new(&mut store, &mut host);
        assert!(manager.restore_backup_string(text, Surface::Drawer));

        assert_eq!(store.widgets(Surface::Drawer)[0].id, 4);
        assert_eq!(store.prefs.drawer_col_count, 4);
        assert_eq!(store.prefs.frame_row_count, 2);
        // Frame widgets keep their ids bound
        assert!(host.contains(1));
    }

    #[test]
    fn test_partial_size_backup_restores() {
        let (mut store, mut host) = setup();
        let mut manager = BackupRestoreManager::new(&mut store, &mut host);
        assert!(manager.restore_backup_string(r#"[{"id":3,"size":{"widgetWidthSpan":2}}]"#, Surface::Frame));

        let size = store.widgets(Surface::Frame)[0].safe_size();
        assert_eq!((size.safe_width_span(), size.safe_height_span()), (2, 1));
    }

    #[test]
    fn test_secondary_frames_are_skipped() {
        let (mut store, mut host) = setup();
        let text = r#"{"current_widgets": "[{\"id\": 1}]", "frame_col_count": "4",
            "secondaryFramesNewest": "[5]", "frameWidgetsMapNew": "{}"}"#;
        let mut manager = BackupRestoreManager::new(&mut store, &mut host);
        assert!(manager.restore_backup_string(text, Surface::Frame));

        assert_eq!(store.widgets(Surface::Frame).len(), 1);
        assert_eq!(store.prefs.frame_col_count, 4);
    }
}
