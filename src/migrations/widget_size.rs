//! Move sizes from the legacy per-id map onto each record

use super::{stored_widgets, Migration};
use crate::error::Result;
use crate::host::WidgetHost;
use crate::store::{PrefStore, Surface};
use crate::widgets::WidgetSize;

pub struct WidgetSizeMigration;

impl Migration for WidgetSizeMigration {
    fn name(&self) -> &'static str {
        "widget_size"
    }

    fn run_on_or_below_version(&self) -> i32 {
        2
    }

    fn run(&self, store: &mut PrefStore, _host: &dyn WidgetHost) -> Result<()> {
        for surface in [Surface::Frame, Surface::Drawer] {
            let Some(mut widgets) = stored_widgets(store, surface, self.name()) else {
                continue;
            };
            let mut filled = 0;
            for widget in widgets.iter_mut().filter(|w| w.size.is_none()) {
                // The legacy map only ever held frame widgets
                let legacy = match surface {
                    Surface::Frame => store.prefs.widget_sizes.get(&widget.id).copied(),
                    Surface::Drawer => None,
                };
                widget.size = Some(legacy.unwrap_or_default());
                filled += 1;
            }

            tracing::debug!(?surface, filled, "Backfilled widget sizes");
            store.set_widgets(surface, &widgets)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SnapshotHost;
    use crate::widgets::{WidgetRecord, WidgetType};

    #[test]
    fn test_backfills_from_legacy_map_or_default() {
        let mut store = PrefStore::default();
        store.prefs.widget_sizes.insert(1, WidgetSize::new(3, 2));
        let mut sized = WidgetRecord::new(3, WidgetType::Widget);
        sized.size = Some(WidgetSize::new(2, 2));
        store
            .set_widgets(
                Surface::Frame,
                &[
                    WidgetRecord::new(1, WidgetType::Widget),
                    WidgetRecord::new(2, WidgetType::Shortcut),
                    sized,
                ],
            )
            .unwrap();

        WidgetSizeMigration.run(&mut store, &SnapshotHost::default()).unwrap();

        let widgets = store.widgets(Surface::Frame);
        assert_eq!(widgets[0].size, Some(WidgetSize::new(3, 2)));
        assert_eq!(widgets[1].size, Some(WidgetSize::new(1, 1)));
        // Sizes already on a record win over the legacy map
        assert_eq!(widgets[2].size, Some(WidgetSize::new(2, 2)));
    }

    #[test]
    fn test_drawer_defaults_to_one_by_one() {
        let mut store = PrefStore::default();
        store.prefs.widget_sizes.insert(1, WidgetSize::new(3, 2));
        store
            .set_widgets(Surface::Drawer, &[WidgetRecord::new(1, WidgetType::Widget)])
            .unwrap();

        WidgetSizeMigration.run(&mut store, &SnapshotHost::default()).unwrap();
        assert_eq!(store.widgets(Surface::Drawer)[0].size, Some(WidgetSize::new(1, 1)));
    }
}
