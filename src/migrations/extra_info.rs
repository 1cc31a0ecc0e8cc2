//! Backfill provider, label and icon on widgets saved before those were stored

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{stored_widgets, Migration};
use crate::error::Result;
use crate::host::WidgetHost;
use crate::store::{PrefStore, Surface};
use crate::widgets::{unflatten_component, WidgetRecord, WidgetType};

pub struct AddExtraWidgetInfoMigration;

impl Migration for AddExtraWidgetInfoMigration {
    fn name(&self) -> &'static str {
        "add_extra_widget_info"
    }

    fn run_on_or_below_version(&self) -> i32 {
        1
    }

    fn run(&self, store: &mut PrefStore, host: &dyn WidgetHost) -> Result<()> {
        for surface in [Surface::Frame, Surface::Drawer] {
            let Some(mut widgets) = stored_widgets(store, surface, self.name()) else {
                continue;
            };
            for widget in widgets.iter_mut().filter(|w| w.safe_type() == WidgetType::Widget) {
                migrate_widget(widget, host);
            }
            store.set_widgets(surface, &widgets)?;
        }
        Ok(())
    }
}

fn migrate_widget(widget: &mut WidgetRecord, host: &dyn WidgetHost) {
    let Some(info) = host.widget_info(widget.id) else {
        tracing::info!(id = widget.id, "Unable to migrate widget {:?}: info is null", widget);
        return;
    };

    if widget.widget_provider.is_none() {
        widget.widget_provider = Some(info.provider.clone());
    }

    if widget.package_name.is_none() {
        widget.package_name = unflatten_component(&info.provider).map(|(pkg, _)| pkg);
    }

    if widget.label.is_none() {
        widget.label = Some(info.label);
    }

    if widget.icon.is_none() {
        widget.icon = info.preview_png.map(|png| STANDARD.encode(png));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WidgetInfo;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeHost {
        infos: HashMap<i32, WidgetInfo>,
    }

    impl WidgetHost for FakeHost {
        fn widget_info(&self, id: i32) -> Option<WidgetInfo> {
            self.infos.get(&id).cloned()
        }

        fn delete_widget_id(&mut self, id: i32) {
            self.infos.remove(&id);
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn clock_host() -> FakeHost {
        let mut host = FakeHost::default();
        host.infos.insert(
            1,
            WidgetInfo {
                provider: "com.clock/.ClockWidget".into(),
                label: "Clock".into(),
                preview_png: Some(vec![1, 2, 3]),
            },
        );
        host
    }

    fn store_with(widgets: &[WidgetRecord]) -> PrefStore {
        let mut store = PrefStore::default();
        store.set_widgets(Surface::Frame, widgets).unwrap();
        store
    }

    #[test]
    fn test_fills_missing_label_from_host() {
        let mut store = store_with(&[WidgetRecord::new(1, WidgetType::Widget)]);
        AddExtraWidgetInfoMigration.run(&mut store, &clock_host()).unwrap();

        let widget = &store.widgets(Surface::Frame)[0];
        assert_eq!(widget.label.as_deref(), Some("Clock"));
        assert_eq!(widget.widget_provider.as_deref(), Some("com.clock/.ClockWidget"));
        assert_eq!(widget.package_name.as_deref(), Some("com.clock"));
        assert_eq!(widget.icon.as_deref(), Some("AQID"));
    }

    #[test]
    fn test_keeps_existing_metadata() {
        let mut record = WidgetRecord::new(1, WidgetType::Widget);
        record.label = Some("My clock".into());
        let mut store = store_with(&[record]);
        AddExtraWidgetInfoMigration.run(&mut store, &clock_host()).unwrap();

        let widget = &store.widgets(Surface::Frame)[0];
        assert_eq!(widget.label.as_deref(), Some("My clock"));
        assert!(widget.widget_provider.is_some());
    }

    #[test]
    fn test_unknown_widget_left_alone_and_logged() {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut store = store_with(&[
            WidgetRecord::new(99, WidgetType::Widget),
            WidgetRecord::new(1, WidgetType::Widget),
        ]);
        tracing::subscriber::with_default(subscriber, || {
            AddExtraWidgetInfoMigration.run(&mut store, &clock_host()).unwrap();
        });

        let widgets = store.widgets(Surface::Frame);
        assert!(widgets[0].label.is_none());
        assert!(widgets[0].widget_provider.is_none());
        // Later records still migrate
        assert_eq!(widgets[1].label.as_deref(), Some("Clock"));

        let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Unable to migrate widget"));
    }

    #[test]
    fn test_non_widgets_untouched() {
        let mut store = store_with(&[WidgetRecord::new(1, WidgetType::Shortcut)]);
        AddExtraWidgetInfoMigration.run(&mut store, &clock_host()).unwrap();
        assert!(store.widgets(Surface::Frame)[0].label.is_none());
    }

    #[test]
    fn test_drawer_widgets_migrated() {
        let mut store = PrefStore::default();
        store
            .set_widgets(Surface::Drawer, &[WidgetRecord::new(1, WidgetType::Widget)])
            .unwrap();
        AddExtraWidgetInfoMigration.run(&mut store, &clock_host()).unwrap();

        assert_eq!(store.widgets(Surface::Drawer)[0].label.as_deref(), Some("Clock"));
        assert!(store.widgets_string(Surface::Frame).is_none());
    }
}
