//! Rescale the wallpaper dim amount from 0-10 to 0-100

use super::Migration;
use crate::error::Result;
use crate::host::WidgetHost;
use crate::store::PrefStore;

pub struct FrameDimAmountMigration;

impl Migration for FrameDimAmountMigration {
    fn name(&self) -> &'static str {
        "frame_dim_amount"
    }

    fn run_on_or_below_version(&self) -> i32 {
        3
    }

    fn run(&self, store: &mut PrefStore, _host: &dyn WidgetHost) -> Result<()> {
        if store.prefs.dim_amount_scaled {
            return Ok(());
        }

        let old = store.prefs.wallpaper_dim_amount;
        store.prefs.wallpaper_dim_amount = old * 10.0;
        store.prefs.dim_amount_scaled = true;
        tracing::debug!(old, new = store.prefs.wallpaper_dim_amount, "Rescaled dim amount");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SnapshotHost;

    #[test]
    fn test_scales_once() {
        let mut store = PrefStore::default();
        store.prefs.wallpaper_dim_amount = 2.5;

        FrameDimAmountMigration.run(&mut store, &SnapshotHost::default()).unwrap();
        assert_eq!(store.prefs.wallpaper_dim_amount, 25.0);

        FrameDimAmountMigration.run(&mut store, &SnapshotHost::default()).unwrap();
        assert_eq!(store.prefs.wallpaper_dim_amount, 25.0);
    }
}
