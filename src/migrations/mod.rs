//! Versioned migrations of persisted widget state
//!
//! The store keeps a single "database version". On startup every migration
//! whose ceiling is at or above the stored version runs once, in ascending
//! ceiling order, and the stored version is bumped to [`DATABASE_VERSION`].
//! Because only that one number is tracked, every migration must be safe to
//! apply twice.

mod extra_info;
mod frame_dim;
mod widget_size;

pub use extra_info::AddExtraWidgetInfoMigration;
pub use frame_dim::FrameDimAmountMigration;
pub use widget_size::WidgetSizeMigration;

use crate::error::Result;
use crate::host::WidgetHost;
use crate::store::{PrefStore, Surface};
use crate::widgets::{parse_widgets, WidgetRecord};

/// Schema version written by this build
pub const DATABASE_VERSION: i32 = 3;

pub trait Migration {
    fn name(&self) -> &'static str;

    /// Highest stored version this migration still applies to
    fn run_on_or_below_version(&self) -> i32;

    /// Transform the in-memory store; records that cannot be migrated are
    /// logged and left alone
    fn run(&self, store: &mut PrefStore, host: &dyn WidgetHost) -> Result<()>;
}

/// Stored collection for a surface, or `None` if there is nothing a
/// migration may rewrite
///
/// Unreadable text is logged and left in place; writing back an empty
/// collection would erase it.
pub(crate) fn stored_widgets(store: &PrefStore, surface: Surface, migration: &str) -> Option<Vec<WidgetRecord>> {
    let text = store.widgets_string(surface)?;
    match parse_widgets(text) {
        Ok(widgets) => Some(widgets),
        Err(e) => {
            tracing::warn!(?surface, migration, "Skipping unreadable widget collection: {}", e);
            None
        }
    }
}

/// Runs the migration chain against a store
pub struct MigrationManager {
    current_version: i32,
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationManager {
    /// Manager with every built-in migration
    pub fn new(current_version: i32) -> Self {
        let migrations: Vec<Box<dyn Migration>> = vec![
            Box::new(AddExtraWidgetInfoMigration),
            Box::new(WidgetSizeMigration),
            Box::new(FrameDimAmountMigration),
        ];
        Self::with_migrations(current_version, migrations)
    }

    pub fn with_migrations(current_version: i32, mut migrations: Vec<Box<dyn Migration>>) -> Self {
        migrations.sort_by_key(|m| m.run_on_or_below_version());
        Self {
            current_version,
            migrations,
        }
    }

    pub fn current_version(&self) -> i32 {
        self.current_version
    }

    /// Migrations that would run for a store at `stored_version`
    pub fn pending(&self, stored_version: i32) -> impl Iterator<Item = &dyn Migration> {
        let up_to_date = self.current_version <= stored_version;
        self.migrations
            .iter()
            .map(|m| m.as_ref())
            .filter(move |m| !up_to_date && m.run_on_or_below_version() >= stored_version)
    }

    /// Bring the store up to the current version and save it
    ///
    /// Returns `false` when the store was already current.
    pub fn run_migrations(&self, store: &mut PrefStore, host: &dyn WidgetHost) -> Result<bool> {
        let stored_version = store.database_version();

        if self.current_version <= stored_version {
            tracing::debug!(stored_version, "Store is up to date");
            return Ok(false);
        }

        tracing::info!(
            from = stored_version,
            to = self.current_version,
            "Migrating widget store"
        );

        for migration in self.pending(stored_version) {
            tracing::info!(
                name = migration.name(),
                ceiling = migration.run_on_or_below_version(),
                "Running migration"
            );
            if let Err(e) = migration.run(store, host) {
                tracing::warn!(name = migration.name(), "Migration failed: {}", e);
            }
        }

        store.set_database_version(self.current_version);
        store.save()?;
        Ok(true)
    }
}
