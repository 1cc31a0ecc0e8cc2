//! Lock screen widgets core
//!
//! Platform-independent pieces of the lock screen widget frame and drawer:
//! - Resize handle gestures turned into discrete grid steps
//! - The persisted widget store and its versioned migrations
//! - Backup and restore of widget collections
//!
//! The live widget host is reached through the [`host::WidgetHost`] trait.

pub mod backup;
pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod migrations;
pub mod store;
pub mod widgets;

pub use error::{Error, Result};
