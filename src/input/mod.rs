//! Input handling for widgets in edit mode
//!
//! This module provides:
//! - Resize handle drag interpretation (discrete grid steps)
//! - Applying resize steps to a widget's span

mod resize;

pub use resize::*;
