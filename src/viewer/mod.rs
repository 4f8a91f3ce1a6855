//! Disk viewer - the public page-access façade.
//!
//! # Components
//! - [`DiskViewer`] - Cached reads, page creation, ordered shutdown
//! - [`ViewerStats`] - Performance statistics

mod disk_viewer;
mod stats;

pub use disk_viewer::DiskViewer;
pub use stats::{StatsSnapshot, ViewerStats};
