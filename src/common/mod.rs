//! Common types and utilities shared across diskview.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration and the host page size
//! - Error types
//! - Identifiers (PageId)

pub mod config;
pub mod error;
mod page_id;

pub use config::{native_page_size, Config};
pub use error::{Error, Result};
pub use page_id::PageId;
