//! Error types for diskview.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the page-access layer.
///
/// Variants fall into five groups:
/// - construction: [`Error::Open`], [`Error::InvalidConfig`]
/// - file size: [`Error::Stat`]
/// - mapping: [`Error::PageOutOfRange`], [`Error::Map`]
/// - extension: [`Error::Write`]
/// - metadata: [`Error::Refresh`]
/// - release: [`Error::Release`]
///
/// Release errors are reported but never stop a bulk cleanup.
#[derive(Debug, Error)]
pub enum Error {
    /// The backing file could not be opened or created.
    #[error("failed to open backing file '{}': {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing file could not be stat'ed.
    #[error("failed to stat backing file '{}': {}", .path.display(), .source)]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic I/O error from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested page lies beyond the end of the file.
    #[error("{page_id} is out of range (file holds {page_count} pages)")]
    PageOutOfRange { page_id: PageId, page_count: u64 },

    /// The OS refused to map a page.
    #[error("failed to map {page_id} at offset {offset}: {source}")]
    Map {
        page_id: PageId,
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// A zero-fill write failed while extending the file.
    #[error("failed to write page at offset {offset}: {source}")]
    Write {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Stat after extending the file failed.
    #[error("failed to refresh file info: {source}")]
    Refresh {
        #[source]
        source: io::Error,
    },

    /// Releasing a cached region failed during eviction or close.
    #[error("failed to unmap {page_id}: {source}")]
    Release {
        page_id: PageId,
        #[source]
        source: io::Error,
    },

    /// Configuration values that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cache was closed and can no longer be used.
    #[error("cache is closed")]
    Closed,
}
