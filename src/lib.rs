//! diskview - the page-access layer of a single-file persistent store.
//!
//! Fixed-size pages of a backing file are exposed as memory mappings, and
//! recently used mappings are kept in an LRU cache so repeat reads skip the
//! map/unmap round-trip.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          diskview                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              DiskViewer (viewer/)                        │   │
//! │  │           read(id) · create() · close()                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓ fast path            ↓ slow path              │
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐   │
//! │  │     Cache (cache/)       │  │    Storage (storage/)     │   │
//! │  │  LruCache<PageRef>       │  │  Pager + MappedPage       │   │
//! │  │  arena + sentinels       │  │  mmap · append · stat     │   │
//! │  └──────────────────────────┘  └──────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, Config)
//! - [`cache`] - The LRU cache of mapped pages
//! - [`storage`] - The backing file and its mappings
//! - [`viewer`] - The façade combining both
//!
//! Transactions, page layouts and free-space management belong to the
//! layers above; this crate serves raw page bytes.
//!
//! # Quick Start
//! ```no_run
//! use diskview::{Config, DiskViewer, PageId};
//!
//! let viewer = DiskViewer::open("my_store.data", Config::default().with_max_capacity(64))?;
//!
//! let page_id = viewer.create()?;
//! assert_eq!(page_id, PageId::new(0));
//!
//! let page = viewer.read(page_id)?;
//! page.write_at(0, b"header");
//! # Ok::<(), diskview::Error>(())
//! ```

pub mod cache;
pub mod common;
pub mod storage;
pub mod viewer;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_CAPACITY, native_page_size};
pub use common::{Config, Error, PageId, Result};

pub use cache::{LruCache, Release};
pub use storage::{MappedPage, PageRef, Pager};
pub use viewer::{DiskViewer, StatsSnapshot, ViewerStats};
