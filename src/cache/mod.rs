//! Page cache - bounds the number of live mappings.
//!
//! The cache sits between the viewer and the pager. It keeps recently used
//! pages mapped so repeat reads skip the `mmap` round-trip.
//!
//! # Components
//! - [`LruCache`] - Strict LRU over an index arena with sentinel slots
//! - [`Release`] - How the cache gives up a value it owns

use std::io;

mod lru;

pub use lru::LruCache;

/// A value the cache owns and must hand back explicitly.
///
/// Called exactly once per value, on eviction or when the cache closes.
/// Failures are reported to the caller of the operation that triggered the
/// release but never stop the cache from finishing that operation.
pub trait Release {
    fn release(self) -> io::Result<()>;
}
