//! Configuration for the page-access layer.
//!
//! There is a single tunable that callers normally touch, the cache
//! capacity. The page size is carried here too so that the host query
//! happens once, up front, and is then threaded explicitly into the
//! [`Pager`](crate::storage::Pager).
//!
//! Environment overrides (see [`Config::from_env`]):
//! - `DISKVIEW_MAX_CAPACITY` - number of mapped pages kept by the cache
//! - `DISKVIEW_PAGE_SIZE` - page size in bytes

use std::sync::OnceLock;

/// Capacity used when none (or zero) is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Page size assumed on hosts where it cannot be queried.
pub const FALLBACK_PAGE_SIZE: usize = 4096;

/// Environment variable overriding [`Config::max_capacity`].
pub const ENV_MAX_CAPACITY: &str = "DISKVIEW_MAX_CAPACITY";

/// Environment variable overriding [`Config::page_size`].
pub const ENV_PAGE_SIZE: &str = "DISKVIEW_PAGE_SIZE";

/// Native memory page size of the host, queried once per process.
///
/// # Example
/// ```
/// let size = diskview::native_page_size();
/// assert!(size.is_power_of_two());
/// ```
pub fn native_page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(query_page_size)
}

#[cfg(unix)]
fn query_page_size() -> usize {
    // SAFETY: sysconf has no preconditions; it returns -1 on failure.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

#[cfg(not(unix))]
fn query_page_size() -> usize {
    FALLBACK_PAGE_SIZE
}

/// Configuration options for a [`DiskViewer`](crate::DiskViewer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of pages kept mapped by the LRU cache.
    /// Zero means "use the default" ([`DEFAULT_CAPACITY`]).
    pub max_capacity: usize,

    /// Size of a page in bytes. Defaults to the native page size.
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_CAPACITY,
            page_size: native_page_size(),
        }
    }
}

impl Config {
    /// Default configuration with environment overrides applied.
    ///
    /// Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var(ENV_MAX_CAPACITY) {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_capacity = n;
            }
        }

        if let Ok(v) = std::env::var(ENV_PAGE_SIZE) {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.page_size = n;
            }
        }

        cfg
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Cache capacity with the zero-means-default rule applied.
    #[inline]
    pub fn capacity(&self) -> usize {
        effective_capacity(self.max_capacity)
    }
}

/// Maps an unset (zero) capacity to [`DEFAULT_CAPACITY`].
#[inline]
pub(crate) fn effective_capacity(capacity: usize) -> usize {
    if capacity == 0 {
        DEFAULT_CAPACITY
    } else {
        capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_page_size_is_power_of_two() {
        let size = native_page_size();
        assert!(size.is_power_of_two());
        assert!(size >= 512);
        // Stable across calls.
        assert_eq!(size, native_page_size());
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.max_capacity, 10);
        assert_eq!(cfg.page_size, native_page_size());
    }

    #[test]
    fn test_zero_capacity_defaults() {
        let cfg = Config::default().with_max_capacity(0);
        assert_eq!(cfg.capacity(), DEFAULT_CAPACITY);

        let cfg = Config::default().with_max_capacity(3);
        assert_eq!(cfg.capacity(), 3);
    }

    #[test]
    fn test_builder() {
        let cfg = Config::default().with_max_capacity(64).with_page_size(8192);
        assert_eq!(cfg.max_capacity, 64);
        assert_eq!(cfg.page_size, 8192);
    }
}
