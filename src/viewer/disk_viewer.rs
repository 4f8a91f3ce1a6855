//! Disk Viewer - the page-access façade.
//!
//! The [`DiskViewer`] provides:
//! - Cached page reads (cache first, pager on a miss)
//! - Append-only page creation with partial-write retry
//! - Ordered shutdown (cache before file)

use std::io;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::{debug, warn};

use crate::cache::LruCache;
use crate::common::{Config, Error, PageId, Result};
use crate::storage::{PageRef, Pager};
use crate::viewer::{StatsSnapshot, ViewerStats};

/// A page-based view of a disk file with an LRU cache of mappings.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │                     DiskViewer                       │
/// │  read(id) ──▶ ┌────────────┐  miss  ┌────────────┐   │
/// │               │  LruCache  │ ─────▶ │   Pager    │   │
/// │  create() ──────────────────────▶   │  (file)    │   │
/// │               └────────────┘ ◀───── └────────────┘   │
/// │                       insert mapping                 │
/// └──────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// `DiskViewer` is `Send + Sync`; share it behind an `Arc`.
///
/// Internal locks protect:
/// - Cache consistency (LRU order, eviction, lookup map)
/// - File growth (offset computation, writes and size refresh)
///
/// They do NOT provide:
/// - Transaction isolation
/// - Atomic multi-page operations
/// - Ordering between writers of the same page
///
/// # Handles
/// [`DiskViewer::read`] returns a [`PageRef`]. Eviction drops only the
/// cache's reference, so a handle stays valid until the caller drops it,
/// even if its page has since been evicted.
///
/// # Usage
/// ```no_run
/// use diskview::{Config, DiskViewer};
///
/// let viewer = DiskViewer::open("store.data", Config::default())?;
/// let id = viewer.create()?;
///
/// let page = viewer.read(id)?;
/// page.write_at(0, b"hello");
/// drop(page);
///
/// viewer.close()?;
/// # Ok::<(), diskview::Error>(())
/// ```
pub struct DiskViewer {
    cache: LruCache<PageRef>,
    pager: Pager,
    stats: ViewerStats,
}

impl DiskViewer {
    /// Open a viewer over `path`, creating the file if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the pager cannot be constructed.
    pub fn open<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let cache = LruCache::new(config.capacity());
        let pager = Pager::open(path, config.page_size)?;

        debug!(
            "disk viewer over '{}' (capacity {}, page size {})",
            pager.path().display(),
            cache.capacity(),
            pager.page_size()
        );

        Ok(Self {
            cache,
            pager,
            stats: ViewerStats::new(),
        })
    }

    // ========================================================================
    // Public API
    // ========================================================================

    /// Fetch the page with the given ID.
    ///
    /// Served from the cache when possible. On a miss the page is mapped by
    /// the pager and inserted into the cache. Lookup, mapping and insert
    /// happen under the cache lock, so concurrent misses on one page share
    /// a single mapping.
    ///
    /// # Errors
    /// - `Error::PageOutOfRange` / `Error::Map` if the page cannot be mapped
    /// - `Error::Release` if making room evicted a page whose release failed
    ///   (the requested page is cached regardless)
    /// - `Error::Closed` if the viewer's cache has been closed
    pub fn read(&self, page_id: PageId) -> Result<PageRef> {
        let (page, hit) = self.cache.get_or_insert_with(page_id, || {
            self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
            self.map_page(page_id)
        })?;

        if hit {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(page)
    }

    /// Append a zero-filled page and return its ID.
    ///
    /// The new ID is the page count before the call. The page is written in
    /// full (partial writes are retried) before the size metadata is
    /// refreshed. The cache is then warmed with the new page; a failure there
    /// is logged and otherwise ignored, since the page is already on disk.
    ///
    /// # Errors
    /// - `Error::Stat` if the file cannot be stat'ed
    /// - `Error::Write` with the failing offset if a write fails
    /// - `Error::Refresh` if the size refresh fails
    pub fn create(&self) -> Result<PageId> {
        let page_size = self.pager.page_size();

        let page_id = {
            let _append = self.pager.lock_append();

            let page_id = PageId::new(self.pager.page_count()?);
            let mut offset = page_id.offset(page_size);
            let mut remaining = page_size;

            while remaining > 0 {
                match self.pager.write(remaining, offset) {
                    Ok(0) => {
                        return Err(Error::Write {
                            offset,
                            source: io::Error::new(
                                io::ErrorKind::WriteZero,
                                "failed to write whole page",
                            ),
                        });
                    }
                    Ok(n) => {
                        remaining -= n;
                        offset += n as u64;
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(source) => return Err(Error::Write { offset, source }),
                }
            }

            self.pager
                .refresh()
                .map_err(|source| Error::Refresh { source })?;
            page_id
        };

        self.stats.pages_created.fetch_add(1, Ordering::Relaxed);
        debug!("created {}", page_id);

        self.prewarm(page_id);
        Ok(page_id)
    }

    /// Release all cached mappings, then close the backing file.
    ///
    /// Both steps always run; the first error is returned.
    pub fn close(self) -> Result<()> {
        debug!("closing disk viewer ({})", self.stats());

        let cache_result = self.cache.close();
        if let Err(e) = &cache_result {
            warn!("cache close failed: {}", e);
        }

        let pager_result = self.pager.close();
        cache_result.and(pager_result)
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get viewer statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.cache.evictions())
    }

    /// Number of complete pages in the backing file.
    pub fn page_count(&self) -> Result<u64> {
        self.pager.page_count()
    }

    /// Size of a page in bytes.
    pub fn page_size(&self) -> usize {
        self.pager.page_size()
    }

    /// Number of pages currently held by the cache.
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    /// Maximum number of pages the cache holds.
    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Whether `page_id` is currently cached. Does not affect recency.
    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.cache.contains(page_id)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Map a page for insertion into the cache.
    fn map_page(&self, page_id: PageId) -> Result<PageRef> {
        let page = Arc::new(self.pager.get_page(page_id)?);
        self.stats.pages_mapped.fetch_add(1, Ordering::Relaxed);
        Ok(page)
    }

    /// Best-effort: map a freshly created page into the cache.
    fn prewarm(&self, page_id: PageId) {
        let loaded = self
            .cache
            .get_or_insert_with(page_id, || self.map_page(page_id));
        if let Err(e) = loaded {
            self.stats.prewarm_failures.fetch_add(1, Ordering::Relaxed);
            warn!("pre-warm of {} failed: {}", page_id, e);
        }
    }
}
