//! Mapped pages - live, file-backed views of a single page.
//!
//! A [`MappedPage`] owns one read-write shared mapping of exactly one page.
//! Writes through it are writes to the backing file; nothing is flushed or
//! synced by this layer.
//!
//! Callers never hold a `MappedPage` directly. They get a [`PageRef`]
//! (`Arc<MappedPage>`) from the viewer, while the cache keeps its own
//! reference. Eviction only drops the cache's reference, so a handle stays
//! valid for as long as the caller keeps it; the mapping is torn down when
//! the last reference goes away.

use std::io;
use std::sync::Arc;

use log::debug;
use memmap2::MmapMut;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cache::Release;
use crate::common::PageId;

/// Shared handle to a mapped page.
pub type PageRef = Arc<MappedPage>;

/// One page of the backing file, mapped into memory.
///
/// # Thread Safety
/// The bytes are guarded by an `RwLock` scoped to *this mapping*. It keeps
/// Rust-level access sound but is not page-level isolation: a page that was
/// evicted and mapped again while an old handle is still alive is reachable
/// through two independent mappings, and nothing orders writes between them.
/// Coordinating page contents is left to the layer above.
pub struct MappedPage {
    page_id: PageId,
    len: usize,
    map: RwLock<MmapMut>,
}

impl MappedPage {
    pub(crate) fn new(page_id: PageId, map: MmapMut) -> Self {
        Self {
            page_id,
            len: map.len(),
            map: RwLock::new(map),
        }
    }

    /// Which page this mapping views.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Size of the mapping in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared access to the page bytes.
    #[inline]
    pub fn read(&self) -> PageReadGuard<'_> {
        PageReadGuard {
            lock: self.map.read(),
        }
    }

    /// Exclusive access to the page bytes (exclusive within this mapping).
    #[inline]
    pub fn write(&self) -> PageWriteGuard<'_> {
        PageWriteGuard {
            lock: self.map.write(),
        }
    }

    /// Copy bytes out of the page starting at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + buf.len()` runs past the end of the page.
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) {
        let data = self.read();
        buf.copy_from_slice(&data[offset..offset + buf.len()]);
    }

    /// Copy `data` into the page starting at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + data.len()` runs past the end of the page.
    pub fn write_at(&self, offset: usize, data: &[u8]) {
        let mut page = self.write();
        page[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Tear down the mapping.
    ///
    /// memmap2 unmaps on drop and does not surface `munmap` failures, so
    /// this cannot fail in practice; the signature matches [`Release`].
    fn unmap(self) -> io::Result<()> {
        debug!("unmapping {}", self.page_id);
        drop(self.map.into_inner());
        Ok(())
    }
}

impl std::fmt::Debug for MappedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedPage")
            .field("page_id", &self.page_id)
            .field("len", &self.len)
            .finish()
    }
}

impl Release for PageRef {
    /// Drop one owner's claim on the mapping.
    ///
    /// When this was the last reference the mapping is unmapped now.
    /// Otherwise a caller still holds a handle and the unmap happens when
    /// that handle is dropped.
    fn release(self) -> io::Result<()> {
        match Arc::try_unwrap(self) {
            Ok(page) => page.unmap(),
            Err(shared) => {
                debug!(
                    "deferring unmap of {}: {} handle(s) still live",
                    shared.page_id(),
                    Arc::strong_count(&shared) - 1
                );
                Ok(())
            }
        }
    }
}

/// Read guard over a page's bytes. Derefs to `[u8]`.
pub struct PageReadGuard<'a> {
    lock: RwLockReadGuard<'a, MmapMut>,
}

impl std::ops::Deref for PageReadGuard<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.lock
    }
}

/// Write guard over a page's bytes. Derefs to `[u8]` mutably.
pub struct PageWriteGuard<'a> {
    lock: RwLockWriteGuard<'a, MmapMut>,
}

impl std::ops::Deref for PageWriteGuard<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.lock
    }
}

impl std::ops::DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anon_page(id: u64, len: usize) -> PageRef {
        let map = MmapMut::map_anon(len).unwrap();
        Arc::new(MappedPage::new(PageId::new(id), map))
    }

    #[test]
    fn test_read_write_at() {
        let page = anon_page(0, 4096);
        assert_eq!(page.len(), 4096);

        page.write_at(100, b"hello");

        let mut buf = [0u8; 5];
        page.read_at(100, &mut buf);
        assert_eq!(&buf, b"hello");
        assert_eq!(page.read()[99], 0);
    }

    #[test]
    fn test_guards_deref() {
        let page = anon_page(3, 4096);
        {
            let mut guard = page.write();
            guard[0] = 0xAB;
            guard[4095] = 0xCD;
        }
        let guard = page.read();
        assert_eq!(guard[0], 0xAB);
        assert_eq!(guard[4095], 0xCD);
    }

    #[test]
    fn test_release_sole_owner() {
        let page = anon_page(1, 4096);
        assert!(page.release().is_ok());
    }

    #[test]
    fn test_release_keeps_shared_handle_valid() {
        let page = anon_page(2, 4096);
        let handle = Arc::clone(&page);

        // The cache lets go first; the caller's handle must stay usable.
        page.release().unwrap();
        handle.write_at(0, &[7, 7, 7]);

        let mut buf = [0u8; 3];
        handle.read_at(0, &mut buf);
        assert_eq!(buf, [7, 7, 7]);
        assert_eq!(Arc::strong_count(&handle), 1);
    }

    #[test]
    #[should_panic]
    fn test_write_past_end_panics() {
        let page = anon_page(0, 4096);
        page.write_at(4094, &[1, 2, 3]);
    }
}
