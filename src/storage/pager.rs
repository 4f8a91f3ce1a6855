//! Pager - page-level file I/O for the backing file.
//!
//! The [`Pager`] handles all direct file operations:
//! - Mapping individual pages into memory
//! - Extending the file with zero-filled pages
//! - Tracking the file size and page count

#[cfg(test)]
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use memmap2::MmapOptions;
use parking_lot::{Mutex, MutexGuard};

use crate::common::{Error, PageId, Result};
use crate::storage::MappedPage;

/// Manages page-level access to a single backing file.
///
/// # File Layout
/// The store is a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0     1×PS     2×PS     ...     N×PS
/// ```
///
/// Page N is located at file offset `N × page_size`. A trailing partial
/// page is never counted or mapped.
///
/// # Thread Safety
/// All methods take `&self`. Mapping and page counting need no lock.
/// Appending does: callers hold [`Pager::lock_append`] across "compute
/// offset, write, refresh" so two appenders never target the same offset.
pub struct Pager {
    path: PathBuf,
    file: File,
    page_size: usize,
    /// File length as of the last open/refresh; bounds `get_page`.
    len: AtomicU64,
    /// Serializes appends.
    append: Mutex<()>,
    /// Cap on the bytes handed to a single write call.
    max_write_len: usize,
    #[cfg(test)]
    faults: Mutex<Faults>,
}

/// Scripted I/O failures, consumed in order by the next matching call.
#[cfg(test)]
#[derive(Default)]
struct Faults {
    /// `Ok(n)` caps the next write at `n` bytes; `Err` is returned as is.
    writes: VecDeque<io::Result<usize>>,
    stat: Option<io::Error>,
    refresh: Option<io::Error>,
}

impl Pager {
    /// Open the backing file, creating it if it doesn't exist.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if `page_size` is zero
    /// - `Error::Open` if the file cannot be opened
    /// - `Error::Stat` if the file cannot be stat'ed
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidConfig("page size must be > 0".into()));
        }

        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let len = file
            .metadata()
            .map_err(|source| Error::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        debug!(
            "opened '{}': {} bytes, page size {}",
            path.display(),
            len,
            page_size
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_size,
            len: AtomicU64::new(len),
            append: Mutex::new(()),
            max_write_len: usize::MAX,
            #[cfg(test)]
            faults: Mutex::new(Faults::default()),
        })
    }

    /// Map the page with the given ID.
    ///
    /// Every call creates a fresh, independent mapping; the pager does no
    /// caching or deduplication.
    ///
    /// # Errors
    /// - `Error::PageOutOfRange` if the page lies beyond the end of the file
    /// - `Error::Map` if the OS mapping fails
    pub fn get_page(&self, page_id: PageId) -> Result<MappedPage> {
        let page_count = self.len.load(Ordering::Acquire) / self.page_size as u64;
        if page_id.0 >= page_count {
            return Err(Error::PageOutOfRange {
                page_id,
                page_count,
            });
        }

        let offset = page_id.offset(self.page_size);

        // SAFETY: the range lies inside the file (checked above) and the
        // file only ever grows through this pager. Mutation by another
        // process is outside this layer's contract.
        let map = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(self.page_size)
                .map_mut(&self.file)
        }
        .map_err(|source| Error::Map {
            page_id,
            offset,
            source,
        })?;

        debug!("mapped {} at offset {}", page_id, offset);
        Ok(MappedPage::new(page_id, map))
    }

    /// Number of complete pages, from a live stat of the file.
    ///
    /// Partial pages at the end are not counted.
    ///
    /// # Errors
    /// `Error::Stat` if the file cannot be stat'ed.
    pub fn page_count(&self) -> Result<u64> {
        let len = self.file_len().map_err(|source| Error::Stat {
            path: self.path.clone(),
            source,
        })?;
        Ok(len / self.page_size as u64)
    }

    /// Write `count` zero bytes at `offset`.
    ///
    /// Returns the number of bytes actually written, which may be fewer than
    /// `count`. Callers retry for the remainder.
    pub fn write(&self, count: usize, offset: u64) -> io::Result<usize> {
        let count = match self.scripted_write() {
            Some(Ok(cap)) => count.min(cap),
            Some(Err(e)) => return Err(e),
            None => count,
        };
        if count == 0 {
            return Ok(0);
        }

        let zeros = vec![0u8; count.min(self.max_write_len)];
        write_at(&self.file, &zeros, offset)
    }

    /// Re-stat the file and refresh the cached length.
    pub fn refresh(&self) -> io::Result<()> {
        #[cfg(test)]
        self.injected(|faults| faults.refresh.take())?;

        let len = self.file.metadata()?.len();
        self.len.store(len, Ordering::Release);
        Ok(())
    }

    /// Acquire the append lock.
    ///
    /// Hold the guard across offset computation, the zero-fill writes and
    /// the size refresh.
    pub fn lock_append(&self) -> MutexGuard<'_, ()> {
        self.append.lock()
    }

    /// Size of a page in bytes.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Path of the backing file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cap the bytes handed to a single write call.
    #[cfg(test)]
    pub(crate) fn set_max_write_len(&mut self, max_write_len: usize) {
        self.max_write_len = max_write_len.max(1);
    }

    /// Queue outcomes for the next write calls.
    #[cfg(test)]
    pub(crate) fn script_writes(&self, results: impl IntoIterator<Item = io::Result<usize>>) {
        self.faults.lock().writes.extend(results);
    }

    /// Make the next `page_count` fail with `err`.
    #[cfg(test)]
    pub(crate) fn fail_next_stat(&self, err: io::Error) {
        self.faults.lock().stat = Some(err);
    }

    /// Make the next `refresh` fail with `err`.
    #[cfg(test)]
    pub(crate) fn fail_next_refresh(&self, err: io::Error) {
        self.faults.lock().refresh = Some(err);
    }

    #[cfg(test)]
    fn scripted_write(&self) -> Option<io::Result<usize>> {
        self.faults.lock().writes.pop_front()
    }

    #[cfg(not(test))]
    #[inline]
    fn scripted_write(&self) -> Option<io::Result<usize>> {
        None
    }

    fn file_len(&self) -> io::Result<u64> {
        #[cfg(test)]
        self.injected(|faults| faults.stat.take())?;

        Ok(self.file.metadata()?.len())
    }

    #[cfg(test)]
    fn injected(&self, take: impl FnOnce(&mut Faults) -> Option<io::Error>) -> io::Result<()> {
        let mut faults = self.faults.lock();
        match take(&mut *faults) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close the backing file.
    ///
    /// Every mapping derived from this pager should be released first.
    pub fn close(self) -> Result<()> {
        debug!("closing '{}'", self.path.display());
        drop(self.file);
        Ok(())
    }
}

#[cfg(unix)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.write_at(buf, offset)
}

#[cfg(windows)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_write(buf, offset)
}
