//! Page identifier type.

use std::fmt;

/// Identifies a page in the backing file.
///
/// Pages are allocated strictly by append, so ids are dense: the file
/// holds pages `0..page_count` and page `N` starts at `N × page_size`.
///
/// # Example
/// ```
/// use diskview::PageId;
///
/// let page_id = PageId::new(3);
/// assert_eq!(page_id.offset(4096), 12288);
/// assert_eq!(page_id.0, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u64);

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(id: u64) -> Self {
        PageId(id)
    }

    /// Byte offset of this page in a file of `page_size` pages.
    #[inline]
    pub fn offset(&self, page_size: usize) -> u64 {
        self.0 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
    }

    #[test]
    fn test_page_id_offset() {
        assert_eq!(PageId::new(0).offset(4096), 0);
        assert_eq!(PageId::new(5).offset(16384), 5 * 16384);
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(1) < PageId::new(2));
        assert!(PageId::new(5) > PageId::new(3));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
    }
}
