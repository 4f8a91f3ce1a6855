//! Storage layer - the backing file and its mapped pages.
//!
//! This module handles persistent storage:
//! - [`Pager`] - Page-level file I/O and size bookkeeping
//! - [`MappedPage`] - A live memory view of one page

mod mapped_page;
mod pager;

pub use mapped_page::{MappedPage, PageReadGuard, PageRef, PageWriteGuard};
pub use pager::Pager;
