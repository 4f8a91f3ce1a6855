//! LRU (Least Recently Used) cache of mapped pages.
//!
//! The recency list is a doubly linked list stored in an index arena.
//! Slots 0 and 1 are the head and tail sentinels; they never hold data,
//! so linking and unlinking are plain index rewiring with no edge cases.
//!
//! ```text
//!   HEAD ⇄ [MRU] ⇄ ... ⇄ [LRU] ⇄ TAIL
//!    0                           1
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::cache::Release;
use crate::common::config::effective_capacity;
use crate::common::{Error, PageId, Result};

const HEAD: usize = 0;
const TAIL: usize = 1;

/// One slot in the arena.
struct Node<V> {
    page_id: PageId,
    /// `None` for the sentinels and for recycled slots.
    value: Option<V>,
    prev: usize,
    next: usize,
}

impl<V> Node<V> {
    fn sentinel() -> Self {
        Self {
            page_id: PageId::new(u64::MAX),
            value: None,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// State guarded by the cache mutex.
struct Inner<V> {
    /// Maps page IDs to arena slots.
    lookup: HashMap<PageId, usize>,
    nodes: Vec<Node<V>>,
    /// Slots freed by eviction, reused before the arena grows.
    free: Vec<usize>,
    closed: bool,
}

impl<V> Inner<V> {
    fn new(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 2);
        nodes.push(Node::sentinel());
        nodes.push(Node::sentinel());

        Self {
            lookup: HashMap::with_capacity(capacity),
            nodes,
            free: Vec::new(),
            closed: false,
        }
    }

    /// Detach a slot from the list.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    /// Link a slot right after the head sentinel.
    fn push_front(&mut self, idx: usize) {
        let first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = first;
        self.nodes[first].prev = idx;
        self.nodes[HEAD].next = idx;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.nodes[HEAD].next == idx {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    /// Detach the least recently used slot, if any.
    fn pop_back(&mut self) -> Option<usize> {
        let last = self.nodes[TAIL].prev;
        if last == HEAD {
            return None;
        }
        self.unlink(last);
        Some(last)
    }

    fn alloc(&mut self, page_id: PageId, value: V) -> usize {
        let node = Node {
            page_id,
            value: Some(value),
            prev: HEAD,
            next: TAIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }
}

/// A thread-safe, fixed-capacity LRU cache keyed by page ID.
///
/// # Ownership
/// Once inserted, a value belongs to the cache; the cache releases it on
/// eviction and on [`LruCache::close`]. [`LruCache::get`] hands out clones,
/// which for [`PageRef`](crate::PageRef) means another reference to the
/// same mapping rather than a second mapping.
///
/// # Thread Safety
/// Lookup map and recency list sit behind one `Mutex`; every public
/// operation holds it for its full duration.
pub struct LruCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    evictions: AtomicU64,
}

impl<V: Clone + Release> LruCache<V> {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of 0 falls back to the default of 10.
    pub fn new(capacity: usize) -> Self {
        let capacity = effective_capacity(capacity);
        Self {
            inner: Mutex::new(Inner::new(capacity)),
            capacity,
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a page, marking it most recently used on a hit.
    ///
    /// Returns `None` on a miss (and always once the cache is closed).
    pub fn get(&self, page_id: PageId) -> Option<V> {
        let mut inner = self.inner.lock();
        let idx = *inner.lookup.get(&page_id)?;
        inner.move_to_front(idx);
        trace!("cache hit {}", page_id);
        inner.nodes[idx].value.clone()
    }

    /// Look up a page, loading and inserting it on a miss.
    ///
    /// The lookup, `load` and the insert all run under the cache lock, so
    /// concurrent misses on the same page call `load` once and share the
    /// value it produced. Returns the value and whether it was a hit.
    ///
    /// `load` runs with the lock held; it must not touch this cache.
    ///
    /// # Errors
    /// - whatever `load` returns; the cache is left untouched
    /// - `Error::Release` if making room evicted a value that failed to
    ///   release (the loaded value is cached regardless)
    /// - `Error::Closed` if the cache was closed; `load` is not called
    pub fn get_or_insert_with<F>(&self, page_id: PageId, load: F) -> Result<(V, bool)>
    where
        F: FnOnce() -> Result<V>,
    {
        let mut inner = self.inner.lock();
        let existing = inner.lookup.get(&page_id).copied();
        if let Some(idx) = existing {
            if let Some(value) = inner.nodes[idx].value.clone() {
                inner.move_to_front(idx);
                trace!("cache hit {}", page_id);
                return Ok((value, true));
            }
        }
        if inner.closed {
            return Err(Error::Closed);
        }

        let value = load()?;
        self.insert(&mut inner, page_id, value.clone())?;
        Ok((value, false))
    }

    /// Insert or update the entry for `page_id`.
    ///
    /// An existing entry has its value replaced and is promoted. The replaced
    /// value is dropped, not released; callers must have released it already.
    ///
    /// A new entry on a full cache first evicts the least recently used one.
    /// The new entry is inserted even if releasing the victim fails; that
    /// failure is then returned.
    ///
    /// # Errors
    /// - `Error::Release` if the evicted value failed to release
    /// - `Error::Closed` if the cache was closed
    pub fn set(&self, page_id: PageId, value: V) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(Error::Closed);
        }
        self.insert(&mut inner, page_id, value)
    }

    /// Release every held value and empty the cache.
    ///
    /// Keeps going past individual release failures and returns the first
    /// one. Afterwards `get` always misses and `set` returns
    /// `Error::Closed`. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.closed = true;

        let mut first_err = None;
        let mut held = 0usize;
        while let Some(idx) = inner.pop_back() {
            let page_id = inner.nodes[idx].page_id;
            if let Some(value) = inner.nodes[idx].value.take() {
                held += 1;
                if let Err(source) = value.release() {
                    if first_err.is_none() {
                        first_err = Some(Error::Release { page_id, source });
                    }
                }
            }
        }

        inner.lookup.clear();
        inner.free.clear();
        inner.nodes.truncate(2);
        inner.nodes[HEAD].next = TAIL;
        inner.nodes[TAIL].prev = HEAD;
        debug!("cache closed, released {} page(s)", held);

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Replace-or-insert with the lock already held.
    fn insert(&self, inner: &mut Inner<V>, page_id: PageId, value: V) -> Result<()> {
        let existing = inner.lookup.get(&page_id).copied();
        if let Some(idx) = existing {
            inner.nodes[idx].value = Some(value);
            inner.move_to_front(idx);
            return Ok(());
        }

        let mut result = Ok(());
        if inner.lookup.len() >= self.capacity {
            if let Some(idx) = inner.pop_back() {
                let victim = inner.nodes[idx].page_id;
                inner.lookup.remove(&victim);
                let evicted = inner.nodes[idx].value.take();
                inner.free.push(idx);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("evicting {} to make room for {}", victim, page_id);

                if let Some(evicted) = evicted {
                    if let Err(source) = evicted.release() {
                        result = Err(Error::Release {
                            page_id: victim,
                            source,
                        });
                    }
                }
            }
        }

        let idx = inner.alloc(page_id, value);
        inner.push_front(idx);
        inner.lookup.insert(page_id, idx);
        result
    }
}

impl<V> LruCache<V> {
    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `page_id` is cached. Does not affect recency.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.inner.lock().lookup.contains_key(&page_id)
    }

    /// Cached page IDs, most recently used first.
    pub fn page_ids(&self) -> Vec<PageId> {
        let inner = self.inner.lock();
        let mut ids = Vec::with_capacity(inner.lookup.len());
        let mut idx = inner.nodes[HEAD].next;
        while idx != TAIL {
            ids.push(inner.nodes[idx].page_id);
            idx = inner.nodes[idx].next;
        }
        ids
    }

    /// Number of evictions performed so far.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}
