//! Rendered-output cache
//!
//! Memoizes markup by a fingerprint of (content, viewport). Bounded, and
//! evicts strictly in insertion order: re-reading an entry does not
//! refresh it.

use std::collections::{HashMap, VecDeque};

use crate::viewport::ViewportInfo;

/// Default number of cached passes per engine
pub const DEFAULT_MAX_CACHE_SIZE: usize = 100;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001B3;

fn fnv1a_step(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Fingerprint of a highlight request
///
/// FNV-1a over the content and the viewport (or `full`). Not collision
/// resistant; a collision serves stale markup until the next edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(content: &str, viewport: Option<ViewportInfo>) -> Self {
        let hash = fnv1a_step(FNV_OFFSET, content.as_bytes());
        // 0xff never occurs in UTF-8, so it cleanly separates the parts
        let hash = fnv1a_step(hash, &[0xff]);
        let hash = match viewport {
            Some(viewport) => fnv1a_step(hash, viewport.fingerprint().as_bytes()),
            None => fnv1a_step(hash, b"full"),
        };
        Self(hash)
    }
}

/// Bounded FIFO cache of rendered markup
#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert markup, evicting the oldest entry when full
    ///
    /// Replacing an existing key keeps its original insertion slot.
    pub fn put(&mut self, key: CacheKey, value: String) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }
        while self.order.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key);
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_SIZE)
    }
}
