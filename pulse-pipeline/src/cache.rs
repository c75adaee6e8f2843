//! Bounded memo cache for aggregates over identical subsets.

use std::collections::HashMap;

use pulse_stats::Fingerprint;

/// Subset fingerprint plus a request descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subset: u64,
    pub request: String,
}

impl CacheKey {
    pub fn new(subset: u64, request: impl Into<String>) -> Self {
        Self {
            subset,
            request: request.into(),
        }
    }

    /// Single 64-bit digest of both parts.
    pub fn digest(&self) -> u64 {
        let mut fp = Fingerprint::new();
        fp.write_u64(self.subset);
        fp.write_str(&self.request);
        fp.finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Content-addressed cache. When an insert would exceed `capacity` the
/// whole cache is cleared first; entries never go stale because the
/// record store is immutable.
pub struct MemoCache<V> {
    capacity: usize,
    entries: HashMap<CacheKey, V>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> MemoCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        match self.entries.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, value: V) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            log::debug!("memo cache full entries={} clearing", self.entries.len());
            self.entries.clear();
        }
        self.entries.insert(key, value);
    }

    pub fn get_or_insert_with<F>(&mut self, key: CacheKey, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Like `get_or_insert_with`, but errors are returned and not cached.
    pub fn get_or_try_insert_with<F, E>(&mut self, key: CacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            capacity: self.capacity,
        }
    }
}
