use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;
use typed_i18n_core::{Args, LanguageTag, RichText};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    generation: u64,
    locale: LanguageTag,
    key: String,
    signature: String,
}

/// Memoizes rendered messages by registry generation, requested locale, key
/// and argument signature. Entries from older generations are dropped as soon
/// as a newer generation is seen; reaching `capacity` empties the cache.
#[derive(Debug)]
pub struct RenderCache {
    entries: DashMap<CacheKey, RichText>,
    capacity: usize,
    generation: AtomicU64,
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            generation: AtomicU64::new(0),
        }
    }

    pub fn get(
        &self,
        generation: u64,
        locale: &LanguageTag,
        key: &str,
        args: &Args,
    ) -> Option<RichText> {
        self.observe(generation);
        let cache_key = CacheKey {
            generation,
            locale: locale.clone(),
            key: key.to_string(),
            signature: args.signature(),
        };
        self.entries.get(&cache_key).map(|entry| entry.value().clone())
    }

    pub fn insert(
        &self,
        generation: u64,
        locale: &LanguageTag,
        key: &str,
        args: &Args,
        value: RichText,
    ) {
        if self.capacity == 0 {
            return;
        }
        self.observe(generation);
        if self.entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "render cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(
            CacheKey {
                generation,
                locale: locale.clone(),
                key: key.to_string(),
                signature: args.signature(),
            },
            value,
        );
    }

    fn observe(&self, generation: u64) {
        let seen = self.generation.fetch_max(generation, Ordering::AcqRel);
        if generation > seen {
            self.entries.retain(|key, _| key.generation >= generation);
            debug!(generation, "registry changed, dropped stale renders");
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
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
}
