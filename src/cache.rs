//! In-memory cache of rendered feeds.
//!
//! Entries are immutable `Arc<str>` values, so a hit hands out a cheap clone
//! and nothing rendered is ever mutated after insertion. Each entry expires
//! after a fixed time-to-live; an expired entry counts as a miss and is
//! dropped on lookup.

use chrono::NaiveDate;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::feed::FeedFormat;
use crate::specifier::ArchiveCategorySpec;

/// Identity of a rendered feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub spec: ArchiveCategorySpec,
    pub format: FeedFormat,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

struct CachedFeed {
    stored_at: Instant,
    rendered: Arc<str>,
}

type Entries = LruCache<CacheKey, CachedFeed>;

/// Bounded LRU of rendered feed text.
///
/// A capacity of 0 or a zero time-to-live disables caching.
pub struct FeedCache {
    inner: Option<Mutex<Entries>>,
    ttl: Duration,
}

impl FeedCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let inner = NonZeroUsize::new(capacity)
            .filter(|_| !ttl.is_zero())
            .map(|cap| Mutex::new(LruCache::new(cap)));
        Self { inner, ttl }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<str>> {
        let mut entries = lock(self.inner.as_ref()?);
        let expired = entries.get(key)?.stored_at.elapsed() >= self.ttl;
        if expired {
            tracing::debug!(format = %key.format, "Cached feed expired");
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| Arc::clone(&entry.rendered))
    }

    pub fn insert(&self, key: CacheKey, rendered: Arc<str>) {
        if let Some(inner) = &self.inner {
            lock(inner).put(
                key,
                CachedFeed {
                    stored_at: Instant::now(),
                    rendered,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| lock(inner).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Values are immutable, so a poisoned lock still guards a consistent map.
fn lock(mutex: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
