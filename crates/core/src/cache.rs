//! Query cache keyed by logical resource.
//!
//! Each fetch stores its result under a [`QueryKey`] plus an optional scope (for
//! example the page number). A successful write invalidates the whole key, which
//! marks every scope stale so the next fetch goes back to the server.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Patients,
    CustomFields,
}

impl QueryKey {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKey::Patients => "patients",
            QueryKey::CustomFields => "customFields",
        }
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stale: bool,
}

#[derive(Default)]
struct Slots {
    entries: HashMap<(QueryKey, String), Entry>,
    invalidations: HashMap<QueryKey, u64>,
    loads: HashMap<QueryKey, u64>,
}

#[derive(Default)]
pub struct QueryCache {
    slots: Mutex<Slots>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.lock();
        f.debug_struct("QueryCache")
            .field("entries", &slots.entries.len())
            .field("invalidations", &slots.invalidations)
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cached value for `key`, loading it when missing or stale.
    pub async fn fetch<T, E, F, Fut>(&self, key: QueryKey, loader: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch_scoped(key, "", loader).await
    }

    /// Like [`fetch`](Self::fetch) for one scope of a key (e.g. `"page=2"`).
    ///
    /// Failed loads are not stored; the previous value, if any, stays stale. A load
    /// that overlaps an [`invalidate`](Self::invalidate) of the same key is returned
    /// to its caller but stored stale, so the next fetch reloads.
    pub async fn fetch_scoped<T, E, F, Fut>(
        &self,
        key: QueryKey,
        scope: &str,
        loader: F,
    ) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh::<T>(key, scope) {
            tracing::trace!(key = key.as_str(), scope, "query cache hit");
            return Ok(value);
        }

        let generation = self.invalidation_count(key);
        let value = Arc::new(loader().await?);

        let mut slots = self.lock();
        *slots.loads.entry(key).or_default() += 1;
        let stale = slots.invalidations.get(&key).copied().unwrap_or_default() != generation;
        if stale {
            tracing::debug!(key = key.as_str(), scope, "load overlapped an invalidation");
        }
        slots.entries.insert(
            (key, scope.to_owned()),
            Entry {
                value: value.clone(),
                stale,
            },
        );
        Ok(value)
    }

    fn fresh<T: Send + Sync + 'static>(&self, key: QueryKey, scope: &str) -> Option<Arc<T>> {
        let slots = self.lock();
        let entry = slots.entries.get(&(key, scope.to_owned()))?;
        if entry.stale {
            return None;
        }
        entry.value.clone().downcast::<T>().ok()
    }

    /// Marks every scope of `key` stale.
    pub fn invalidate(&self, key: QueryKey) {
        let mut slots = self.lock();
        for ((entry_key, _), entry) in slots.entries.iter_mut() {
            if *entry_key == key {
                entry.stale = true;
            }
        }
        *slots.invalidations.entry(key).or_default() += 1;
        tracing::debug!(key = key.as_str(), "query invalidated");
    }

    pub fn invalidation_count(&self, key: QueryKey) -> u64 {
        self.lock().invalidations.get(&key).copied().unwrap_or_default()
    }

    /// Number of loader calls that completed successfully for `key`.
    pub fn load_count(&self, key: QueryKey) -> u64 {
        self.lock().loads.get(&key).copied().unwrap_or_default()
    }
}
