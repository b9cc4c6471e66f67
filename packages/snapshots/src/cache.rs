// ABOUTME: Freshness-threshold cache for composed read models
// ABOUTME: Serves a cached value until it is older than the threshold, regenerating at most once per key at a time

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use rfpdesk_core::SharedClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Portfolio,
    DecisionBrief,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Portfolio => f.write_str("portfolio"),
            SnapshotKind::DecisionBrief => f.write_str("decision_brief"),
        }
    }
}

/// Cache key: the entity a snapshot describes and which composer built it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub entity_id: String,
    pub kind: SnapshotKind,
}

impl SnapshotKey {
    pub fn new(entity_id: impl Into<String>, kind: SnapshotKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.entity_id)
    }
}

#[derive(Debug)]
pub struct Cached<V> {
    pub value: Arc<V>,
    pub generated_at: DateTime<Utc>,
    /// False when this call ran the regeneration itself
    pub from_cache: bool,
}

impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            generated_at: self.generated_at,
            from_cache: self.from_cache,
        }
    }
}

struct Entry<V> {
    value: Arc<V>,
    generated_at: DateTime<Utc>,
}

struct Slot<V> {
    entry: Option<Entry<V>>,
    /// Unique per slot. Invalidation removes the slot, so a regeneration
    /// that started before it finds a different epoch (or none) and does
    /// not store its result.
    epoch: u64,
}

type FillLocks = SyncMutex<HashMap<SnapshotKey, Arc<Mutex<()>>>>;

/// Per-key fill lock. Dropping it releases the lock and forgets the key once
/// no other caller is waiting on it.
struct FillGuard<'a> {
    locks: &'a FillLocks,
    key: SnapshotKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FillGuard<'_> {
    fn drop(&mut self) {
        // The owned guard holds one reference to the lock; release it first
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

pub struct FreshnessCache<V> {
    threshold: Duration,
    clock: SharedClock,
    slots: Mutex<HashMap<SnapshotKey, Slot<V>>>,
    inflight: FillLocks,
    next_epoch: AtomicU64,
}

impl<V> FreshnessCache<V> {
    pub fn new(threshold: Duration, clock: SharedClock) -> Self {
        Self {
            threshold,
            clock,
            slots: Mutex::new(HashMap::new()),
            inflight: SyncMutex::new(HashMap::new()),
            next_epoch: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Serve the cached value for `key` if it is fresh, otherwise run
    /// `regenerate` and cache its result. A value is stale only once
    /// `now - generated_at` exceeds the threshold.
    ///
    /// Concurrent callers for the same key wait on a per-key lock and
    /// re-check the cache, so only the first of them regenerates. Errors
    /// from `regenerate` are returned to that caller and nothing is cached.
    pub async fn get_or_refresh<F, Fut, E>(
        &self,
        key: &SnapshotKey,
        regenerate: F,
    ) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.lookup_fresh(key).await {
            return Ok(hit);
        }

        let _guard = self.acquire_fill_lock(key).await;

        if let Some(hit) = self.lookup_fresh(key).await {
            debug!(key = %key, "Snapshot filled while waiting");
            return Ok(hit);
        }

        let epoch = self.begin_fill(key).await;
        let generated_at = self.clock.now();
        debug!(key = %key, "Regenerating snapshot");
        let value = match regenerate().await {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.abandon_fill(key, epoch).await;
                return Err(e);
            }
        };

        let mut slots = self.slots.lock().await;
        match slots.get_mut(key) {
            Some(slot) if slot.epoch == epoch => {
                slot.entry = Some(Entry {
                    value: Arc::clone(&value),
                    generated_at,
                });
            }
            _ => debug!(key = %key, "Snapshot invalidated during regeneration, not caching"),
        }

        Ok(Cached {
            value,
            generated_at,
            from_cache: false,
        })
    }

    /// Drop the cached value for `key`. A regeneration already in flight
    /// still answers its caller but is not cached.
    pub async fn invalidate(&self, key: &SnapshotKey) {
        if self.slots.lock().await.remove(key).is_some() {
            debug!(key = %key, "Snapshot invalidated");
        }
    }

    pub async fn is_fresh(&self, key: &SnapshotKey) -> bool {
        self.lookup_fresh(key).await.is_some()
    }

    async fn lookup_fresh(&self, key: &SnapshotKey) -> Option<Cached<V>> {
        let now = self.clock.now();
        let slots = self.slots.lock().await;
        let entry = slots.get(key)?.entry.as_ref()?;
        if now - entry.generated_at > self.threshold {
            return None;
        }
        Some(Cached {
            value: Arc::clone(&entry.value),
            generated_at: entry.generated_at,
            from_cache: true,
        })
    }

    /// Epoch of the slot a regeneration will fill, creating the slot if needed
    async fn begin_fill(&self, key: &SnapshotKey) -> u64 {
        let mut slots = self.slots.lock().await;
        slots
            .entry(key.clone())
            .or_insert_with(|| Slot {
                entry: None,
                epoch: self.next_epoch.fetch_add(1, Ordering::Relaxed),
            })
            .epoch
    }

    /// Forget the slot a failed regeneration created or found stale
    async fn abandon_fill(&self, key: &SnapshotKey, epoch: u64) {
        let mut slots = self.slots.lock().await;
        if slots.get(key).is_some_and(|slot| slot.epoch == epoch) {
            slots.remove(key);
        }
    }

    async fn acquire_fill_lock(&self, key: &SnapshotKey) -> FillGuard<'_> {
        let lock = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                inflight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        FillGuard {
            locks: &self.inflight,
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }
}
