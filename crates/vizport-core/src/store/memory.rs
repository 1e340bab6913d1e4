use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, RwLock},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{
    artifact::{ArtifactId, ArtifactRecord, NewArtifact},
    error::{Result, VizportError},
    id::{Clock, IdGenerator, SystemClock, UlidGenerator},
};

use super::{ArtifactStore, StoreFuture};

/// Bounds applied by [`InMemoryArtifactStore`].
///
/// The default keeps everything until the process exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryPolicy {
    /// Records older than this are invisible to `get` and dropped by `sweep`.
    pub ttl: Option<Duration>,
    /// Inserting beyond this many records evicts the oldest insertion.
    pub max_entries: Option<usize>,
}

impl MemoryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}

#[derive(Default)]
struct Records {
    by_id: HashMap<ArtifactId, ArtifactRecord>,
    /// Insertion order, oldest first. Holds exactly the keys of `by_id`.
    order: VecDeque<ArtifactId>,
}

/// Process-local [`ArtifactStore`].
///
/// A single `RwLock` guards the map: `put` takes the write lock for the whole
/// check-and-insert, concurrent `get`s share the read lock.
pub struct InMemoryArtifactStore {
    records: RwLock<Records>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    policy: MemoryPolicy,
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl InMemoryArtifactStore {
    pub fn new(policy: MemoryPolicy) -> Self {
        Self::builder().policy(policy).build()
    }

    pub fn builder() -> InMemoryArtifactStoreBuilder {
        InMemoryArtifactStoreBuilder::default()
    }

    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    /// Number of records currently held, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, artifact: NewArtifact) -> Result<ArtifactRecord> {
        let mut records = self.records.write().map_err(|_| poisoned())?;

        let id = match artifact.id {
            Some(id) if records.by_id.contains_key(&id) => {
                return Err(VizportError::invalid(format!("reference `{id}` already exists")));
            }
            Some(id) => id,
            None => loop {
                let id = self.ids.next_id();
                if !records.by_id.contains_key(&id) {
                    break id;
                }
            },
        };

        let record = ArtifactRecord {
            id: id.clone(),
            payload: artifact.payload,
            created_at: self.clock.now(),
            source_prompt: artifact.source_prompt,
        };
        records.by_id.insert(id.clone(), record.clone());
        records.order.push_back(id);

        if let Some(max) = self.policy.max_entries {
            while records.by_id.len() > max {
                let Some(oldest) = records.order.pop_front() else {
                    break;
                };
                records.by_id.remove(&oldest);
                tracing::debug!(id = %oldest, max, "artifact store full, evicted oldest record");
            }
        }

        Ok(record)
    }

    fn lookup(&self, id: &ArtifactId) -> Result<Option<ArtifactRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let now = self.clock.now();

        Ok(records
            .by_id
            .get(id)
            .filter(|record| !self.policy.ttl.is_some_and(|ttl| is_older(record, now, ttl)))
            .cloned())
    }

    fn remove(&self, id: &ArtifactId) -> Result<bool> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let removed = records.by_id.remove(id).is_some();
        if removed {
            records.order.retain(|queued| queued != id);
        }
        Ok(removed)
    }

    fn remove_older_than(&self, max_age: Duration) -> Result<usize> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let now = self.clock.now();

        let before = records.by_id.len();
        records
            .by_id
            .retain(|_, record| !is_older(record, now, max_age));
        let Records { by_id, order } = &mut *records;
        order.retain(|id| by_id.contains_key(id));

        let removed = before - by_id.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = by_id.len(), "swept expired artifacts");
        }
        Ok(removed)
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(&self, artifact: NewArtifact) -> StoreFuture<'_, ArtifactRecord> {
        Box::pin(async move { self.insert(artifact) })
    }

    fn get<'a>(&'a self, id: &'a ArtifactId) -> StoreFuture<'a, Option<ArtifactRecord>> {
        Box::pin(async move { self.lookup(id) })
    }

    fn evict<'a>(&'a self, id: &'a ArtifactId) -> StoreFuture<'a, bool> {
        Box::pin(async move { self.remove(id) })
    }

    fn sweep(&self, max_age: Duration) -> StoreFuture<'_, usize> {
        Box::pin(async move { self.remove_older_than(max_age) })
    }
}

/// Builder for [`InMemoryArtifactStore`].
///
/// Defaults: system clock, ULID ids driven by that clock, unbounded policy.
#[derive(Default)]
pub struct InMemoryArtifactStoreBuilder {
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Box<dyn IdGenerator>>,
    policy: MemoryPolicy,
}

impl InMemoryArtifactStoreBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    pub fn policy(mut self, policy: MemoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> InMemoryArtifactStore {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Box::new(UlidGenerator::new(Arc::clone(&clock))));

        InMemoryArtifactStore {
            records: RwLock::new(Records::default()),
            ids,
            clock,
            policy: self.policy,
        }
    }
}

/// `true` once `record` has reached `max_age`.
fn is_older(record: &ArtifactRecord, now: DateTime<Utc>, max_age: Duration) -> bool {
    chrono::Duration::from_std(max_age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .is_some_and(|cutoff| record.created_at <= cutoff)
}

fn poisoned() -> VizportError {
    VizportError::Internal("artifact store lock poisoned".into())
}
