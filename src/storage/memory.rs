//! In-process object store.

use super::types::{ObjectInfo, StorageResourceId, StoreError};
use super::{ObjectStore, StoreResult};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Counters of the mutating calls a [`MemoryStore`] has served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub creates: usize,
    pub updates: usize,
    pub failed_updates: usize,
    pub deletes: usize,
}

#[derive(Debug)]
struct StoredObject {
    generation: u64,
    metageneration: u64,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<StorageResourceId, StoredObject>,
    last_generation: u64,
    injected_update_failures: VecDeque<StoreError>,
    stats: StoreStats,
}

/// Object store kept in memory, shared between threads.
///
/// Metadata updates can be made to fail on demand through
/// [`MemoryStore::fail_next_updates`], which lets tests drive the
/// coordinator's backoff path deterministically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Queue errors returned, in order, by the next metadata updates.
    pub fn fail_next_updates(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.state().injected_update_failures.extend(errors);
    }

    /// Whether an object currently exists.
    pub fn contains(&self, id: &StorageResourceId) -> bool {
        self.state().objects.contains_key(id)
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> StoreStats {
        self.state().stats
    }

    /// Unconditionally set an object's metadata, creating it if needed.
    ///
    /// Stands in for a writer that does not follow the locking protocol.
    pub fn put_metadata(&self, id: &StorageResourceId, metadata: BTreeMap<String, String>) {
        let mut state = self.state();
        state.last_generation += 1;
        let generation = state.last_generation;
        let object = state
            .objects
            .entry(id.clone())
            .or_insert_with(|| StoredObject {
                generation,
                metageneration: 0,
                metadata: BTreeMap::new(),
            });
        object.metageneration += 1;
        object.metadata = metadata;
    }
}

impl ObjectStore for MemoryStore {
    fn get_object_info(&self, id: &StorageResourceId) -> StoreResult<Option<ObjectInfo>> {
        let state = self.state();
        Ok(state.objects.get(id).map(|object| ObjectInfo {
            id: id.clone(),
            generation: object.generation,
            metageneration: object.metageneration,
            metadata: object.metadata.clone(),
        }))
    }

    fn create_empty_object(&self, id: &StorageResourceId) -> StoreResult<()> {
        let mut state = self.state();
        if state.objects.contains_key(id) {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }

        state.last_generation += 1;
        let generation = state.last_generation;
        state.objects.insert(
            id.clone(),
            StoredObject {
                generation,
                metageneration: 1,
                metadata: BTreeMap::new(),
            },
        );
        state.stats.creates += 1;
        Ok(())
    }

    fn update_metadata(
        &self,
        id: &StorageResourceId,
        metageneration: u64,
        metadata: BTreeMap<String, String>,
    ) -> StoreResult<ObjectInfo> {
        let mut guard = self.state();
        let state = &mut *guard;
        if let Some(err) = state.injected_update_failures.pop_front() {
            state.stats.failed_updates += 1;
            return Err(err);
        }

        let Some(object) = state.objects.get_mut(id) else {
            state.stats.failed_updates += 1;
            return Err(StoreError::NotFound(id.to_string()));
        };
        if object.metageneration != metageneration {
            state.stats.failed_updates += 1;
            return Err(StoreError::PreconditionFailed(id.to_string()));
        }

        object.metageneration += 1;
        object.metadata = metadata;
        let info = ObjectInfo {
            id: id.clone(),
            generation: object.generation,
            metageneration: object.metageneration,
            metadata: object.metadata.clone(),
        };
        state.stats.updates += 1;
        Ok(info)
    }

    fn delete_object(&self, id: &StorageResourceId, metageneration: u64) -> StoreResult<()> {
        let mut state = self.state();
        let current = state.objects.get(id).map(|object| object.metageneration);
        match current {
            None => Err(StoreError::NotFound(id.to_string())),
            Some(current) if current != metageneration => {
                Err(StoreError::PreconditionFailed(id.to_string()))
            }
            Some(_) => {
                state.objects.remove(id);
                state.stats.deletes += 1;
                Ok(())
            }
        }
    }
}
