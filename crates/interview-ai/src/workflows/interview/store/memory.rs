use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Collection, Fields, Record, RecordFilter, RecordStore, StoreError};
use crate::workflows::interview::domain::RecordId;

/// Write observed by [`MemoryRecordStore`], in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create(Collection, RecordId),
    Update(Collection, RecordId),
    Delete(Collection, RecordId),
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<Collection, BTreeMap<RecordId, Fields>>,
    next_id: u64,
    journal: Vec<WriteOp>,
}

/// Process-local store used by the console host and by tests.
///
/// Identifiers are allocated from one counter shared by every collection, starting at 1.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRecordStore {
    /// Store with every collection provisioned.
    pub fn provisioned() -> Self {
        let store = Self::default();
        for collection in Collection::all() {
            store.provision(collection);
        }
        store
    }

    /// Store with no collections at all.
    pub fn unprovisioned() -> Self {
        Self::default()
    }

    pub fn provision(&self, collection: Collection) {
        if let Ok(mut state) = self.state.lock() {
            state.collections.entry(collection).or_default();
        }
    }

    pub fn journal(&self) -> Vec<WriteOp> {
        self.state
            .lock()
            .map(|state| state.journal.clone())
            .unwrap_or_default()
    }

    pub fn clear_journal(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.journal.clear();
        }
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.collections.get(&collection).map(BTreeMap::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn collection_mut(
    state: &mut MemoryState,
    collection: Collection,
) -> Result<&mut BTreeMap<RecordId, Fields>, StoreError> {
    state
        .collections
        .get_mut(&collection)
        .ok_or(StoreError::MissingCollection(collection))
}

fn collection_ref(
    state: &MemoryState,
    collection: Collection,
) -> Result<&BTreeMap<RecordId, Fields>, StoreError> {
    state
        .collections
        .get(&collection)
        .ok_or(StoreError::MissingCollection(collection))
}

fn records(state: &MemoryState, collection: Collection) -> Result<Vec<Record>, StoreError> {
    Ok(collection_ref(state, collection)?
        .iter()
        .map(|(id, fields)| Record {
            id: *id,
            fields: fields.clone(),
        })
        .collect())
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn has_collection(&self, collection: Collection) -> Result<bool, StoreError> {
        let state = self.lock()?;
        Ok(state.collections.contains_key(&collection))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        let state = self.lock()?;
        records(&state, collection)
    }

    async fn get_by_id(&self, collection: Collection, id: RecordId) -> Result<Record, StoreError> {
        let state = self.lock()?;
        let fields = collection_ref(&state, collection)?
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { collection, id })?;
        Ok(Record { id, fields })
    }

    async fn filter(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, StoreError> {
        let state = self.lock()?;
        let mut rows = records(&state, collection)?;
        rows.retain(|record| filter.matches(&record.fields));
        Ok(rows)
    }

    async fn create(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError> {
        let mut state = self.lock()?;
        let id = RecordId(state.next_id + 1);
        collection_mut(&mut state, collection)?.insert(id, fields);
        state.next_id = id.0;
        state.journal.push(WriteOp::Create(collection, id));
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let slot = collection_mut(&mut state, collection)?
            .get_mut(&id)
            .ok_or(StoreError::NotFound { collection, id })?;
        *slot = fields;
        state.journal.push(WriteOp::Update(collection, id));
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        collection_mut(&mut state, collection)?
            .remove(&id)
            .ok_or(StoreError::NotFound { collection, id })?;
        state.journal.push(WriteOp::Delete(collection, id));
        Ok(())
    }
}
