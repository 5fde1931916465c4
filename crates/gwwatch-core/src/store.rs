//! Persisted per-entity debounce state.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::types::EntityStateRecord;

/// Keyed storage for [`EntityStateRecord`]s.
///
/// `get` returns the default record for keys never written. Within one poll
/// cycle a key is read once and written once; callers must not run two cycles
/// for the same key concurrently.
pub trait EntityStateStore: Send {
    fn get(&self, entity_key: &str) -> Result<EntityStateRecord, StoreError>;
    fn put(&mut self, entity_key: &str, record: &EntityStateRecord) -> Result<(), StoreError>;
}

impl<T: EntityStateStore + ?Sized> EntityStateStore for &mut T {
    fn get(&self, entity_key: &str) -> Result<EntityStateRecord, StoreError> {
        (**self).get(entity_key)
    }

    fn put(&mut self, entity_key: &str, record: &EntityStateRecord) -> Result<(), StoreError> {
        (**self).put(entity_key, record)
    }
}

/// Process-local store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: HashMap<String, EntityStateRecord>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntityStateStore for MemoryStateStore {
    fn get(&self, entity_key: &str) -> Result<EntityStateRecord, StoreError> {
        Ok(self.records.get(entity_key).cloned().unwrap_or_default())
    }

    fn put(&mut self, entity_key: &str, record: &EntityStateRecord) -> Result<(), StoreError> {
        self.records.insert(entity_key.to_string(), record.clone());
        Ok(())
    }
}
