use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{Document, DocumentStore, Fields, Precondition, Revision, StoreError};

#[derive(Debug, Clone)]
struct StoredDocument {
    fields: Fields,
    revision: u64,
}

#[derive(Debug, Default)]
struct State {
    // Keys are ordered so enumeration is deterministic in tests.
    collections: HashMap<String, BTreeMap<String, StoredDocument>>,
    clock: u64,
}

/// In-memory document store.
///
/// Intended for tests/dev. Honors write preconditions the same way the
/// hosted store does; revisions come from a store-wide write counter.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<State>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes (sets and deletes) applied so far.
    pub fn write_count(&self) -> u64 {
        self.state.read().map(|s| s.clock).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Transport("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Transport("in-memory store lock poisoned".to_string()))
    }

    fn check(
        key: &str,
        existing: Option<&StoredDocument>,
        precondition: &Precondition,
    ) -> Result<(), StoreError> {
        let satisfied = match precondition {
            Precondition::None => true,
            Precondition::Missing => existing.is_none(),
            Precondition::Revision(expected) => {
                existing.is_some_and(|doc| doc.revision.to_string() == expected.as_str())
            }
        };

        if satisfied {
            Ok(())
        } else {
            Err(StoreError::PreconditionFailed {
                key: key.to_string(),
            })
        }
    }
}

fn to_document(key: &str, stored: &StoredDocument) -> Document {
    Document {
        key: key.to_string(),
        fields: stored.fields.clone(),
        revision: Revision::new(stored.revision.to_string()),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let state = self.read()?;
        Ok(state
            .collections
            .get(collection)
            .map(|docs| docs.iter().map(|(k, d)| to_document(k, d)).collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let state = self.read()?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|d| to_document(key, d)))
    }

    async fn set(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let existing = state.collections.get(collection).and_then(|docs| docs.get(key));
        Self::check(key, existing, &precondition)?;

        state.clock += 1;
        let revision = state.clock;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), StoredDocument { fields, revision });
        Ok(())
    }

    async fn delete(
        &self,
        collection: &str,
        key: &str,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let existing = state.collections.get(collection).and_then(|docs| docs.get(key));
        Self::check(key, existing, &precondition)?;

        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(key));
        if removed.is_some() {
            state.clock += 1;
        }
        Ok(())
    }
}
