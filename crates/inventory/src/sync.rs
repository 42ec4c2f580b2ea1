//! Inventory synchronizer: list/add/remove against a document store.
//!
//! Every mutation is a read followed by a conditional write. The write carries
//! a precondition on what was read (document missing, or unchanged revision);
//! when a concurrent writer gets there first the store rejects the write and
//! the operation re-reads and tries again, up to `max_attempts` times.
//!
//! After each mutation (successful or not) the inventory is listed again so
//! callers always get the store's current view alongside the outcome.

use serde::Serialize;
use thiserror::Error;

use pantry_core::DomainError;

use crate::item::{InventoryItem, ItemName, Quantity};
use crate::store::{DocumentStore, Precondition, Revision, StoreError};

/// Default collection holding inventory documents.
pub const DEFAULT_COLLECTION: &str = "inventory";

/// Default bound on conditional-write attempts per mutation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizerConfig {
    pub collection: String,
    pub max_attempts: u32,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Why a mutation could not be written.
#[derive(Debug, Error)]
pub enum WriteFailure {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored document has no usable quantity.
    #[error("malformed document: {}", .0.detail())]
    Malformed(DomainError),

    #[error("{}", .0.detail())]
    Invariant(DomainError),

    /// Every attempt lost against a concurrent writer.
    #[error("gave up after {attempts} conflicting write attempts")]
    Contention { attempts: u32 },
}

/// Synchronizer error.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{}", .0.detail())]
    Validation(DomainError),

    #[error("failed to fetch inventory: {0}")]
    Fetch(#[source] StoreError),

    #[error("failed to write `{key}`: {source}")]
    Write { key: String, source: WriteFailure },
}

impl SyncError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "validation_error",
            SyncError::Fetch(_) => "fetch_error",
            SyncError::Write { .. } => "write_error",
        }
    }

    fn write(key: &ItemName, source: impl Into<WriteFailure>) -> Self {
        SyncError::Write {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

/// What a successful add/remove did to the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "quantity", rename_all = "snake_case")]
pub enum Mutation {
    Created,
    Incremented(Quantity),
    Decremented(Quantity),
    Deleted,
    /// Remove of an item that was not stored.
    Absent,
}

impl Mutation {
    /// Quantity left in the store after the mutation.
    pub fn quantity(&self) -> Option<Quantity> {
        match self {
            Mutation::Created => Some(Quantity::ONE),
            Mutation::Incremented(q) | Mutation::Decremented(q) => Some(*q),
            Mutation::Deleted | Mutation::Absent => None,
        }
    }
}

/// Mutation outcome plus the inventory as listed right after it.
#[derive(Debug)]
pub struct Synced {
    pub outcome: Result<Mutation, SyncError>,
    pub inventory: Result<Vec<InventoryItem>, SyncError>,
}

/// Current state of one stored item.
struct Current {
    quantity: Quantity,
    revision: Revision,
}

enum Write {
    Set {
        quantity: Quantity,
        precondition: Precondition,
    },
    Delete {
        precondition: Precondition,
    },
    Skip,
}

fn plan_add(current: Option<Current>) -> Result<(Mutation, Write), WriteFailure> {
    match current {
        None => Ok((
            Mutation::Created,
            Write::Set {
                quantity: Quantity::ONE,
                precondition: Precondition::Missing,
            },
        )),
        Some(current) => {
            let next = current
                .quantity
                .increment()
                .map_err(WriteFailure::Invariant)?;
            Ok((
                Mutation::Incremented(next),
                Write::Set {
                    quantity: next,
                    precondition: Precondition::Revision(current.revision),
                },
            ))
        }
    }
}

fn plan_remove(current: Option<Current>) -> Result<(Mutation, Write), WriteFailure> {
    let Some(current) = current else {
        return Ok((Mutation::Absent, Write::Skip));
    };

    let precondition = Precondition::Revision(current.revision);
    Ok(match current.quantity.decrement() {
        None => (Mutation::Deleted, Write::Delete { precondition }),
        Some(next) => (
            Mutation::Decremented(next),
            Write::Set {
                quantity: next,
                precondition,
            },
        ),
    })
}

/// Keeps the pantry inventory in a document store.
#[derive(Debug)]
pub struct InventorySynchronizer<S> {
    store: S,
    config: SynchronizerConfig,
}

impl<S> InventorySynchronizer<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, SynchronizerConfig::default())
    }

    pub fn with_config(store: S, mut config: SynchronizerConfig) -> Self {
        config.max_attempts = config.max_attempts.max(1);
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// All stored items in store enumeration order.
    ///
    /// Documents without a usable quantity are skipped.
    pub async fn list(&self) -> Result<Vec<InventoryItem>, SyncError> {
        let docs = self
            .store
            .list(&self.config.collection)
            .await
            .map_err(|e| {
                tracing::warn!(collection = %self.config.collection, error = %e, "inventory fetch failed");
                SyncError::Fetch(e)
            })?;

        let items = docs
            .iter()
            .filter_map(|doc| match InventoryItem::from_document(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(key = %doc.key, error = %e, "skipping malformed inventory document");
                    None
                }
            })
            .collect();
        Ok(items)
    }

    /// Add one of `name`: create it with quantity 1 or increment it.
    pub async fn add(&self, name: &str) -> Synced {
        let outcome = match ItemName::parse(name) {
            Ok(name) => self.mutate(&name, plan_add).await,
            Err(e) => Err(SyncError::Validation(e)),
        };
        self.refreshed("add", name, outcome).await
    }

    /// Remove one of `name`: decrement it, delete it at 1, ignore it when absent.
    pub async fn remove(&self, name: &str) -> Synced {
        let outcome = match ItemName::parse(name) {
            Ok(name) => self.mutate(&name, plan_remove).await,
            Err(e) => Err(SyncError::Validation(e)),
        };
        self.refreshed("remove", name, outcome).await
    }

    async fn refreshed(
        &self,
        op: &'static str,
        name: &str,
        outcome: Result<Mutation, SyncError>,
    ) -> Synced {
        match &outcome {
            Ok(mutation) => tracing::info!(op, item = %name, ?mutation, "inventory updated"),
            Err(e) => tracing::warn!(op, item = %name, error = %e, "inventory update failed"),
        }

        Synced {
            outcome,
            inventory: self.list().await,
        }
    }

    async fn read(&self, name: &ItemName) -> Result<Option<Current>, SyncError> {
        let doc = self
            .store
            .get(&self.config.collection, name.as_str())
            .await
            .map_err(|e| SyncError::write(name, e))?;

        match doc {
            None => Ok(None),
            Some(doc) => {
                let quantity = Quantity::from_document(&doc)
                    .map_err(|e| SyncError::write(name, WriteFailure::Malformed(e)))?;
                Ok(Some(Current {
                    quantity,
                    revision: doc.revision,
                }))
            }
        }
    }

    async fn mutate<P>(&self, name: &ItemName, plan: P) -> Result<Mutation, SyncError>
    where
        P: Fn(Option<Current>) -> Result<(Mutation, Write), WriteFailure>,
    {
        let collection = self.config.collection.as_str();
        let key = name.as_str();

        for attempt in 1..=self.config.max_attempts {
            let current = self.read(name).await?;
            let (mutation, write) = plan(current).map_err(|e| SyncError::write(name, e))?;

            let result = match write {
                Write::Set {
                    quantity,
                    precondition,
                } => {
                    self.store
                        .set(collection, key, quantity.to_fields(), precondition)
                        .await
                }
                Write::Delete { precondition } => {
                    self.store.delete(collection, key, precondition).await
                }
                Write::Skip => return Ok(mutation),
            };

            match result {
                Ok(()) => return Ok(mutation),
                Err(StoreError::PreconditionFailed { .. }) => {
                    tracing::debug!(item = %name, attempt, "concurrent write detected; retrying");
                }
                Err(e) => return Err(SyncError::write(name, e)),
            }
        }

        Err(SyncError::write(
            name,
            WriteFailure::Contention {
                attempts: self.config.max_attempts,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::store::{Document, FieldValue, Fields, InMemoryDocumentStore};

    fn synchronizer() -> InventorySynchronizer<Arc<InMemoryDocumentStore>> {
        InventorySynchronizer::new(Arc::new(InMemoryDocumentStore::new()))
    }

    fn quantities(items: &[InventoryItem]) -> Vec<(String, u32)> {
        items
            .iter()
            .map(|i| (i.name().to_string(), i.quantity().get()))
            .collect()
    }

    async fn seed(store: &InMemoryDocumentStore, name: &str, quantity: u32) {
        store
            .set(
                DEFAULT_COLLECTION,
                name,
                Quantity::new(quantity).unwrap().to_fields(),
                Precondition::None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_on_empty_store_is_empty() {
        let sync = synchronizer();
        assert!(sync.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_fresh_name_creates_with_quantity_one() {
        let sync = synchronizer();
        let synced = sync.add("Apple").await;

        assert_eq!(synced.outcome.unwrap(), Mutation::Created);
        assert_eq!(
            quantities(&synced.inventory.unwrap()),
            vec![("Apple".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn add_twice_yields_quantity_two() {
        let sync = synchronizer();
        sync.add("rice").await.outcome.unwrap();
        let synced = sync.add("rice").await;

        assert_eq!(
            synced.outcome.unwrap(),
            Mutation::Incremented(Quantity::new(2).unwrap())
        );
        assert_eq!(quantities(&synced.inventory.unwrap()), vec![("rice".to_string(), 2)]);
    }

    #[tokio::test]
    async fn key_is_stored_as_given() {
        let sync = synchronizer();
        sync.add("Apple").await.outcome.unwrap();
        sync.add("apple").await.outcome.unwrap();

        let items = sync.list().await.unwrap();
        assert_eq!(
            quantities(&items),
            vec![("Apple".to_string(), 1), ("apple".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn remove_at_one_deletes_item() {
        let sync = synchronizer();
        sync.add("milk").await.outcome.unwrap();

        let synced = sync.remove("milk").await;
        assert_eq!(synced.outcome.unwrap(), Mutation::Deleted);
        assert!(synced.inventory.unwrap().is_empty());
        assert!(sync.store().get(DEFAULT_COLLECTION, "milk").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_at_three_yields_two() {
        let sync = synchronizer();
        seed(sync.store(), "eggs", 3).await;

        let synced = sync.remove("eggs").await;
        assert_eq!(
            synced.outcome.unwrap(),
            Mutation::Decremented(Quantity::new(2).unwrap())
        );
        assert_eq!(quantities(&synced.inventory.unwrap()), vec![("eggs".to_string(), 2)]);
    }

    #[tokio::test]
    async fn remove_absent_is_noop() {
        let sync = synchronizer();
        let synced = sync.remove("ghost").await;

        assert_eq!(synced.outcome.unwrap(), Mutation::Absent);
        assert_eq!(sync.store().write_count(), 0);
    }

    #[tokio::test]
    async fn add_empty_name_is_validation_error_without_mutation() {
        let sync = synchronizer();
        let synced = sync.add("").await;

        match synced.outcome.unwrap_err() {
            SyncError::Validation(_) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(sync.store().write_count(), 0);
        assert!(synced.inventory.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_skips_malformed_documents() {
        let sync = synchronizer();
        seed(sync.store(), "flour", 2).await;
        let mut fields = Fields::new();
        fields.insert("quantity".to_string(), FieldValue::String("lots".into()));
        sync.store()
            .set(DEFAULT_COLLECTION, "sugar", fields, Precondition::None)
            .await
            .unwrap();

        let items = sync.list().await.unwrap();
        assert_eq!(quantities(&items), vec![("flour".to_string(), 2)]);
    }

    #[tokio::test]
    async fn add_on_malformed_document_is_write_error() {
        let sync = synchronizer();
        sync.store()
            .set(DEFAULT_COLLECTION, "salt", Fields::new(), Precondition::None)
            .await
            .unwrap();

        match sync.add("salt").await.outcome.unwrap_err() {
            SyncError::Write {
                source: WriteFailure::Malformed(_),
                ..
            } => {}
            other => panic!("expected malformed write error, got {other:?}"),
        }
    }

    /// Store wrapper that slips a competing write in right after the first read.
    struct InterleavingStore {
        inner: InMemoryDocumentStore,
        interfered: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for InterleavingStore {
        async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
            self.inner.list(collection).await
        }

        async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
            let doc = self.inner.get(collection, key).await?;
            if !self.interfered.swap(true, Ordering::SeqCst) {
                // Another client increments between our read and our write.
                let next = doc
                    .as_ref()
                    .and_then(|d| d.field("quantity"))
                    .and_then(FieldValue::as_integer)
                    .unwrap_or(0)
                    + 1;
                let mut fields = Fields::new();
                fields.insert("quantity".to_string(), FieldValue::Integer(next));
                self.inner
                    .set(collection, key, fields, Precondition::None)
                    .await?;
            }
            Ok(doc)
        }

        async fn set(
            &self,
            collection: &str,
            key: &str,
            fields: Fields,
            precondition: Precondition,
        ) -> Result<(), StoreError> {
            self.inner.set(collection, key, fields, precondition).await
        }

        async fn delete(
            &self,
            collection: &str,
            key: &str,
            precondition: Precondition,
        ) -> Result<(), StoreError> {
            self.inner.delete(collection, key, precondition).await
        }
    }

    #[tokio::test]
    async fn interleaved_increment_is_not_lost() {
        let store = InterleavingStore {
            inner: InMemoryDocumentStore::new(),
            interfered: AtomicBool::new(false),
        };
        seed(&store.inner, "beans", 1).await;
        let sync = InventorySynchronizer::new(store);

        let synced = sync.add("beans").await;
        assert_eq!(
            synced.outcome.unwrap(),
            Mutation::Incremented(Quantity::new(3).unwrap())
        );
        assert_eq!(quantities(&synced.inventory.unwrap()), vec![("beans".to_string(), 3)]);
    }

    #[tokio::test]
    async fn interleaved_create_is_not_lost() {
        let store = InterleavingStore {
            inner: InMemoryDocumentStore::new(),
            interfered: AtomicBool::new(false),
        };
        let sync = InventorySynchronizer::new(store);

        let synced = sync.add("oats").await;
        assert_eq!(
            synced.outcome.unwrap(),
            Mutation::Incremented(Quantity::new(2).unwrap())
        );
    }

    #[tokio::test]
    async fn interleaved_increment_survives_decrement() {
        let store = InterleavingStore {
            inner: InMemoryDocumentStore::new(),
            interfered: AtomicBool::new(false),
        };
        seed(&store.inner, "rice", 2).await;
        let sync = InventorySynchronizer::new(store);

        let synced = sync.remove("rice").await;
        assert_eq!(
            synced.outcome.unwrap(),
            Mutation::Decremented(Quantity::new(2).unwrap())
        );
        assert_eq!(quantities(&synced.inventory.unwrap()), vec![("rice".to_string(), 2)]);
    }

    #[tokio::test]
    async fn interleaved_add_prevents_delete_of_last_unit() {
        let store = InterleavingStore {
            inner: InMemoryDocumentStore::new(),
            interfered: AtomicBool::new(false),
        };
        seed(&store.inner, "milk", 1).await;
        let sync = InventorySynchronizer::new(store);

        let synced = sync.remove("milk").await;
        assert_eq!(
            synced.outcome.unwrap(),
            Mutation::Decremented(Quantity::ONE)
        );
        assert_eq!(quantities(&synced.inventory.unwrap()), vec![("milk".to_string(), 1)]);
    }

    /// Store whose conditional writes always lose.
    struct ContendedStore {
        inner: InMemoryDocumentStore,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl DocumentStore for ContendedStore {
        async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
            self.inner.list(collection).await
        }

        async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, key).await
        }

        async fn set(
            &self,
            _collection: &str,
            key: &str,
            _fields: Fields,
            _precondition: Precondition,
        ) -> Result<(), StoreError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::PreconditionFailed {
                key: key.to_string(),
            })
        }

        async fn delete(
            &self,
            collection: &str,
            key: &str,
            precondition: Precondition,
        ) -> Result<(), StoreError> {
            self.inner.delete(collection, key, precondition).await
        }
    }

    #[tokio::test]
    async fn contention_gives_up_after_max_attempts() {
        let store = ContendedStore {
            inner: InMemoryDocumentStore::new(),
            attempts: AtomicU32::new(0),
        };
        let config = SynchronizerConfig {
            max_attempts: 3,
            ..Default::default()
        };
        let sync = InventorySynchronizer::with_config(store, config);

        match sync.add("tea").await.outcome.unwrap_err() {
            SyncError::Write {
                source: WriteFailure::Contention { attempts: 3 },
                ..
            } => {}
            other => panic!("expected contention error, got {other:?}"),
        }
        assert_eq!(sync.store().attempts.load(Ordering::SeqCst), 3);
    }

    /// Store where every call fails at the transport level.
    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        async fn list(&self, _collection: &str) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Transport("connection refused".into()))
        }

        async fn get(&self, _collection: &str, _key: &str) -> Result<Option<Document>, StoreError> {
            Err(StoreError::Transport("connection refused".into()))
        }

        async fn set(
            &self,
            _collection: &str,
            _key: &str,
            _fields: Fields,
            _precondition: Precondition,
        ) -> Result<(), StoreError> {
            Err(StoreError::Transport("connection refused".into()))
        }

        async fn delete(
            &self,
            _collection: &str,
            _key: &str,
            _precondition: Precondition,
        ) -> Result<(), StoreError> {
            Err(StoreError::Transport("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_surface_as_fetch_and_write_errors() {
        let sync = InventorySynchronizer::new(DownStore);

        assert_eq!(sync.list().await.unwrap_err().code(), "fetch_error");

        let synced = sync.remove("rice").await;
        assert_eq!(synced.outcome.unwrap_err().code(), "write_error");
        // The refresh still runs (and fails the same way).
        assert_eq!(synced.inventory.unwrap_err().code(), "fetch_error");
    }

    #[test]
    fn mutation_reports_remaining_quantity() {
        assert_eq!(Mutation::Created.quantity(), Some(Quantity::ONE));
        assert_eq!(Mutation::Deleted.quantity(), None);
        assert_eq!(Mutation::Absent.quantity(), None);
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let sync = InventorySynchronizer::with_config(
            InMemoryDocumentStore::new(),
            SynchronizerConfig {
                collection: "pantry".into(),
                max_attempts: 0,
            },
        );
        assert_eq!(sync.config.max_attempts, 1);
        assert_eq!(sync.collection(), "pantry");
    }
}
