//! Document-store abstraction the synchronizer reads and writes through.
//!
//! A store holds schema-less documents (key → field map) grouped into named
//! collections. Implementations:
//! - [`InMemoryDocumentStore`] for tests/dev
//! - `pantry_infra::firestore::FirestoreStore` for the hosted backend

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryDocumentStore;

/// Field map of a document.
pub type Fields = BTreeMap<String, FieldValue>;

/// Scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// Opaque version token of a stored document.
///
/// Changes on every write; used to make a write conditional on the document
/// not having changed since it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored document as read from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
    pub revision: Revision,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Condition a write must satisfy to be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional (last writer wins).
    #[default]
    None,
    /// The document must not exist.
    Missing,
    /// The document must exist at exactly this revision.
    Revision(Revision),
}

/// Store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response (connect, timeout, IO).
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with an error status.
    #[error("store returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response could not be decoded.
    #[error("failed to decode store response: {0}")]
    Decode(String),

    /// A conditional write lost against a concurrent write.
    #[error("write precondition failed for `{key}`")]
    PreconditionFailed { key: String },
}

/// Async document-store client.
///
/// The four primitives the synchronizer needs; no transactions, no queries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, in the store's enumeration order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// A single document, `None` when absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Replace the fields of a document, creating it when absent.
    async fn set(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
        precondition: Precondition,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document without a precondition succeeds.
    async fn delete(
        &self,
        collection: &str,
        key: &str,
        precondition: Precondition,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        (**self).list(collection).await
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, key).await
    }

    async fn set(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        (**self).set(collection, key, fields, precondition).await
    }

    async fn delete(
        &self,
        collection: &str,
        key: &str,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        (**self).delete(collection, key, precondition).await
    }
}
