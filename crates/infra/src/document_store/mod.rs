//! Document-store adapters for hosted backends.
//!
//! The in-memory store used for tests/dev lives next to the trait in
//! `pantry-inventory`.

pub mod firestore;

pub use firestore::{FirestoreConfig, FirestoreStore};
