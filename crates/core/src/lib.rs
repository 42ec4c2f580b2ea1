//! `pantry-core` — domain foundation building blocks.
//!
//! Pure domain primitives shared by the pantry crates (no IO, no storage).

pub mod entity;
pub mod error;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use value_object::ValueObject;
