//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Pantry entities are identified by their natural key (the item name), so
/// two entities with the same id describe the same stored record even when
/// their other attributes differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
