use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, Entity, ValueObject};

use crate::store::{Document, FieldValue, Fields};

/// Name of the document field holding an item's quantity.
pub const QUANTITY_FIELD: &str = "quantity";

/// Longest document key the hosted store accepts.
const MAX_NAME_BYTES: usize = 1500;

/// Item name: the document key of an inventory item.
///
/// Stored exactly as entered (no trimming, no case folding). Capitalization
/// for display is applied by [`crate::view::display_name`] and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Validate a raw name.
    ///
    /// Rejects blank names and names the document store cannot use as a key.
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();

        if raw.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if raw.contains('/') {
            return Err(DomainError::validation("item name cannot contain '/'"));
        }
        if raw == "." || raw == ".." {
            return Err(DomainError::validation("item name cannot be '.' or '..'"));
        }
        if raw.len() >= 4 && raw.starts_with("__") && raw.ends_with("__") {
            return Err(DomainError::validation(
                "item names of the form __name__ are reserved",
            ));
        }
        if raw.len() > MAX_NAME_BYTES {
            return Err(DomainError::validation(format!(
                "item name cannot exceed {MAX_NAME_BYTES} bytes"
            )));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl ValueObject for ItemName {}

impl core::fmt::Display for ItemName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ItemName> for String {
    fn from(value: ItemName) -> Self {
        value.0
    }
}

/// Quantity of a stored item. Never zero: an item that would reach zero is
/// deleted instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Ok(Self(value))
    }

    /// Convert the integer held in a stored document.
    pub fn from_stored(value: i64) -> DomainResult<Self> {
        let value = u32::try_from(value).map_err(|_| {
            DomainError::validation(format!("stored quantity {value} is out of range"))
        })?;
        Self::new(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn increment(self) -> DomainResult<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| DomainError::invariant("quantity overflow"))
    }

    /// `None` when the item should leave the store.
    pub fn decrement(self) -> Option<Self> {
        if self.0 <= 1 { None } else { Some(Self(self.0 - 1)) }
    }

    /// Document fields persisting this quantity.
    pub fn to_fields(self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            QUANTITY_FIELD.to_string(),
            FieldValue::Integer(i64::from(self.0)),
        );
        fields
    }

    /// Read the quantity field of a stored document.
    pub fn from_document(doc: &Document) -> DomainResult<Self> {
        let value = doc
            .field(QUANTITY_FIELD)
            .ok_or_else(|| DomainError::validation(format!("`{}` has no quantity", doc.key)))?;
        let raw = value.as_integer().ok_or_else(|| {
            DomainError::validation(format!("`{}` has a non-integer quantity", doc.key))
        })?;
        Self::from_stored(raw)
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// An item present in the pantry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    name: ItemName,
    quantity: Quantity,
}

impl InventoryItem {
    pub fn new(name: ItemName, quantity: Quantity) -> Self {
        Self { name, quantity }
    }

    pub fn name(&self) -> &ItemName {
        &self.name
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Build an item from a stored document (key = name).
    pub fn from_document(doc: &Document) -> DomainResult<Self> {
        let name = ItemName::parse(doc.key.clone())?;
        let quantity = Quantity::from_document(doc)?;
        Ok(Self { name, quantity })
    }
}

impl Entity for InventoryItem {
    type Id = ItemName;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}
