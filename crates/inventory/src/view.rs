//! Presentation helpers: display capitalization and name search.
//!
//! Neither touches what is stored; names keep their original spelling in the
//! store and only get reformatted on the way out.

use crate::item::InventoryItem;

/// Capitalize each space-separated word ("green APPLE" -> "Green Apple").
pub fn display_name(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            let Some(first) = chars.next() else {
                return String::new();
            };
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive substring match. An empty query matches everything.
pub fn matches_search(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.to_lowercase())
}

/// Keep the items whose name matches `query`, preserving order.
pub fn filter_by_name(items: Vec<InventoryItem>, query: &str) -> Vec<InventoryItem> {
    if query.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| matches_search(item.name().as_str(), query))
        .collect()
}
