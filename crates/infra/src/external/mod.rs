//! External service clients/adapters.

pub mod spoonacular;

pub use spoonacular::{SpoonacularClient, SpoonacularConfig};
