//! HTTP API: the pantry's view layer over the inventory synchronizer.

pub mod app;
pub mod middleware;
