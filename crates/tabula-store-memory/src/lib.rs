//! In-process backend for the Tabula datastore engine.
//!
//! Each datastore lives behind its own [`tokio::sync::RwLock`], so mutations
//! on one datastore never wait on another, and readers see whole mutations
//! only.

mod store;

pub use store::MemoryStore;
pub use tabula_core::{Error, Result};

#[cfg(test)]
mod tests;
