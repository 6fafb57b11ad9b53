//! Core types and trait definitions for the Tabula datastore engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Validation, schema evolution and batch planning are pure functions over
//! the types defined here; storage backends only decide where rows live and
//! how mutations are serialised.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod datastore;
pub mod error;
pub mod record;
pub mod schema;
pub mod store;
pub mod validate;
pub mod value;
pub mod write;

pub use error::{Error, Result};
