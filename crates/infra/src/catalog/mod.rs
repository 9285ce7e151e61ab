//! Catalog persistence.
//!
//! Reads go straight to the store; writes are collected into a [`WriteBatch`]
//! and committed atomically, so a request either lands completely or not at all.

mod in_memory;
mod store;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryProductStore;
pub use store::{ProductStore, StoreError, StoreResult, WriteBatch, WriteOp};
