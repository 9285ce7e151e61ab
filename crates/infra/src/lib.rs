//! Infrastructure layer: product persistence and reference-data seeding.

pub mod catalog;
pub mod seed;

pub use catalog::{
    InMemoryProductStore, ProductStore, StoreError, StoreResult, WriteBatch, WriteOp,
};

#[cfg(feature = "postgres")]
pub use catalog::postgres::PostgresProductStore;
