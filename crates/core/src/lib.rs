//! `myshop-core`: shared building blocks for the shop workspace.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ImageId, ManufacturerId, OperatingSystemId, ProductId, VariantId};
pub use validation::{ErrorDetail, ValidationErrors};
