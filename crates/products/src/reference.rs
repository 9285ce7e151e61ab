//! Reference data that products point at by id.

use myshop_core::{ImageId, ManufacturerId, OperatingSystemId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub id: OperatingSystemId,
    pub name: String,
}

/// An uploaded product picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub url: String,
    pub caption: String,
}

impl Manufacturer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: ManufacturerId::new(), name: name.into() }
    }
}

impl OperatingSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: OperatingSystemId::new(), name: name.into() }
    }
}

impl Image {
    pub fn new(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self { id: ImageId::new(), url: url.into(), caption: caption.into() }
    }
}
