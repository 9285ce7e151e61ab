//! Smartphone models and the variants they own.

use myshop_core::{Entity, OperatingSystemId, ProductId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::choices::{BatteryType, Bluetooth, WifiConnectivity};

/// Model-level attributes shared by every variant of a phone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartPhoneModel {
    pub battery_type: BatteryType,
    /// mAh
    pub battery_capacity: u32,
    /// MB
    pub ram_storage: u32,
    pub wifi_connectivity: WifiConnectivity,
    pub bluetooth: Bluetooth,
    pub gps: bool,
    pub operating_system: OperatingSystemId,
    /// mm
    pub width: Decimal,
    /// mm
    pub height: Decimal,
    /// g
    pub weight: Decimal,
    /// inch
    pub screen_size: Decimal,
}

/// A sellable configuration of a smartphone model (e.g. one storage size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartPhoneVariant {
    pub id: VariantId,
    /// The owning smartphone model.
    pub product: ProductId,
    /// Unique among variants.
    pub product_code: String,
    pub unit_price: Decimal,
    /// GB
    pub storage: u32,
}

/// Validated variant input, detached from any parent.
///
/// `id` is `None` when the client wants a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFields {
    pub id: Option<VariantId>,
    pub product_code: String,
    pub unit_price: Decimal,
    pub storage: u32,
}

impl SmartPhoneVariant {
    /// Build a new row owned by `product`.
    pub fn create(product: ProductId, fields: VariantFields) -> Self {
        Self {
            id: fields.id.unwrap_or_else(VariantId::new),
            product,
            product_code: fields.product_code,
            unit_price: fields.unit_price,
            storage: fields.storage,
        }
    }

    /// Overwrite the editable columns; identity and owner stay put.
    pub fn apply(&mut self, fields: VariantFields) {
        self.product_code = fields.product_code;
        self.unit_price = fields.unit_price;
        self.storage = fields.storage;
    }
}

impl Entity for SmartPhoneVariant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn verbose_name() -> &'static str {
        "smart phone variant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(id: Option<VariantId>) -> VariantFields {
        VariantFields {
            id,
            product_code: "SP-64".to_string(),
            unit_price: Decimal::new(699, 0),
            storage: 64,
        }
    }

    #[test]
    fn create_links_to_parent_and_keeps_submitted_id() {
        let parent = ProductId::new();
        let id = VariantId::new();
        let variant = SmartPhoneVariant::create(parent, fields(Some(id)));
        assert_eq!(variant.id, id);
        assert_eq!(variant.product, parent);
    }

    #[test]
    fn create_assigns_fresh_id_when_missing() {
        let variant = SmartPhoneVariant::create(ProductId::new(), fields(None));
        assert!(!variant.id.is_nil());
    }

    #[test]
    fn apply_keeps_identity() {
        let parent = ProductId::new();
        let mut variant = SmartPhoneVariant::create(parent, fields(None));
        let id = variant.id;
        variant.apply(VariantFields {
            id: None,
            product_code: "SP-128".to_string(),
            unit_price: Decimal::new(799, 0),
            storage: 128,
        });
        assert_eq!(variant.id, id);
        assert_eq!(variant.product, parent);
        assert_eq!(variant.storage, 128);
    }
}
