//! Validated changes to a product.
//!
//! An update is a list of `ProductChange`s. Each change falls into exactly one
//! of three buckets, and each bucket is persisted differently:
//!
//! - `Assign`: a column on the product row, written when the row is saved.
//! - `SetRelation`: a many-to-many relation, replaced wholesale.
//! - `Variants`: the nested variant rows of a smartphone, reconciled row by row.

use std::collections::HashSet;

use myshop_core::{ImageId, ManufacturerId, OperatingSystemId};
use rust_decimal::Decimal;

use crate::choices::{BatteryType, Bluetooth, CardType, Speed, WifiConnectivity};
use crate::smartphone::VariantFields;

/// One scalar column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    ProductName(String),
    Slug(String),
    Caption(String),
    Description(String),
    Manufacturer(ManufacturerId),
    Order(u32),
    Active(bool),

    UnitPrice(Decimal),
    CardType(CardType),
    Speed(Speed),
    ProductCode(String),
    Storage(u32),

    BatteryType(BatteryType),
    BatteryCapacity(u32),
    RamStorage(u32),
    WifiConnectivity(WifiConnectivity),
    Bluetooth(Bluetooth),
    Gps(bool),
    OperatingSystem(OperatingSystemId),
    Width(Decimal),
    Height(Decimal),
    Weight(Decimal),
    ScreenSize(Decimal),
}

impl FieldValue {
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldValue::ProductName(_) => "product_name",
            FieldValue::Slug(_) => "slug",
            FieldValue::Caption(_) => "caption",
            FieldValue::Description(_) => "description",
            FieldValue::Manufacturer(_) => "manufacturer",
            FieldValue::Order(_) => "order",
            FieldValue::Active(_) => "active",
            FieldValue::UnitPrice(_) => "unit_price",
            FieldValue::CardType(_) => "card_type",
            FieldValue::Speed(_) => "speed",
            FieldValue::ProductCode(_) => "product_code",
            FieldValue::Storage(_) => "storage",
            FieldValue::BatteryType(_) => "battery_type",
            FieldValue::BatteryCapacity(_) => "battery_capacity",
            FieldValue::RamStorage(_) => "ram_storage",
            FieldValue::WifiConnectivity(_) => "wifi_connectivity",
            FieldValue::Bluetooth(_) => "bluetooth",
            FieldValue::Gps(_) => "gps",
            FieldValue::OperatingSystem(_) => "operating_system",
            FieldValue::Width(_) => "width",
            FieldValue::Height(_) => "height",
            FieldValue::Weight(_) => "weight",
            FieldValue::ScreenSize(_) => "screen_size",
        }
    }
}

/// Target list of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTargets {
    Images(Vec<ImageId>),
}

impl RelationTargets {
    /// Image targets in first-seen order, each id once.
    pub fn images(ids: impl IntoIterator<Item = ImageId>) -> Self {
        let mut seen = HashSet::new();
        RelationTargets::Images(ids.into_iter().filter(|id| seen.insert(*id)).collect())
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            RelationTargets::Images(_) => "images",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductChange {
    Assign(FieldValue),
    SetRelation(RelationTargets),
    Variants(Vec<VariantFields>),
}

impl ProductChange {
    pub fn field_name(&self) -> &'static str {
        match self {
            ProductChange::Assign(value) => value.field_name(),
            ProductChange::SetRelation(targets) => targets.field_name(),
            ProductChange::Variants(_) => "variants",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_targets_drop_repeats_and_keep_order() {
        let (a, b) = (ImageId::new(), ImageId::new());
        assert_eq!(
            RelationTargets::images([b, a, b, a]),
            RelationTargets::Images(vec![b, a])
        );
    }
}
