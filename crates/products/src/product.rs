use chrono::{DateTime, Utc};
use core::str::FromStr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use myshop_core::{DomainError, DomainResult, Entity, ImageId, ManufacturerId, ProductId};

use crate::change::FieldValue;
use crate::smartcard::SmartCard;
use crate::smartphone::{SmartPhoneModel, SmartPhoneVariant};

/// Concrete product kinds, identified on the wire as `<app>.<model>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "myshop.smartcard")]
    SmartCard,
    #[serde(rename = "myshop.smartphonemodel")]
    SmartPhoneModel,
}

impl ProductType {
    pub const ALL: &'static [ProductType] = &[ProductType::SmartCard, ProductType::SmartPhoneModel];

    /// Type identifier used to pick a detail serializer.
    pub fn identifier(&self) -> &'static str {
        match self {
            ProductType::SmartCard => "myshop.smartcard",
            ProductType::SmartPhoneModel => "myshop.smartphonemodel",
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            ProductType::SmartCard => "smartcard",
            ProductType::SmartPhoneModel => "smartphonemodel",
        }
    }

    pub fn verbose_name(&self) -> &'static str {
        match self {
            ProductType::SmartCard => "smart card",
            ProductType::SmartPhoneModel => "smart phone model",
        }
    }
}

impl core::fmt::Display for ProductType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ProductType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.identifier() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown product type: {s}")))
    }
}

/// Kind-specific attributes of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "product_type", content = "attributes")]
pub enum ProductKind {
    #[serde(rename = "myshop.smartcard")]
    SmartCard(SmartCard),
    #[serde(rename = "myshop.smartphonemodel")]
    SmartPhoneModel(SmartPhoneModel),
}

impl ProductKind {
    /// Attributes holding model defaults, ready to be overwritten by input.
    pub fn blank(product_type: ProductType) -> Self {
        match product_type {
            ProductType::SmartCard => ProductKind::SmartCard(SmartCard::default()),
            ProductType::SmartPhoneModel => ProductKind::SmartPhoneModel(SmartPhoneModel::default()),
        }
    }

    pub fn product_type(&self) -> ProductType {
        match self {
            ProductKind::SmartCard(_) => ProductType::SmartCard,
            ProductKind::SmartPhoneModel(_) => ProductType::SmartPhoneModel,
        }
    }
}

/// A catalog product.
///
/// The common columns live here; everything specific to a kind lives in
/// [`ProductKind`]. `images` is a many-to-many relation: stores load it
/// alongside the row but only change it through a relation write, never
/// through a plain save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub product_name: String,
    pub slug: String,
    pub caption: String,
    pub description: String,
    pub manufacturer: ManufacturerId,
    /// Sort key in lists.
    pub order: u32,
    pub active: bool,
    pub images: Vec<ImageId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub kind: ProductKind,
}

impl Product {
    /// A fresh, unsaved product carrying model defaults.
    pub fn blank(product_type: ProductType, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::new(),
            product_name: String::new(),
            slug: String::new(),
            caption: String::new(),
            description: String::new(),
            manufacturer: ManufacturerId::nil(),
            order: 0,
            active: true,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
            kind: ProductKind::blank(product_type),
        }
    }

    pub fn product_type(&self) -> ProductType {
        self.kind.product_type()
    }

    /// Product codes this row reserves (smart cards carry one, phones carry them per variant).
    pub fn product_code(&self) -> Option<&str> {
        match &self.kind {
            ProductKind::SmartCard(card) => Some(card.product_code.as_str()),
            ProductKind::SmartPhoneModel(_) => None,
        }
    }

    /// Price shown in lists: the card price, or the cheapest variant of a phone.
    pub fn display_price(&self, variants: &[SmartPhoneVariant]) -> Option<Decimal> {
        match &self.kind {
            ProductKind::SmartCard(card) => Some(card.unit_price),
            ProductKind::SmartPhoneModel(_) => variants
                .iter()
                .filter(|v| v.product == self.id)
                .map(|v| v.unit_price)
                .min(),
        }
    }

    /// Assign one scalar attribute.
    ///
    /// Fails when the attribute does not exist on this product's kind.
    pub fn assign(&mut self, value: FieldValue) -> DomainResult<()> {
        match (value, &mut self.kind) {
            (FieldValue::ProductName(v), _) => self.product_name = v,
            (FieldValue::Slug(v), _) => self.slug = v,
            (FieldValue::Caption(v), _) => self.caption = v,
            (FieldValue::Description(v), _) => self.description = v,
            (FieldValue::Manufacturer(v), _) => self.manufacturer = v,
            (FieldValue::Order(v), _) => self.order = v,
            (FieldValue::Active(v), _) => self.active = v,

            (FieldValue::UnitPrice(v), ProductKind::SmartCard(card)) => card.unit_price = v,
            (FieldValue::CardType(v), ProductKind::SmartCard(card)) => card.card_type = v,
            (FieldValue::Speed(v), ProductKind::SmartCard(card)) => card.speed = v,
            (FieldValue::ProductCode(v), ProductKind::SmartCard(card)) => card.product_code = v,
            (FieldValue::Storage(v), ProductKind::SmartCard(card)) => card.storage = v,

            (FieldValue::BatteryType(v), ProductKind::SmartPhoneModel(phone)) => phone.battery_type = v,
            (FieldValue::BatteryCapacity(v), ProductKind::SmartPhoneModel(phone)) => {
                phone.battery_capacity = v
            }
            (FieldValue::RamStorage(v), ProductKind::SmartPhoneModel(phone)) => phone.ram_storage = v,
            (FieldValue::WifiConnectivity(v), ProductKind::SmartPhoneModel(phone)) => {
                phone.wifi_connectivity = v
            }
            (FieldValue::Bluetooth(v), ProductKind::SmartPhoneModel(phone)) => phone.bluetooth = v,
            (FieldValue::Gps(v), ProductKind::SmartPhoneModel(phone)) => phone.gps = v,
            (FieldValue::OperatingSystem(v), ProductKind::SmartPhoneModel(phone)) => {
                phone.operating_system = v
            }
            (FieldValue::Width(v), ProductKind::SmartPhoneModel(phone)) => phone.width = v,
            (FieldValue::Height(v), ProductKind::SmartPhoneModel(phone)) => phone.height = v,
            (FieldValue::Weight(v), ProductKind::SmartPhoneModel(phone)) => phone.weight = v,
            (FieldValue::ScreenSize(v), ProductKind::SmartPhoneModel(phone)) => phone.screen_size = v,

            (value, kind) => {
                return Err(DomainError::invariant(format!(
                    "field `{}` does not exist on {}",
                    value.field_name(),
                    kind.product_type()
                )));
            }
        }
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn verbose_name() -> &'static str {
        "product"
    }
}
