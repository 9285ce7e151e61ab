//! Products domain module.
//!
//! This crate contains the shop's catalog records (smart cards, smartphone
//! models and their variants) and the rules that belong to them, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod change;
pub mod choices;
pub mod decimal;
pub mod money;
pub mod product;
pub mod reference;
pub mod smartcard;
pub mod smartphone;

pub use change::{FieldValue, ProductChange, RelationTargets};
pub use choices::{BatteryType, Bluetooth, CardType, Speed, WifiConnectivity};
pub use decimal::DecimalSpec;
pub use money::Currency;
pub use product::{Product, ProductKind, ProductType};
pub use reference::{Image, Manufacturer, OperatingSystem};
pub use smartcard::SmartCard;
pub use smartphone::{SmartPhoneModel, SmartPhoneVariant, VariantFields};

pub use rust_decimal::Decimal;
