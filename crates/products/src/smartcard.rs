//! Memory cards: a flat product with a single price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::choices::{CardType, Speed};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartCard {
    pub unit_price: Decimal,
    pub card_type: CardType,
    pub speed: Speed,
    /// Unique among smart cards.
    pub product_code: String,
    /// Capacity in GB.
    pub storage: u32,
}
