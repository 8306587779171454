//! Price records and catalog abstractions

use crate::core::currency::Currency;
use crate::core::error::PriceError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use uuid::Uuid;

/// Internal key of a price record, distinct from the catalog identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RecordKey(Uuid);

impl RecordKey {
    pub fn generate() -> Self {
        RecordKey(Uuid::now_v7())
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single persisted field of a price record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Base,
    Converted(Currency),
}

impl Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceField::Base => write!(f, "base_price"),
            PriceField::Converted(currency) => write!(f, "{currency}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub item_id: String,
    pub record_key: RecordKey,
    pub name: String,
    /// Reference currency price in minor units. Zero until fetched.
    pub base_price: Decimal,
    pub prices: BTreeMap<Currency, Decimal>,
}

impl PriceRecord {
    /// Creates a record with every currency field zeroed.
    pub fn new(item_id: &str, name: &str) -> Self {
        PriceRecord {
            item_id: item_id.to_string(),
            record_key: RecordKey::generate(),
            name: name.to_string(),
            base_price: Decimal::ZERO,
            prices: Currency::ALL
                .iter()
                .map(|currency| (*currency, Decimal::ZERO))
                .collect(),
        }
    }

    pub fn is_fetched(&self) -> bool {
        !self.base_price.is_zero()
    }

    pub fn price(&self, currency: Currency) -> Decimal {
        self.prices.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set_field(&mut self, field: PriceField, value: Decimal) {
        match field {
            PriceField::Base => self.base_price = value,
            PriceField::Converted(currency) => {
                self.prices.insert(currency, value);
            }
        }
    }

    /// Every currency field of the record, base price first.
    pub fn fields() -> impl Iterator<Item = PriceField> {
        std::iter::once(PriceField::Base)
            .chain(Currency::ALL.into_iter().map(PriceField::Converted))
    }
}

/// An entry of the catalog snapshot records are created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: String,
    pub name: String,
}

/// Source of canonical base prices.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Reference currency price of `item_id` in minor units.
    async fn fetch_price(&self, item_id: &str) -> Result<Decimal, PriceError>;

    /// Every item the catalog tracks.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, PriceError>;
}
