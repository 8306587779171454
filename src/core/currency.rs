//! Currency codes and exchange rate abstractions

use crate::core::error::PriceError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Rub,
    Btc,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Rub,
        Currency::Btc,
    ];

    /// Currency the catalog reports base prices in.
    pub const REFERENCE: Currency = Currency::Usd;

    /// Unit every conversion is routed through.
    pub const PIVOT: Currency = Currency::Btc;

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Rub => "RUB",
            Currency::Btc => "BTC",
        }
    }

    /// Decimal digits between the major and minor unit: cents, or satoshis
    /// for the pivot.
    pub fn minor_exponent(&self) -> u32 {
        match self {
            Currency::Btc => 8,
            _ => 2,
        }
    }

    /// Minor units in one major unit.
    pub fn minor_units(&self) -> Decimal {
        Decimal::from(10_i64.pow(self.minor_exponent()))
    }

    /// Symbol the rate service publishes the pivot rate under, e.g. `BTCEUR`.
    pub fn rate_symbol(&self) -> String {
        format!("{}{}", Currency::PIVOT.code(), self.code())
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "RUB" => Ok(Currency::Rub),
            "BTC" => Ok(Currency::Btc),
            _ => Err(PriceError::InvalidCurrency(s.to_string())),
        }
    }
}

/// Source of pivot exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Value of one pivot unit in `currency`, in that currency's minor units.
    async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, PriceError>;
}
