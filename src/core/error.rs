//! Pricing error types.

use crate::core::currency::Currency;
use crate::core::price::PriceRecord;
use thiserror::Error;

/// Errors surfaced by the price cache and its upstream sources.
#[derive(Debug, Error)]
pub enum PriceError {
    /// No record or catalog entry exists for the item identifier.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Transport failure or timeout talking to an upstream service.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// An upstream payload could not be parsed.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// One of the two pivot rate lookups failed.
    #[error("Rate unavailable for {currency}: {source}")]
    RateUnavailable {
        currency: Currency,
        #[source]
        source: Box<PriceError>,
    },

    /// The currency code is not one of the supported currencies.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// A persistence write failed. `record` holds the in-memory state,
    /// which is correct but not durable.
    #[error("Storage fault: {reason}")]
    StorageFault {
        reason: String,
        record: Option<Box<PriceRecord>>,
    },
}

impl PriceError {
    /// The in-memory record reported alongside a failed persistence write.
    pub fn unpersisted_record(&self) -> Option<&PriceRecord> {
        match self {
            PriceError::StorageFault { record, .. } => record.as_deref(),
            _ => None,
        }
    }
}
