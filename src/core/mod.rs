//! Core pricing logic and abstractions

pub mod cache;
pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod log;
pub mod price;

// Re-export main types for cleaner imports
pub use cache::PriceCache;
pub use currency::{Currency, RateSource};
pub use error::PriceError;
pub use price::{CatalogItem, CatalogSource, PriceField, PriceRecord, RecordKey};
