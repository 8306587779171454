use super::util::{get_text, http_client};
use crate::core::config::RateProviderConfig;
use crate::core::currency::{Currency, RateSource};
use crate::core::error::PriceError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Client of the currency service publishing pivot rates at
/// `/api/currency/{symbol}` in major units.
pub struct HttpRateProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRateProvider {
    pub fn new(config: &RateProviderConfig, timeout: Duration) -> Result<Self, PriceError> {
        Ok(HttpRateProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    value: f64,
}

#[async_trait]
impl RateSource for HttpRateProvider {
    #[instrument(name = "RateFetch", skip(self))]
    async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, PriceError> {
        let symbol = currency.rate_symbol();
        let url = format!("{}/api/currency/{}", self.base_url, symbol);
        let body = get_text(&self.client, &url).await?;

        let data: RateResponse = serde_json::from_str(&body).map_err(|e| {
            PriceError::MalformedResponse(format!("Failed to parse JSON response for {symbol}: {e}"))
        })?;

        let rate = Decimal::from_f64(data.value)
            .filter(|rate| *rate > Decimal::ZERO)
            .ok_or_else(|| {
                PriceError::MalformedResponse(format!("Invalid rate {} for {}", data.value, symbol))
            })?
            * currency.minor_units();

        debug!("Rate for {} is {} minor units", symbol, rate);
        Ok(rate)
    }
}
