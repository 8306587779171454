use crate::core::currency::{Currency, RateSource};
use crate::core::error::PriceError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CachedRate {
    rate: Decimal,
    expires_at: Instant,
}

/// Reuses fetched rates for `ttl`. Failed lookups are not cached.
pub struct CachingRateSource<T: RateSource> {
    inner: T,
    ttl: Duration,
    cache: Mutex<HashMap<Currency, CachedRate>>,
}

impl<T: RateSource> CachingRateSource<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<T: RateSource> RateSource for CachingRateSource<T> {
    async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, PriceError> {
        if let Some(cached) = self.cache.lock().await.get(&currency) {
            if cached.expires_at > Instant::now() {
                debug!("Cache hit for rate: {}", currency.rate_symbol());
                return Ok(cached.rate);
            }
            debug!("Cache entry expired for rate: {}", currency.rate_symbol());
        }

        debug!("Cache miss for rate: {}", currency.rate_symbol());
        let rate = self.inner.fetch_rate(currency).await?;
        self.cache.lock().await.insert(
            currency,
            CachedRate {
                rate,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(rate)
    }
}
