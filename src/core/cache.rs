//! The price cache: lazy base price fetch, pivot conversion and guarded
//! persistence of price records.
use crate::core::convert::{pivot_convert, round_amount};
use crate::core::currency::{Currency, RateSource};
use crate::core::error::PriceError;
use crate::core::price::{CatalogSource, PriceField, PriceRecord};
use crate::store::RecordStore;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PriceCache {
    store: Arc<dyn RecordStore>,
    catalog: Arc<dyn CatalogSource>,
    rates: Arc<dyn RateSource>,
    upstream_timeout: Duration,
}

impl PriceCache {
    pub fn new(
        store: Arc<dyn RecordStore>,
        catalog: Arc<dyn CatalogSource>,
        rates: Arc<dyn RateSource>,
    ) -> Self {
        Self {
            store,
            catalog,
            rates,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Returns the record for `item_id` with its `currency_code` price
    /// computed and persisted.
    ///
    /// The record guard is held from the freshness check until the last
    /// write, so upstream calls for one record are serialized. A failed
    /// persistence write is reported as [`PriceError::StorageFault`] carrying
    /// the updated in-memory record.
    #[instrument(name = "GetPrice", skip(self))]
    pub async fn get_price(
        &self,
        item_id: &str,
        currency_code: &str,
    ) -> Result<PriceRecord, PriceError> {
        let currency: Currency = currency_code.parse()?;
        let handle = self
            .store
            .get(item_id)
            .await
            .ok_or_else(|| PriceError::NotFound(item_id.to_string()))?;

        let mut record = handle.lock().await;
        let mut failed_fields = Vec::new();

        if !record.is_fetched() {
            debug!("Base price MISS for item: {}", item_id);
            let base = self.fetch_base_price(item_id).await?;
            if base.is_zero() {
                // stays unfetched, retried on the next call
                warn!(item_id, "Catalog reported a zero price");
            } else {
                record.set_field(PriceField::Base, base);
                if !self.store.set_field(&record.record_key, PriceField::Base, base).await {
                    failed_fields.push(PriceField::Base);
                }
            }
        }

        let amount = self.convert(record.base_price, currency).await?;
        let field = PriceField::Converted(currency);
        record.set_field(field, amount);
        if !self.store.set_field(&record.record_key, field, amount).await {
            failed_fields.push(field);
        }
        debug!("Priced item {} at {} {}", item_id, amount, currency);

        let snapshot = record.clone();
        drop(record);
        Self::check_persisted(snapshot, &failed_fields)
    }

    /// Zeroes the base price and every converted price of one record.
    #[instrument(name = "ClearPrice", skip(self))]
    pub async fn clear_price(&self, item_id: &str) -> Result<(), PriceError> {
        let handle = self
            .store
            .get(item_id)
            .await
            .ok_or_else(|| PriceError::NotFound(item_id.to_string()))?;

        let mut record = handle.lock().await;
        let cleared: Vec<(PriceField, Decimal)> = PriceRecord::fields()
            .map(|field| (field, Decimal::ZERO))
            .collect();
        for (field, value) in &cleared {
            record.set_field(*field, *value);
        }
        let failed_fields: Vec<PriceField> =
            if self.store.set_fields(&record.record_key, &cleared).await {
                Vec::new()
            } else {
                cleared.iter().map(|(field, _)| *field).collect()
            };
        debug!("Price of item {} was reset to zero", item_id);

        let snapshot = record.clone();
        drop(record);
        Self::check_persisted(snapshot, &failed_fields).map(|_| ())
    }

    /// Copy of the current record, taken under its guard.
    pub async fn get_record(&self, item_id: &str) -> Result<PriceRecord, PriceError> {
        let handle = self
            .store
            .get(item_id)
            .await
            .ok_or_else(|| PriceError::NotFound(item_id.to_string()))?;
        let record = handle.lock().await;
        Ok(record.clone())
    }

    /// Reference currency price of `item_id` from the catalog, in minor units.
    pub async fn fetch_base_price(&self, item_id: &str) -> Result<Decimal, PriceError> {
        let price = self
            .with_timeout(self.catalog.fetch_price(item_id), || {
                format!("Catalog request timed out for item: {item_id}")
            })
            .await?;
        Ok(round_amount(price))
    }

    /// Converts a reference currency amount into `currency` through the
    /// pivot unit.
    pub async fn convert(&self, base: Decimal, currency: Currency) -> Result<Decimal, PriceError> {
        if currency == Currency::REFERENCE {
            return Ok(round_amount(base));
        }

        let rate_ref = self.fetch_rate(Currency::REFERENCE).await?;
        let rate_target = if currency == Currency::PIVOT {
            currency.minor_units()
        } else {
            self.fetch_rate(currency).await?
        };
        debug!(%rate_ref, %rate_target, "Converting {} to {}", base, currency);

        let unconvertible = |reason: String| PriceError::RateUnavailable {
            currency,
            source: Box::new(PriceError::MalformedResponse(reason)),
        };
        let amount = pivot_convert(base, rate_ref, rate_target).ok_or_else(|| {
            unconvertible(format!("Cannot convert {base} with rates {rate_ref}/{rate_target}"))
        })?;
        // a priced title must never read as unpriced
        if amount.is_zero() && !base.is_zero() {
            return Err(unconvertible(format!(
                "{base} rounds to zero in {currency} with rates {rate_ref}/{rate_target}"
            )));
        }
        Ok(amount)
    }

    async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, PriceError> {
        self.with_timeout(self.rates.fetch_rate(currency), || {
            format!("Rate request timed out for {}", currency.rate_symbol())
        })
        .await
        .map_err(|e| PriceError::RateUnavailable {
            currency,
            source: Box::new(e),
        })
    }

    async fn with_timeout<T>(
        &self,
        request: impl Future<Output = Result<T, PriceError>>,
        describe: impl FnOnce() -> String,
    ) -> Result<T, PriceError> {
        tokio::time::timeout(self.upstream_timeout, request)
            .await
            .unwrap_or_else(|_| Err(PriceError::UpstreamUnavailable(describe())))
    }

    fn check_persisted(
        record: PriceRecord,
        failed_fields: &[PriceField],
    ) -> Result<PriceRecord, PriceError> {
        if failed_fields.is_empty() {
            return Ok(record);
        }
        let fields: Vec<String> = failed_fields.iter().map(ToString::to_string).collect();
        warn!(item_id = %record.item_id, ?fields, "Record fields were not persisted");
        Err(PriceError::StorageFault {
            reason: format!(
                "Failed to persist {} for item: {}",
                fields.join(", "),
                record.item_id
            ),
            record: Some(Box::new(record)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::{CatalogItem, RecordKey};
    use crate::store::{MemoryRecordStore, RecordHandle};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockCatalog {
        prices: HashMap<String, Decimal>,
        calls: AtomicUsize,
        delay: Duration,
        fail_with: StdMutex<Option<PriceError>>,
    }

    impl MockCatalog {
        fn new(prices: &[(&str, Decimal)]) -> Self {
            Self {
                prices: prices.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail_with: StdMutex::new(None),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn fail_next(&self, error: PriceError) {
            *self.fail_with.lock().unwrap() = Some(error);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogSource for MockCatalog {
        async fn fetch_price(&self, item_id: &str) -> Result<Decimal, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Some(error) = self.fail_with.lock().unwrap().take() {
                return Err(error);
            }
            self.prices
                .get(item_id)
                .copied()
                .ok_or_else(|| PriceError::NotFound(item_id.to_string()))
        }

        async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, PriceError> {
            Ok(self
                .prices
                .keys()
                .map(|id| CatalogItem {
                    item_id: id.clone(),
                    name: format!("Title {id}"),
                })
                .collect())
        }
    }

    struct MockRates {
        rates: HashMap<Currency, Decimal>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl MockRates {
        fn new(rates: &[(Currency, Decimal)]) -> Self {
            Self {
                rates: rates.iter().copied().collect(),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl RateSource for MockRates {
        async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.rates.get(&currency).copied().ok_or_else(|| {
                PriceError::UpstreamUnavailable(format!("no rate for {}", currency.rate_symbol()))
            })
        }
    }

    /// Store whose writes always fail, over live records of a memory store.
    struct FailingStore(MemoryRecordStore);

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn get(&self, item_id: &str) -> Option<RecordHandle> {
            self.0.get(item_id).await
        }

        async fn set_field(&self, _key: &RecordKey, _field: PriceField, _value: Decimal) -> bool {
            false
        }

        async fn reset_all(&self, snapshot: &[CatalogItem]) -> Result<usize, PriceError> {
            self.0.reset_all(snapshot).await
        }
    }

    /// Memory store counting the writes it receives.
    struct CountingStore {
        inner: MemoryRecordStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn get(&self, item_id: &str) -> Option<RecordHandle> {
            self.inner.get(item_id).await
        }

        async fn set_field(&self, key: &RecordKey, field: PriceField, value: Decimal) -> bool {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_field(key, field, value).await
        }

        async fn set_fields(&self, key: &RecordKey, fields: &[(PriceField, Decimal)]) -> bool {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_fields(key, fields).await
        }

        async fn reset_all(&self, snapshot: &[CatalogItem]) -> Result<usize, PriceError> {
            self.inner.reset_all(snapshot).await
        }
    }

    fn standard_rates() -> MockRates {
        MockRates::new(&[
            (Currency::Usd, dec!(10000)),
            (Currency::Eur, dec!(8000)),
            (Currency::Gbp, dec!(12345.65)),
            (Currency::Rub, dec!(900000)),
        ])
    }

    async fn setup(
        catalog: MockCatalog,
        rates: MockRates,
    ) -> (PriceCache, Arc<MemoryRecordStore>, Arc<MockCatalog>, Arc<MockRates>) {
        let store = Arc::new(MemoryRecordStore::new());
        store
            .reset_all(&[
                CatalogItem {
                    item_id: "570".to_string(),
                    name: "Dota 2".to_string(),
                },
                CatalogItem {
                    item_id: "730".to_string(),
                    name: "Counter-Strike 2".to_string(),
                },
            ])
            .await
            .unwrap();
        let catalog = Arc::new(catalog);
        let rates = Arc::new(rates);
        let cache = PriceCache::new(store.clone(), catalog.clone(), rates.clone());
        (cache, store, catalog, rates)
    }

    fn default_catalog() -> MockCatalog {
        MockCatalog::new(&[("570", dec!(5000)), ("730", dec!(1000))])
    }

    #[tokio::test]
    async fn test_pivot_conversion() {
        let (cache, store, _, _) = setup(default_catalog(), standard_rates()).await;

        let record = cache.get_price("570", "EUR").await.unwrap();

        assert_eq!(record.base_price, dec!(5000));
        assert_eq!(record.price(Currency::Eur), dec!(4000));
        let row = store.persisted("570").await.unwrap();
        assert_eq!(row.base_price, dec!(5000));
        assert_eq!(row.price(Currency::Eur), dec!(4000));
    }

    #[tokio::test]
    async fn test_conversion_rounds_final_amount() {
        let (cache, store, _, _) = setup(default_catalog(), standard_rates()).await;

        let record = cache.get_price("730", "gbp").await.unwrap();

        assert_eq!(record.price(Currency::Gbp), dec!(1234.57));
        assert_eq!(
            store.persisted("730").await.unwrap().price(Currency::Gbp),
            dec!(1234.57)
        );
    }

    #[tokio::test]
    async fn test_reference_currency_needs_no_rates() {
        let (cache, _, catalog, rates) = setup(default_catalog(), MockRates::new(&[])).await;

        let first = cache.get_price("570", "USD").await.unwrap();
        let second = cache.get_price("570", "USD").await.unwrap();

        assert_eq!(first.price(Currency::Usd), dec!(5000));
        assert_eq!(second.price(Currency::Usd), dec!(5000));
        assert_eq!(catalog.calls(), 1);
        assert_eq!(rates.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pivot_currency_uses_reference_rate_only() {
        let rates = MockRates::new(&[(Currency::Usd, dec!(6000000))]);
        let (cache, _, _, rates) = setup(default_catalog(), rates).await;

        let record = cache.get_price("570", "BTC").await.unwrap();

        assert_eq!(record.price(Currency::Btc), dec!(83333.33));
        assert_eq!(rates.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cheap_title_in_pivot_currency_is_not_zero() {
        // 2.99 USD at 100000.00 USD per BTC
        let catalog = MockCatalog::new(&[("570", dec!(299)), ("730", dec!(1))]);
        let rates = MockRates::new(&[(Currency::Usd, dec!(10000000))]);
        let (cache, store, _, _) = setup(catalog, rates).await;

        let record = cache.get_price("570", "BTC").await.unwrap();
        assert_eq!(record.price(Currency::Btc), dec!(2990));
        assert!(!store.persisted("570").await.unwrap().price(Currency::Btc).is_zero());

        let record = cache.get_price("730", "BTC").await.unwrap();
        assert_eq!(record.price(Currency::Btc), dec!(10));
    }

    #[tokio::test]
    async fn test_amount_rounding_to_zero_is_an_error() {
        // one cent against an absurdly high reference rate
        let catalog = MockCatalog::new(&[("570", dec!(1)), ("730", dec!(1))]);
        let rates = MockRates::new(&[
            (Currency::Usd, dec!(1000000000000)),
            (Currency::Eur, dec!(8000)),
        ]);
        let (cache, store, _, _) = setup(catalog, rates).await;

        let err = cache.get_price("570", "EUR").await.unwrap_err();

        assert!(matches!(
            err,
            PriceError::RateUnavailable {
                currency: Currency::Eur,
                ..
            }
        ));
        assert_eq!(store.persisted("570").await.unwrap().price(Currency::Eur), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_second_call_skips_catalog_fetch() {
        let (cache, _, catalog, _) = setup(default_catalog(), standard_rates()).await;

        let first = cache.get_price("570", "EUR").await.unwrap();
        let second = cache.get_price("570", "EUR").await.unwrap();

        assert_eq!(first.price(Currency::Eur), second.price(Currency::Eur));
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let (cache, _, catalog, _) = setup(default_catalog(), standard_rates()).await;

        let err = cache.get_price("999", "EUR").await.unwrap_err();

        assert!(matches!(err, PriceError::NotFound(id) if id == "999"));
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_currency_writes_nothing() {
        let (cache, store, catalog, rates) = setup(default_catalog(), standard_rates()).await;

        let err = cache.get_price("570", "JPY").await.unwrap_err();

        assert!(matches!(err, PriceError::InvalidCurrency(code) if code == "JPY"));
        assert_eq!(catalog.calls(), 0);
        assert_eq!(rates.calls.load(Ordering::SeqCst), 0);
        let row = store.persisted("570").await.unwrap();
        assert!(!row.is_fetched());
        assert!(row.prices.values().all(|v| v.is_zero()));
    }

    #[tokio::test]
    async fn test_catalog_failure_leaves_no_partial_state() {
        let (cache, store, catalog, _) = setup(default_catalog(), standard_rates()).await;
        catalog.fail_next(PriceError::UpstreamUnavailable("connection refused".to_string()));

        let err = cache.get_price("570", "EUR").await.unwrap_err();

        assert!(matches!(err, PriceError::UpstreamUnavailable(_)));
        let live = cache.get_record("570").await.unwrap();
        assert!(!live.is_fetched());
        assert!(live.prices.values().all(|v| v.is_zero()));
        let row = store.persisted("570").await.unwrap();
        assert_eq!(row, live);

        // guard was released, next call succeeds
        let record = cache.get_price("570", "EUR").await.unwrap();
        assert_eq!(record.price(Currency::Eur), dec!(4000));
        assert_eq!(catalog.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_catalog_response_is_surfaced() {
        let (cache, _, catalog, _) = setup(default_catalog(), standard_rates()).await;
        catalog.fail_next(PriceError::MalformedResponse("bad json".to_string()));

        let err = cache.get_price("570", "USD").await.unwrap_err();
        assert!(matches!(err, PriceError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_rate_failure() {
        let rates = MockRates::new(&[(Currency::Usd, dec!(10000))]);
        let (cache, store, _, _) = setup(default_catalog(), rates).await;

        let err = cache.get_price("570", "RUB").await.unwrap_err();

        match err {
            PriceError::RateUnavailable { currency, source } => {
                assert_eq!(currency, Currency::Rub);
                assert!(matches!(*source, PriceError::UpstreamUnavailable(_)));
            }
            other => panic!("Expected RateUnavailable, got {other:?}"),
        }
        let row = store.persisted("570").await.unwrap();
        assert_eq!(row.price(Currency::Rub), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_reference_rate_failure() {
        let rates = MockRates::new(&[(Currency::Eur, dec!(8000))]);
        let (cache, _, _, _) = setup(default_catalog(), rates).await;

        let err = cache.convert(dec!(5000), Currency::Eur).await.unwrap_err();

        assert!(matches!(
            err,
            PriceError::RateUnavailable {
                currency: Currency::Usd,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_reference_rate_is_rejected() {
        let rates = MockRates::new(&[(Currency::Usd, Decimal::ZERO), (Currency::Eur, dec!(8000))]);
        let (cache, _, _, _) = setup(default_catalog(), rates).await;

        let err = cache.convert(dec!(5000), Currency::Eur).await.unwrap_err();
        assert!(matches!(err, PriceError::RateUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_zero_catalog_price_is_not_marked_fetched() {
        let catalog = MockCatalog::new(&[("570", Decimal::ZERO), ("730", dec!(1000))]);
        let (cache, _, catalog, _) = setup(catalog, standard_rates()).await;

        let record = cache.get_price("570", "USD").await.unwrap();
        assert!(!record.is_fetched());
        cache.get_price("570", "USD").await.unwrap();
        assert_eq!(catalog.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_calls_on_one_record_are_serialized() {
        let catalog = default_catalog().with_delay(Duration::from_millis(20));
        let rates = standard_rates().with_delay(Duration::from_millis(5));
        let (cache, store, catalog, _) = setup(catalog, rates).await;
        let cache = Arc::new(cache);

        let eur = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_price("570", "EUR").await })
        };
        let rub = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_price("570", "RUB").await })
        };
        let eur = eur.await.unwrap().unwrap();
        let rub = rub.await.unwrap().unwrap();

        // the second call saw the base price written by the first
        assert_eq!(catalog.calls(), 1);
        assert_eq!(eur.base_price, dec!(5000));
        assert_eq!(rub.base_price, dec!(5000));

        let row = store.persisted("570").await.unwrap();
        assert_eq!(row.price(Currency::Eur), dec!(4000));
        assert_eq!(row.price(Currency::Rub), dec!(450000));
        assert_eq!(row, cache.get_record("570").await.unwrap());
    }

    #[tokio::test]
    async fn test_many_concurrent_calls_fetch_once() {
        let catalog = default_catalog().with_delay(Duration::from_millis(10));
        let (cache, _, catalog, _) = setup(catalog, standard_rates()).await;

        let calls = (0..8).map(|i| {
            let currency = Currency::ALL[i % Currency::ALL.len()].code();
            cache.get_price("570", currency)
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(catalog.calls(), 1);
        let record = cache.get_record("570").await.unwrap();
        assert_eq!(record.price(Currency::Usd), dec!(5000));
        assert_eq!(record.price(Currency::Eur), dec!(4000));
        assert_eq!(record.price(Currency::Btc), dec!(50000000));
    }

    #[tokio::test]
    async fn test_clear_resets_exactly_one_record() {
        let (cache, store, catalog, _) = setup(default_catalog(), standard_rates()).await;
        cache.get_price("570", "EUR").await.unwrap();
        cache.get_price("570", "USD").await.unwrap();
        cache.get_price("730", "EUR").await.unwrap();
        let other_before = store.persisted("730").await.unwrap();

        cache.clear_price("570").await.unwrap();

        let cleared = cache.get_record("570").await.unwrap();
        assert!(!cleared.is_fetched());
        assert!(cleared.prices.values().all(|v| v.is_zero()));
        assert_eq!(store.persisted("570").await.unwrap(), cleared);
        assert_eq!(store.persisted("730").await.unwrap(), other_before);
        assert_eq!(cache.get_record("730").await.unwrap(), other_before);

        // cleared record is fetched again on demand
        cache.get_price("570", "EUR").await.unwrap();
        assert_eq!(catalog.calls(), 3);
    }

    #[tokio::test]
    async fn test_clear_persists_in_one_write() {
        let store = Arc::new(CountingStore {
            inner: MemoryRecordStore::new(),
            writes: AtomicUsize::new(0),
        });
        store
            .reset_all(&[CatalogItem {
                item_id: "570".to_string(),
                name: "Dota 2".to_string(),
            }])
            .await
            .unwrap();
        let cache = PriceCache::new(
            store.clone(),
            Arc::new(default_catalog()),
            Arc::new(standard_rates()),
        );
        cache.get_price("570", "EUR").await.unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);

        cache.clear_price("570").await.unwrap();

        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
        let row = store.inner.persisted("570").await.unwrap();
        assert!(!row.is_fetched());
        assert!(row.prices.values().all(|v| v.is_zero()));
    }

    #[tokio::test]
    async fn test_clear_unknown_item() {
        let (cache, _, _, _) = setup(default_catalog(), standard_rates()).await;
        let err = cache.clear_price("999").await.unwrap_err();
        assert!(matches!(err, PriceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_storage_fault_reports_in_memory_record() {
        let memory = MemoryRecordStore::new();
        memory
            .reset_all(&[CatalogItem {
                item_id: "570".to_string(),
                name: "Dota 2".to_string(),
            }])
            .await
            .unwrap();
        let cache = PriceCache::new(
            Arc::new(FailingStore(memory)),
            Arc::new(default_catalog()),
            Arc::new(standard_rates()),
        );

        let err = cache.get_price("570", "EUR").await.unwrap_err();

        let record = err.unpersisted_record().expect("record attached");
        assert_eq!(record.price(Currency::Eur), dec!(4000));
        assert!(err.to_string().contains("base_price, EUR"));
        // in-memory value is kept
        let live = cache.get_record("570").await.unwrap();
        assert_eq!(live.price(Currency::Eur), dec!(4000));

        let err = cache.clear_price("570").await.unwrap_err();
        assert!(matches!(err, PriceError::StorageFault { .. }));
        assert!(!cache.get_record("570").await.unwrap().is_fetched());
    }

    #[tokio::test]
    async fn test_upstream_timeout() {
        let catalog = default_catalog().with_delay(Duration::from_millis(200));
        let (cache, _, _, _) = setup(catalog, standard_rates()).await;
        let cache = cache.with_upstream_timeout(Duration::from_millis(10));

        let err = cache.get_price("570", "USD").await.unwrap_err();
        assert!(matches!(err, PriceError::UpstreamUnavailable(_)));
        assert!(!cache.get_record("570").await.unwrap().is_fetched());
    }

    #[tokio::test]
    async fn test_rate_timeout() {
        let rates = standard_rates().with_delay(Duration::from_millis(200));
        let (cache, _, _, _) = setup(default_catalog(), rates).await;
        let cache = cache.with_upstream_timeout(Duration::from_millis(10));

        let err = cache.get_price("570", "EUR").await.unwrap_err();
        assert!(matches!(err, PriceError::RateUnavailable { .. }));
    }
}
