use super::{RecordHandle, RecordIndex, RecordStore};
use crate::core::error::PriceError;
use crate::core::price::{CatalogItem, PriceField, PriceRecord, RecordKey};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory record store. Rows written by `set_field` are kept apart from
/// the live records so callers can see what was actually persisted.
#[derive(Default)]
pub struct MemoryRecordStore {
    index: RecordIndex,
    rows: Mutex<HashMap<RecordKey, PriceRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persisted row of `item_id`, as last written.
    pub async fn persisted(&self, item_id: &str) -> Option<PriceRecord> {
        let handle = self.index.get(item_id).await?;
        let key = handle.lock().await.record_key;
        self.rows.lock().await.get(&key).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, item_id: &str) -> Option<RecordHandle> {
        let handle = self.index.get(item_id).await;
        if handle.is_none() {
            debug!("Record MISS for item: {}", item_id);
        }
        handle
    }

    async fn set_field(&self, key: &RecordKey, field: PriceField, value: Decimal) -> bool {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(key) {
            Some(row) => {
                row.set_field(field, value);
                debug!("Record SET {} = {} for key: {}", field, value, key);
                true
            }
            None => {
                debug!("Record SET failed, no row for key: {}", key);
                false
            }
        }
    }

    async fn reset_all(&self, snapshot: &[CatalogItem]) -> Result<usize, PriceError> {
        let records: Vec<PriceRecord> = snapshot
            .iter()
            .map(|item| PriceRecord::new(&item.item_id, &item.name))
            .collect();

        let mut rows = self.rows.lock().await;
        rows.clear();
        rows.extend(records.iter().map(|r| (r.record_key, r.clone())));
        let count = self.index.replace(records).await;
        debug!("Record store RESET with {} records", count);
        Ok(count)
    }
}
