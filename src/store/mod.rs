pub mod disk;
pub mod memory;

use crate::core::error::PriceError;
use crate::core::price::{CatalogItem, PriceField, PriceRecord, RecordKey};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub use disk::DiskRecordStore;
pub use memory::MemoryRecordStore;

/// Live price record. The mutex is the record guard: hold it for the whole
/// read-modify-write of a record and while copying it out to a caller.
pub type RecordHandle = Arc<Mutex<PriceRecord>>;

/// Key-value persistence of price records, keyed by item identifier.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Live handle to the record for `item_id`.
    async fn get(&self, item_id: &str) -> Option<RecordHandle>;

    /// Persists one field. Returns `false` on a storage fault.
    async fn set_field(&self, key: &RecordKey, field: PriceField, value: Decimal) -> bool;

    /// Persists several fields of one record. Returns `false` if any of them
    /// was not persisted.
    async fn set_fields(&self, key: &RecordKey, fields: &[(PriceField, Decimal)]) -> bool {
        let mut persisted = true;
        for (field, value) in fields {
            persisted &= self.set_field(key, *field, *value).await;
        }
        persisted
    }

    /// Drops every record and creates a zeroed one per snapshot item.
    async fn reset_all(&self, snapshot: &[CatalogItem]) -> Result<usize, PriceError>;
}

/// Item identifier to live record lookup shared by the store implementations.
#[derive(Default)]
pub(crate) struct RecordIndex {
    records: RwLock<HashMap<String, RecordHandle>>,
}

impl RecordIndex {
    pub(crate) async fn get(&self, item_id: &str) -> Option<RecordHandle> {
        self.records.read().await.get(item_id).cloned()
    }

    pub(crate) async fn replace(&self, records: impl IntoIterator<Item = PriceRecord>) -> usize {
        let mut index = self.records.write().await;
        index.clear();
        for record in records {
            index.insert(record.item_id.clone(), Arc::new(Mutex::new(record)));
        }
        index.len()
    }
}
