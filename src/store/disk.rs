use super::{RecordHandle, RecordIndex, RecordStore};
use crate::core::error::PriceError;
use crate::core::price::{CatalogItem, PriceField, PriceRecord, RecordKey};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, warn};

const RECORDS_PARTITION: &str = "records";

/// Record store persisting one JSON row per record in a fjall partition,
/// keyed by record key. Rows are loaded into live records on open.
pub struct DiskRecordStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    index: RecordIndex,
}

impl DiskRecordStore {
    pub async fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open record store at {}", path.display()))?;
        let partition =
            keyspace.open_partition(RECORDS_PARTITION, PartitionCreateOptions::default())?;

        let mut records = Vec::new();
        for entry in partition.iter() {
            let (_, value) = entry?;
            let record: PriceRecord =
                serde_json::from_slice(&value).context("Failed to decode stored record")?;
            records.push(record);
        }

        let index = RecordIndex::default();
        let count = index.replace(records).await;
        debug!("Loaded {} records from {}", count, path.display());

        Ok(Self {
            keyspace,
            partition,
            index,
        })
    }

    /// Rewrites the row of `key` with `fields` applied, as one synced write.
    /// Runs on the blocking pool so the fsync does not stall the runtime.
    async fn write_fields(&self, key: RecordKey, fields: Vec<(PriceField, Decimal)>) -> Result<()> {
        let keyspace = self.keyspace.clone();
        let partition = self.partition.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let row_key = key.to_string();
            let raw = partition
                .get(&row_key)?
                .ok_or_else(|| anyhow!("No stored row for key: {key}"))?;
            let mut row: PriceRecord = serde_json::from_slice(&raw)?;
            for (field, value) in fields {
                row.set_field(field, value);
            }
            partition.insert(row_key.as_bytes(), serde_json::to_vec(&row)?)?;
            keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })
        .await
        .context("Record write task failed")?
    }

    fn replace_rows(&self, records: &[PriceRecord]) -> Result<()> {
        let mut stale = Vec::new();
        for entry in self.partition.iter() {
            let (key, _) = entry?;
            stale.push(key);
        }
        for key in stale {
            self.partition.remove(key)?;
        }
        for record in records {
            self.partition.insert(
                record.record_key.to_string().as_bytes(),
                serde_json::to_vec(record)?,
            )?;
        }
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for DiskRecordStore {
    async fn get(&self, item_id: &str) -> Option<RecordHandle> {
        let handle = self.index.get(item_id).await;
        if handle.is_none() {
            debug!("Record MISS for item: {}", item_id);
        }
        handle
    }

    async fn set_field(&self, key: &RecordKey, field: PriceField, value: Decimal) -> bool {
        match self.write_fields(*key, vec![(field, value)]).await {
            Ok(()) => {
                debug!("Record SET {} = {} for key: {}", field, value, key);
                true
            }
            Err(e) => {
                warn!(error = %e, %key, %field, "Failed to persist record field");
                false
            }
        }
    }

    async fn set_fields(&self, key: &RecordKey, fields: &[(PriceField, Decimal)]) -> bool {
        match self.write_fields(*key, fields.to_vec()).await {
            Ok(()) => {
                debug!("Record SET {} fields for key: {}", fields.len(), key);
                true
            }
            Err(e) => {
                warn!(error = %e, %key, "Failed to persist record fields");
                false
            }
        }
    }

    async fn reset_all(&self, snapshot: &[CatalogItem]) -> Result<usize, PriceError> {
        let records: Vec<PriceRecord> = snapshot
            .iter()
            .map(|item| PriceRecord::new(&item.item_id, &item.name))
            .collect();

        self.replace_rows(&records)
            .map_err(|e| PriceError::StorageFault {
                reason: format!("Failed to reset records: {e}"),
                record: None,
            })?;

        let count = self.index.replace(records).await;
        debug!("Record store RESET with {} records", count);
        Ok(count)
    }
}
