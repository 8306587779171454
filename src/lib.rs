pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use crate::core::config;

use crate::core::{CatalogSource, PriceCache, RateSource};
use crate::providers::{CachingRateSource, HttpRateProvider, SteamCatalogProvider};
use crate::store::{DiskRecordStore, RecordStore};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    /// Price one or more items in a currency
    Price {
        currency: String,
        item_ids: Vec<String>,
    },
    /// Show the stored prices of an item
    Show { item_id: String },
    /// Zero the stored prices of an item
    Clear { item_id: String },
    /// Recreate every record from the catalog
    Reset,
}

struct App {
    store: Arc<dyn RecordStore>,
    catalog: Arc<dyn CatalogSource>,
    cache: PriceCache,
}

impl App {
    async fn build(config: &config::AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?.join("records");
        let store: Arc<dyn RecordStore> = Arc::new(DiskRecordStore::open(&data_path).await?);

        let timeout = config.upstream_timeout();
        let catalog: Arc<dyn CatalogSource> = Arc::new(SteamCatalogProvider::new(
            &config.providers.catalog,
            timeout,
        )?);
        let http_rates = HttpRateProvider::new(&config.providers.rates, timeout)?;
        let rates: Arc<dyn RateSource> = match config.rate_cache_ttl() {
            Some(ttl) => Arc::new(CachingRateSource::new(http_rates, ttl)),
            None => Arc::new(http_rates),
        };

        let cache = PriceCache::new(store.clone(), catalog.clone(), rates)
            .with_upstream_timeout(timeout);
        Ok(Self {
            store,
            catalog,
            cache,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("gameprice starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::build(&config).await?;
    match command {
        AppCommand::Price { currency, item_ids } => price_items(&app, &currency, &item_ids).await,
        AppCommand::Show { item_id } => {
            let record = app.cache.get_record(&item_id).await?;
            println!("{}", record.display_as_table());
            Ok(())
        }
        AppCommand::Clear { item_id } => {
            app.cache.clear_price(&item_id).await?;
            println!("Cleared prices of {item_id}");
            Ok(())
        }
        AppCommand::Reset => reset_records(&app).await,
    }
}

/// Prices each item concurrently; records are independent so only calls
/// for the same item wait on each other.
async fn price_items(app: &App, currency: &str, item_ids: &[String]) -> Result<()> {
    let results = join_all(
        item_ids
            .iter()
            .map(|item_id| app.cache.get_price(item_id, currency)),
    )
    .await;

    let mut failures = 0;
    for (item_id, result) in item_ids.iter().zip(results) {
        match result {
            Ok(record) => println!("{}\n", record.display_as_table()),
            Err(e) => {
                if let Some(record) = e.unpersisted_record() {
                    warn!(item_id = %item_id, error = %e, "Price computed but not stored");
                    println!("{}\n", record.display_as_table());
                }
                eprintln!("{}", cli::record::display_error(item_id, &e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} items could not be priced", failures, item_ids.len());
    }
    Ok(())
}

async fn reset_records(app: &App) -> Result<()> {
    let spinner = cli::ui::new_spinner("Fetching catalog");
    let snapshot = app.catalog.fetch_catalog().await;
    spinner.finish_and_clear();
    let snapshot = snapshot.context("Failed to fetch catalog snapshot")?;

    let count = app
        .store
        .reset_all(&snapshot)
        .await
        .context("Failed to reset records")?;
    info!("Reset {} records", count);
    println!("Created {count} price records");
    Ok(())
}
