use super::util::{get_text, http_client, with_retry};
use crate::core::config::CatalogProviderConfig;
use crate::core::currency::Currency;
use crate::core::error::PriceError;
use crate::core::price::{CatalogItem, CatalogSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

const CATALOG_RETRIES: usize = 3;
const CATALOG_RETRY_DELAY: Duration = Duration::from_millis(500);

// Steam store catalog: per-title prices and the full app list
pub struct SteamCatalogProvider {
    store_url: String,
    api_url: String,
    country: String,
    client: reqwest::Client,
}

impl SteamCatalogProvider {
    pub fn new(config: &CatalogProviderConfig, timeout: Duration) -> Result<Self, PriceError> {
        Ok(SteamCatalogProvider {
            store_url: config.store_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AppDetailsEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<AppData>,
}

// Titles without a price come back with `"data": []`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AppData {
    Details(AppDetails),
    Empty(Vec<serde_json::Value>),
}

#[derive(Debug, Deserialize)]
struct AppDetails {
    price_overview: Option<PriceOverview>,
}

#[derive(Debug, Deserialize)]
struct PriceOverview {
    currency: String,
    #[serde(rename = "final")]
    final_price: i64,
}

#[derive(Debug, Deserialize)]
struct AppListResponse {
    applist: AppList,
}

#[derive(Debug, Deserialize)]
struct AppList {
    apps: Vec<AppEntry>,
}

#[derive(Debug, Deserialize)]
struct AppEntry {
    appid: u64,
    name: String,
}

#[async_trait]
impl CatalogSource for SteamCatalogProvider {
    #[instrument(name = "SteamPriceFetch", skip(self), fields(item_id = %item_id))]
    async fn fetch_price(&self, item_id: &str) -> Result<Decimal, PriceError> {
        let url = format!(
            "{}/api/appdetails?appids={}&cc={}&filters=price_overview",
            self.store_url, item_id, self.country
        );
        let body = get_text(&self.client, &url).await?;

        let mut details: HashMap<String, AppDetailsEnvelope> = serde_json::from_str(&body)
            .map_err(|e| {
                error!(error = ?e, response = %body, "Failed to parse app details response");
                PriceError::MalformedResponse(format!(
                    "Failed to parse app details for item {item_id}: {e}"
                ))
            })?;

        let envelope = details
            .remove(item_id)
            .ok_or_else(|| PriceError::NotFound(item_id.to_string()))?;
        if !envelope.success {
            return Err(PriceError::NotFound(item_id.to_string()));
        }

        let overview = match envelope.data {
            Some(AppData::Details(AppDetails {
                price_overview: Some(overview),
            })) => overview,
            _ => {
                debug!("No price overview for item {}", item_id);
                return Err(PriceError::NotFound(item_id.to_string()));
            }
        };

        if !overview
            .currency
            .eq_ignore_ascii_case(Currency::REFERENCE.code())
        {
            return Err(PriceError::MalformedResponse(format!(
                "Item {} priced in {}, expected {}",
                item_id,
                overview.currency,
                Currency::REFERENCE
            )));
        }
        if overview.final_price < 0 {
            return Err(PriceError::MalformedResponse(format!(
                "Negative price {} for item {}",
                overview.final_price, item_id
            )));
        }

        debug!("Fetched price {} for item {}", overview.final_price, item_id);
        Ok(Decimal::from(overview.final_price))
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, PriceError> {
        let url = format!("{}/ISteamApps/GetAppList/v2", self.api_url);
        debug!("Requesting catalog from {}", url);

        let body = with_retry(
            || get_text(&self.client, &url),
            CATALOG_RETRIES,
            CATALOG_RETRY_DELAY,
        )
        .await?;

        let data: AppListResponse = serde_json::from_str(&body).map_err(|e| {
            PriceError::MalformedResponse(format!("Failed to parse catalog response: {e}"))
        })?;

        Ok(data
            .applist
            .apps
            .into_iter()
            .map(|app| CatalogItem {
                item_id: app.appid.to_string(),
                name: app.name,
            })
            .collect())
    }
}
