use crate::core::error::PriceError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "gameprice/0.1";

/// Runs `operation` up to `1 + retries` times, sleeping `delay` between
/// attempts. Only `UpstreamUnavailable` failures are retried; any other error
/// is returned as soon as it occurs.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay: Duration,
) -> Result<T, PriceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PriceError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err @ PriceError::UpstreamUnavailable(_)) if attempt < retries => {
                attempt += 1;
                debug!(attempt, retries, error = %err, "Upstream unavailable, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Shared HTTP client for the upstream providers.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, PriceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| PriceError::UpstreamUnavailable(format!("Failed to build HTTP client: {e}")))
}

/// Sends a GET request and returns the body of a successful response.
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, PriceError> {
    debug!("Requesting {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PriceError::UpstreamUnavailable(format!("Request error: {e} for URL: {url}")))?;

    if !response.status().is_success() {
        return Err(PriceError::UpstreamUnavailable(format!(
            "HTTP error: {} for URL: {}",
            response.status(),
            url
        )));
    }

    response.text().await.map_err(|e| {
        PriceError::UpstreamUnavailable(format!("Failed to read response from {url}: {e}"))
    })
}
