use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for a whole harvest run. Every request carries the
/// same timeout so a stalled page cannot hang the run indefinitely.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// GET one listing page and return its HTML body.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, Error> {
    debug!("GET {}", url);
    let response = client.get(url).send().await.map_err(|e| Error::Fetch {
        url: url.to_string(),
        source: e,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    response.text().await.map_err(|e| Error::Fetch {
        url: url.to_string(),
        source: e,
    })
}
