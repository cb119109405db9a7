use std::time::Duration;

use log::{debug, error};
use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out fetching {0}")]
    Timeout(String),

    #[error("Image request to {url} failed with status: {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Downloads the source photo and logo for a composite.
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new(timeout: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!("{}: unsupported scheme", url)));
        }

        debug!("Fetching image {}", url);

        let response = self
            .client
            .get(parsed)
            .header("Accept", "image/avif,image/webp,image/png,image/jpeg,image/*;q=0.8,*/*;q=0.5")
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            error!("Image request to {} failed with status: {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| Self::classify(url, e))?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);

        Ok(bytes.to_vec())
    }

    fn classify(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            error!("Timed out fetching {}", url);
            FetchError::Timeout(url.to_string())
        } else {
            error!("Network error fetching {}: {}", url, err);
            FetchError::Network {
                url: url.to_string(),
                source: err,
            }
        }
    }
}
