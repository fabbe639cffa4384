//! HTTP fetching for the source playlist and logo files

use crate::config::{Config, RetryConfig};
use crate::error::{AssetError, Error, Result};
use crate::mirror::AssetFetcher;
use crate::retry::{IsRetryable, with_retry};
use bytes::Bytes;
use thiserror::Error;

/// Why a single playlist fetch attempt failed
#[derive(Debug, Error)]
enum AttemptError {
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("response is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

impl IsRetryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            // An unbuildable request (bad URL) fails the same way every time
            AttemptError::Request(e) => !e.is_builder(),
            AttemptError::Status(_) | AttemptError::Decode(_) => true,
        }
    }
}

/// Shared HTTP client carrying the configured timeout and User-Agent
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Build a client from the run configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    /// Fetch the source playlist as UTF-8 text, retrying with backoff
    ///
    /// Exhausting every attempt returns [`Error::Fetch`], which aborts the run.
    pub async fn fetch_playlist(&self, url: &str) -> Result<String> {
        tracing::info!(url, "fetching playlist");

        let outcome = with_retry(&self.retry, || self.fetch_text_once(url)).await;
        match outcome.result {
            Ok(text) => {
                tracing::info!(chars = text.chars().count(), "fetched playlist");
                Ok(text)
            }
            Err(e) => Err(Error::Fetch {
                url: url.to_string(),
                attempts: outcome.attempts,
                message: e.to_string(),
            }),
        }
    }

    async fn fetch_text_once(&self, url: &str) -> std::result::Result<String, AttemptError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }
        let body = response.bytes().await?;
        Ok(String::from_utf8(body.to_vec())?)
    }
}

#[async_trait::async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch_asset(&self, url: &str) -> std::result::Result<Bytes, AssetError> {
        let network = |source| AssetError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.bytes().await.map_err(network)
    }
}
