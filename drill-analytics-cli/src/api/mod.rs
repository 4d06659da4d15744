use anyhow::{Context, Result};
use async_trait::async_trait;
use drill_analytics::models::VideoSource;
use drill_analytics::services::HeightEstimator;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ApiConfig;

mod error;
mod retry;

pub use error::ApiError;
pub use retry::RetryConfig;

/// Body returned by `POST /estimate_height`
#[derive(Debug, Deserialize)]
pub struct HeightResponse {
    pub estimated_height: Option<f64>,
    pub error: Option<String>,
}

/// Client for the remote height estimation service
pub struct HttpHeightEstimator {
    client: Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl HttpHeightEstimator {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_retry_config(config, RetryConfig::with_max_retries(config.max_retries))
    }

    pub fn with_retry_config(config: &ApiConfig, retry_config: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_config,
        })
    }

    /// Upload the video and return the athlete's height in meters
    pub async fn estimate(&self, source: &VideoSource) -> Result<f64> {
        let url = format!("{}/estimate_height", self.base_url);

        tracing::debug!(
            "Requesting height estimate for {} ({} bytes)",
            source.name,
            source.data.len()
        );

        let height = self
            .retry_config
            .execute(|| async {
                let part = Part::bytes(source.data.to_vec()).file_name(source.name.clone());
                let form = Form::new().part("video", part);

                let response = self
                    .client
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .context("Failed to send height estimation request")?;

                let status = response.status();
                let body = response.text().await.unwrap_or_default();

                if !status.is_success() {
                    let message = serde_json::from_str::<HeightResponse>(&body)
                        .ok()
                        .and_then(|parsed| parsed.error)
                        .unwrap_or(body);
                    return Err(ApiError::from_status(status, message).into());
                }

                let parsed: HeightResponse = serde_json::from_str(&body)
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

                match (parsed.estimated_height, parsed.error) {
                    (Some(height), _) => Ok(height),
                    (None, Some(error)) => Err(ApiError::EstimationFailed(error).into()),
                    (None, None) => Err(ApiError::InvalidResponse(
                        "missing estimated_height".to_string(),
                    )
                    .into()),
                }
            })
            .await?;

        tracing::info!("Estimated athlete height: {:.2} m", height);
        Ok(height)
    }
}

#[async_trait]
impl HeightEstimator for HttpHeightEstimator {
    async fn estimate_height(&self, source: &VideoSource) -> Result<f64> {
        self.estimate(source).await
    }
}

/// Height supplied on the command line or fetched from the service
pub enum HeightSource {
    Fixed(f64),
    Remote(HttpHeightEstimator),
}

#[async_trait]
impl HeightEstimator for HeightSource {
    async fn estimate_height(&self, source: &VideoSource) -> Result<f64> {
        match self {
            HeightSource::Fixed(height) => Ok(*height),
            HeightSource::Remote(client) => client.estimate(source).await,
        }
    }
}
