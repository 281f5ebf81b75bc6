//! HTTP client for the profile feed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::models::{ProfilesResponse, RemoteProfile};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Endpoint serving paginated profile batches.
const API_BASE_URL: &str = "https://randomuser.me/api/";

/// HTTP request timeout in seconds. A fetch either completes, fails, or
/// times out against this deadline; the caller retries manually.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fixed seed so the same page always returns the same batch, which keeps
/// the merge idempotent across restarts.
const FEED_SEED: &str = "matchmate";

/// Source of paginated profile batches. Pure request/response, no state.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_page(&self, page: i64, results: i64) -> Result<Vec<RemoteProfile>, ApiError>;
}

/// Feed client. Clone is cheap - reqwest::Client uses Arc internally for
/// connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ProfileSource for ApiClient {
    async fn fetch_page(&self, page: i64, results: i64) -> Result<Vec<RemoteProfile>, ApiError> {
        debug!(page, results, "Requesting profile page");

        let response = self
            .client
            .get(API_BASE_URL)
            .query(&[
                ("page", page.to_string()),
                ("results", results.to_string()),
                ("seed", FEED_SEED.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadStatus(status));
        }

        let body: ProfilesResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        debug!(page, count = body.results.len(), "Profile page received");
        Ok(body.results)
    }
}
