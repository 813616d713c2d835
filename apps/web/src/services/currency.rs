//! Exchange rates for the inventory view.
//!
//! One lookup per page view with a non-base currency. No retries, no cache.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Source of `base → target` conversion rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Units of `target` per one unit of `base`.
    async fn rate(&self, base: &str, target: &str) -> ApiResult<f64>;
}

/// Client for the Frankfurter API (`GET {url}/latest?from=CAD&to=USD`).
pub struct FrankfurterClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

impl FrankfurterClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        FrankfurterClient {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RateProvider for FrankfurterClient {
    async fn rate(&self, base: &str, target: &str) -> ApiResult<f64> {
        if base.eq_ignore_ascii_case(target) {
            return Ok(1.0);
        }

        let url = format!("{}/latest", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("from", base), ("to", target)])
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("exchange rate request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Upstream(format!("exchange rate service answered {status}")));
        }

        let body: LatestRates = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("unreadable exchange rate response: {e}")))?;

        let rate = body
            .rates
            .get(target)
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or_else(|| ApiError::Upstream(format!("no rate for {base} -> {target}")))?;

        debug!(base, target, rate, "Fetched exchange rate");
        Ok(rate)
    }
}
