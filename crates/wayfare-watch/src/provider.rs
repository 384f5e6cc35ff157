//! Flight-status provider queries. Every failure mode folds into a typed
//! result; this module never raises past its boundary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const DEFAULT_URL: &str = "http://api.aviationstack.com/v1/flights";
const FETCH_TIMEOUT: Duration = Duration::from_secs(25);

/// Outcome of one provider query.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusFetch {
    /// The provider's `data` array (possibly empty).
    Data(Vec<Value>),
    /// Missing key, non-200 status, unparseable body, or transport failure.
    Failed(String),
}

/// A source of flight-status data. Trait seam so the engine can be
/// exercised without the live provider.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, flight_code: &str, flight_date: Option<&str>) -> StatusFetch;
}

/// aviationstack client.
pub struct AviationstackClient {
    http: Client,
    access_key: Option<String>,
    base_url: String,
}

impl AviationstackClient {
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            access_key,
            base_url: DEFAULT_URL.to_string(),
        }
    }

    /// Point at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl StatusSource for AviationstackClient {
    async fn fetch(&self, flight_code: &str, flight_date: Option<&str>) -> StatusFetch {
        let access_key = match self.access_key.as_deref() {
            Some(key) => key,
            None => return StatusFetch::Failed("missing provider access key".into()),
        };

        let mut query: Vec<(&str, &str)> =
            vec![("access_key", access_key), ("flight_iata", flight_code)];
        if let Some(date) = flight_date {
            query.push(("flight_date", date));
        }

        debug!("Fetching status for {} ({:?})", flight_code, flight_date);
        let response = match self
            .http
            .get(&self.base_url)
            .query(&query)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return StatusFetch::Failed(format!("provider request failed: {}", e)),
        };

        if !response.status().is_success() {
            return StatusFetch::Failed(format!("provider HTTP {}", response.status()));
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return StatusFetch::Failed(format!("provider JSON parse: {}", e)),
        };

        let data = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        StatusFetch::Data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_typed_failure() {
        let client = AviationstackClient::new(None);
        match client.fetch("LY81", None).await {
            StatusFetch::Failed(reason) => assert!(reason.contains("access key")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
