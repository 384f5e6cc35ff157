//! Structured AI extraction over an OpenAI-compatible completion endpoint.
//!
//! The model is asked for strict JSON but never trusted to return only
//! JSON: the first `{` / last `}` slice is parsed, and every failure mode
//! degrades to an empty outcome carrying a typed reason. Nothing here
//! escalates an error to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::candidates::{candidates_from_json, BookingCandidates};

/// Character budget applied to raw text before it is sent to the model.
pub const TEXT_BUDGET: usize = 8000;

const TEXT_TIMEOUT: Duration = Duration::from_secs(25);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

const TEXT_SYSTEM_PROMPT: &str = "Extract flight and hotel details from booking text.\n\
Return STRICT JSON: { flights: [ {origin,dest,depart_date,depart_time,arrival_date,arrival_time,airline,flight_number,pnr,passengers} ],\
  hotels: [ {hotel_name,city,checkin_date,checkout_date,address} ] }.\n\
Dates in YYYY-MM-DD, times HH:MM 24h. Fill only known fields. If nothing, return empty arrays.";

const IMAGE_SYSTEM_PROMPT: &str = "You read images of tickets/hotel confirmations and return STRICT JSON as: \
{ flights:[{origin,dest,depart_date,depart_time,arrival_date,arrival_time,airline,flight_number,pnr,passengers}],\
  hotels:[{hotel_name,city,checkin_date,checkout_date,address}] } (YYYY-MM-DD, HH:MM).";

/// Why an extraction produced nothing. Distinguished for logs and tests;
/// callers treat every variant the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// No API key configured; extraction is disabled.
    NotConfigured,
    /// The completion service reported a rate-limit condition.
    RateLimited,
    /// Transport failure: timeout, connection error, non-2xx status.
    Transport(String),
    /// The response contained no parseable JSON object.
    Malformed(String),
}

/// The outcome of one extraction call: candidates, or a typed empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Extracted(BookingCandidates),
    Empty(EmptyReason),
}

impl ExtractOutcome {
    /// Candidate lists plus the reason they are empty, if any.
    pub fn into_parts(self) -> (BookingCandidates, Option<EmptyReason>) {
        match self {
            Self::Extracted(candidates) => (candidates, None),
            Self::Empty(reason) => (BookingCandidates::default(), Some(reason)),
        }
    }
}

/// Structured extraction over text or an image reference. Trait seam so the
/// indexer can be exercised without a live completion service.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn extract_text(&self, text: &str) -> ExtractOutcome;
    async fn extract_image(&self, image_url: &str, hint: &str) -> ExtractOutcome;
}

/// Completion-service client for structured booking extraction.
pub struct CompletionClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point at a different endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// One deterministic completion call. Returns the assistant text, or the
    /// reason there is none.
    async fn complete(
        &self,
        messages: Value,
        timeout: Duration,
    ) -> std::result::Result<String, EmptyReason> {
        let api_key = self.api_key.as_deref().ok_or(EmptyReason::NotConfigured)?;

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.0,
        });

        debug!("Completion call: model={}", self.model);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| EmptyReason::Transport(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmptyReason::RateLimited);
        }
        if !response.status().is_success() {
            return Err(EmptyReason::Transport(format!(
                "completion API status {}",
                response.status()
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| EmptyReason::Transport(e.to_string()))?;
        Ok(parsed["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string())
    }

    fn outcome_from_content(content: &str) -> ExtractOutcome {
        let sliced = match slice_json_object(content) {
            Some(s) => s,
            None => {
                return ExtractOutcome::Empty(EmptyReason::Malformed(
                    "no JSON object in response".into(),
                ))
            }
        };
        match serde_json::from_str::<Value>(sliced) {
            Ok(value) => ExtractOutcome::Extracted(candidates_from_json(&value)),
            Err(e) => ExtractOutcome::Empty(EmptyReason::Malformed(e.to_string())),
        }
    }
}

#[async_trait]
impl StructuredExtractor for CompletionClient {
    async fn extract_text(&self, text: &str) -> ExtractOutcome {
        let messages = json!([
            {"role": "system", "content": TEXT_SYSTEM_PROMPT},
            {"role": "user", "content": truncate_chars(text, TEXT_BUDGET)},
        ]);
        match self.complete(messages, TEXT_TIMEOUT).await {
            Ok(content) => Self::outcome_from_content(&content),
            Err(reason) => {
                warn!("Text extraction empty: {:?}", reason);
                ExtractOutcome::Empty(reason)
            }
        }
    }

    async fn extract_image(&self, image_url: &str, hint: &str) -> ExtractOutcome {
        let messages = json!([
            {"role": "system", "content": IMAGE_SYSTEM_PROMPT},
            {"role": "user", "content": [
                {"type": "text", "text": hint},
                {"type": "image_url", "image_url": {"url": image_url}},
            ]},
        ]);
        match self.complete(messages, IMAGE_TIMEOUT).await {
            Ok(content) => Self::outcome_from_content(&content),
            Err(reason) => {
                warn!("Image extraction empty: {:?}", reason);
                ExtractOutcome::Empty(reason)
            }
        }
    }
}

/// The substring from the first `{` to the last `}`, if both exist.
fn slice_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&s[start..=end])
}

/// Truncate on a character boundary, at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
