use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, time::Duration};

pub const STATUS_AVAILABLE: &str = "available";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SOLD: &str = "sold";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// The pet record exchanged with the API. Field names follow the wire
/// format of the pet store service (`photoUrls` in particular).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(rename = "photoUrls", default)]
    pub photo_urls: Vec<String>,
    pub status: String,
}

impl Pet {
    pub fn to_value(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A single request to the target API. Immutable once built; the `with_*`
/// methods consume and return the intent so construction reads as a chain.
///
/// The endpoint label is the aggregation key for stability records, so it
/// keeps path parameters symbolic (`GET /pet/{petId}` rather than the
/// concrete id).
#[derive(Debug, Clone)]
pub struct RequestIntent {
    method: String,
    path: String,
    endpoint: String,
    headers: HashMap<String, String>,
    body: Option<Value>,
}

impl RequestIntent {
    pub fn new<M: Into<String>, P: Into<String>, E: Into<String>>(
        method: M,
        path: P,
        endpoint: E,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// What one attempt brought back from the wire, before any retry decision.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: String,
}

/// The final result of a logical call: the last usable response together
/// with how long the whole attempt sequence took and how many attempts it
/// needed. Consumed by scenario assertions and recorded by the tracker.
#[derive(Debug, Clone)]
pub struct ResponseOutcome {
    status_code: u16,
    body_text: String,
    body_json: Option<Value>,
    elapsed: Duration,
    attempts: u32,
}

impl ResponseOutcome {
    pub(crate) fn from_raw(raw: RawResponse, elapsed: Duration, attempts: u32) -> Self {
        let body_json = serde_json::from_str(&raw.body).ok();
        Self {
            status_code: raw.status_code,
            body_text: raw.body,
            body_json,
            elapsed,
            attempts,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn body_text(&self) -> &str {
        &self.body_text
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// The parsed JSON body, or a validation error if the body wasn't JSON.
    pub fn json(&self) -> Result<&Value, Error> {
        self.body_json.as_ref().ok_or_else(|| {
            Error::validation(format!(
                "response body is not valid JSON: {:?}",
                truncate(&self.body_text, 120)
            ))
        })
    }

    pub fn json_field(&self, key: &str) -> Option<&Value> {
        self.body_json.as_ref().and_then(|value| value.get(key))
    }

    pub fn pet(&self) -> Result<Pet, Error> {
        let value = self.json()?.clone();
        serde_json::from_value(value)
            .map_err(|e| Error::validation(format!("response is not a pet record: {}", e)))
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
