use crate::{
    config::HarnessConfig,
    data::{RawResponse, RequestIntent, ResponseOutcome},
    error::Error,
    retry::{classify, Disposition, RetryPolicy},
    stability::StabilityTracker,
};
use serde_json::Value;
use std::{fmt::Debug, thread, time::Duration, time::Instant};

/// Executes a single attempt against the wire. The client owns retries;
/// a transport only knows how to fire one request and report what came
/// back. Tests substitute scripted transports through this seam.
pub trait Transport: Debug {
    fn execute(&self, url: &str, intent: &RequestIntent) -> Result<RawResponse, Error>;
}

#[derive(Debug)]
pub struct ReqwestTransport {
    http: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::validation(format!("failed to build the HTTP client: {}", e)))?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, url: &str, intent: &RequestIntent) -> Result<RawResponse, Error> {
        let method = reqwest::Method::from_bytes(intent.method().as_bytes())
            .map_err(|_| Error::validation(format!("invalid HTTP method {:?}", intent.method())))?;

        let mut request = self.http.request(method, url);
        for (key, value) in intent.headers() {
            request = request.header(key, value);
        }
        if let Some(body) = intent.body() {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| Error::Connection {
            url: String::from(url),
            detail: e.to_string(),
        })?;

        let status_code = response.status().as_u16();
        let body = response.text().map_err(|e| Error::Connection {
            url: String::from(url),
            detail: e.to_string(),
        })?;

        Ok(RawResponse { status_code, body })
    }
}

/// Builder used to build a PetStoreClient instance.
#[derive(Debug, Default)]
pub struct PetStoreClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    retry_policy: Option<RetryPolicy>,
    timeout: Option<Duration>,
    transport: Option<Box<dyn Transport>>,
}

impl PetStoreClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url<T: Into<String>>(mut self, base_url: T) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key<T: Into<String>>(mut self, api_key: T) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use the given transport instead of the default blocking reqwest one.
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Consume the builder and create a PetStoreClient using all of the
    /// previously configured values or their defaults.
    pub fn build(mut self) -> Result<PetStoreClient, Error> {
        let timeout = self.timeout.unwrap_or_else(|| Duration::from_secs(30));
        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => Box::new(ReqwestTransport::new(timeout)?),
        };

        Ok(PetStoreClient {
            base_url: self
                .base_url
                .take()
                .unwrap_or_else(|| String::from(crate::config::DEFAULT_BASE_URL))
                .trim_end_matches('/')
                .to_string(),
            api_key: self
                .api_key
                .take()
                .unwrap_or_else(|| String::from(crate::config::DEFAULT_API_KEY)),
            retry_policy: self.retry_policy.take().unwrap_or_default(),
            transport,
        })
    }
}

/// HTTP client for the pet store API with built-in retry and stability
/// recording. All operations go through `send`, which appends exactly one
/// stability record per logical call.
#[derive(Debug)]
pub struct PetStoreClient {
    base_url: String,
    api_key: String,
    retry_policy: RetryPolicy,
    transport: Box<dyn Transport>,
}

impl PetStoreClient {
    pub fn from_config(config: &HarnessConfig) -> Result<Self, Error> {
        PetStoreClientBuilder::new()
            .with_base_url(config.base_url.clone())
            .with_api_key(config.api_key.clone())
            .with_retry_policy(config.retry_policy())
            .with_timeout(config.timeout)
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn create_pet(
        &self,
        pet: &Value,
        tracker: &mut StabilityTracker,
    ) -> Result<ResponseOutcome, Error> {
        let intent = self
            .intent("POST", "/pet", "POST /pet")
            .with_json_body(pet.clone());
        self.send(intent, tracker)
    }

    pub fn get_pet(
        &self,
        pet_id: i64,
        tracker: &mut StabilityTracker,
    ) -> Result<ResponseOutcome, Error> {
        let intent = self.intent("GET", &format!("/pet/{}", pet_id), "GET /pet/{petId}");
        self.send(intent, tracker)
    }

    pub fn update_pet(
        &self,
        pet: &Value,
        tracker: &mut StabilityTracker,
    ) -> Result<ResponseOutcome, Error> {
        let intent = self
            .intent("PUT", "/pet", "PUT /pet")
            .with_json_body(pet.clone());
        self.send(intent, tracker)
    }

    pub fn delete_pet(
        &self,
        pet_id: i64,
        tracker: &mut StabilityTracker,
    ) -> Result<ResponseOutcome, Error> {
        let intent = self.intent("DELETE", &format!("/pet/{}", pet_id), "DELETE /pet/{petId}");
        self.send(intent, tracker)
    }

    /// Any response at all, even a 404, means the API is reachable.
    pub fn health_check(&self, tracker: &mut StabilityTracker) -> bool {
        match self.get_pet(1, tracker) {
            Ok(_) => true,
            Err(error) => {
                tracing::error!("health check failed: {}", error);
                false
            }
        }
    }

    /// Run one logical call: attempt, classify, back off, repeat. Returns
    /// the last usable response or fails once attempts are exhausted or a
    /// fatal condition is hit. Non-retryable responses (4xx outside the
    /// retryable set) are delivered after a single attempt.
    pub fn send(
        &self,
        intent: RequestIntent,
        tracker: &mut StabilityTracker,
    ) -> Result<ResponseOutcome, Error> {
        let url = format!("{}{}", self.base_url, intent.path());
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_failure = String::new();

        while attempts < self.retry_policy.max_attempts() {
            if attempts > 0 {
                let delay = self.retry_policy.backoff_delay(attempts - 1);
                tracing::debug!("backing off {:?} before retrying {}", delay, intent.endpoint());
                thread::sleep(delay);
            }
            attempts += 1;
            tracing::debug!("{} attempt {}/{}", intent.endpoint(), attempts, self.retry_policy.max_attempts());

            match classify(&self.retry_policy, self.transport.execute(&url, &intent)) {
                Disposition::Deliver(raw) => {
                    let outcome = ResponseOutcome::from_raw(raw, started.elapsed(), attempts);
                    tracing::info!(
                        "{} -> {} in {:?} ({} attempt(s))",
                        intent.endpoint(),
                        outcome.status_code(),
                        outcome.elapsed(),
                        attempts
                    );
                    tracker.record(
                        intent.endpoint(),
                        outcome.is_success(),
                        attempts,
                        outcome.elapsed(),
                    );
                    return Ok(outcome);
                }
                Disposition::Retry(reason) => {
                    tracing::warn!("{} attempt {} failed: {}", intent.endpoint(), attempts, reason);
                    last_failure = reason;
                }
                Disposition::Fatal(error) => {
                    tracing::error!("{} failed without retry: {}", intent.endpoint(), error);
                    tracker.record(intent.endpoint(), false, attempts, started.elapsed());
                    return Err(error);
                }
            }
        }

        tracker.record(intent.endpoint(), false, attempts, started.elapsed());
        Err(Error::RetryExhausted {
            endpoint: String::from(intent.endpoint()),
            attempts,
            last_error: last_failure,
        })
    }

    fn intent(&self, method: &str, path: &str, endpoint: &str) -> RequestIntent {
        RequestIntent::new(method, path, endpoint)
            .with_header("Accept", "application/json")
            .with_header("api_key", self.api_key.clone())
    }
}
