//! An in-process pet store double. Each instance owns a hyper server on a
//! loopback port, an in-memory pet map, and knobs for provoking the
//! failure modes the harness needs to observe: transient outages, auth
//! rejection, and plain not-found responses.

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    convert::Infallible,
    net::SocketAddr,
    sync::{mpsc, Arc, Mutex},
    thread,
    thread::JoinHandle,
};
use tokio::{runtime::Runtime, sync::oneshot};

lazy_static! {
    static ref PET_PATH: Regex = Regex::new(r"^/pet/(?P<id>-?\d+)$").unwrap();
}

const VALID_STATUSES: [&str; 3] = ["available", "pending", "sold"];

#[derive(Debug)]
struct StubState {
    pets: HashMap<i64, Value>,
    fail_remaining: u32,
    failure_status: u16,
    required_api_key: Option<String>,
    requests_seen: u64,
}

impl StubState {
    fn new() -> Self {
        Self {
            pets: HashMap::new(),
            fail_remaining: 0,
            failure_status: 503,
            required_api_key: None,
            requests_seen: 0,
        }
    }
}

/// A running stub server. Dropping it shuts the server down and joins the
/// serving thread.
pub struct StubPetServer {
    address: SocketAddr,
    state: Arc<Mutex<StubState>>,
    shutdown: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl StubPetServer {
    /// Bind a fresh server on an OS-assigned loopback port and serve it
    /// from a dedicated thread with its own runtime.
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(StubState::new()));
        let server_state = state.clone();
        let (address_tx, address_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let join_handle = thread::spawn(move || {
            Runtime::new().expect("tokio runtime").block_on(async move {
                let addr = SocketAddr::from(([127, 0, 0, 1], 0));

                let make_svc = make_service_fn(move |_| {
                    let state = server_state.clone();
                    async move {
                        Ok::<_, Infallible>(service_fn(move |request| {
                            let state = state.clone();
                            async move {
                                Ok::<Response<Body>, Infallible>(
                                    handle_request(request, state).await,
                                )
                            }
                        }))
                    }
                });

                let server = Server::bind(&addr).serve(make_svc);
                address_tx
                    .send(server.local_addr())
                    .expect("report the bound address");

                let graceful = server.with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                });
                if let Err(e) = graceful.await {
                    eprintln!("Stub pet server error: {}", e);
                }
            });
        });

        let address = address_rx.recv().expect("stub pet server failed to start");

        Self {
            address,
            state,
            shutdown: Some(shutdown_tx),
            join_handle: Some(join_handle),
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Reject requests whose `api_key` header doesn't match, with a 401.
    pub fn require_api_key<S: Into<String>>(&self, key: S) {
        self.state.lock().unwrap().required_api_key = Some(key.into());
    }

    /// Answer the next `count` requests with the given status before
    /// resuming normal behavior. Used to provoke the retry path.
    pub fn fail_next_requests(&self, count: u32, status: u16) {
        let mut state = self.state.lock().unwrap();
        state.fail_remaining = count;
        state.failure_status = status;
    }

    /// Seed a pet without going over the wire.
    pub fn insert_pet(&self, pet: Value) {
        if let Some(id) = pet.get("id").and_then(Value::as_i64) {
            self.state.lock().unwrap().pets.insert(id, pet);
        }
    }

    pub fn pet(&self, pet_id: i64) -> Option<Value> {
        self.state.lock().unwrap().pets.get(&pet_id).cloned()
    }

    pub fn pet_count(&self) -> usize {
        self.state.lock().unwrap().pets.len()
    }

    /// Total requests handled, failure-injected ones included.
    pub fn requests_seen(&self) -> u64 {
        self.state.lock().unwrap().requests_seen
    }

    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.pets.clear();
        state.fail_remaining = 0;
        state.required_api_key = None;
        state.requests_seen = 0;
    }
}

impl Drop for StubPetServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .join()
                .expect("Couldn't gracefully shutdown the stub pet server thread");
        }
    }
}

async fn handle_request(mut request: Request<Body>, state: Arc<Mutex<StubState>>) -> Response<Body> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let api_key = request
        .headers()
        .get("api_key")
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    let body_bytes = hyper::body::to_bytes(request.body_mut())
        .await
        .unwrap_or_default();

    let mut state = state.lock().unwrap();
    state.requests_seen += 1;
    tracing::debug!("stub: {} {} (request #{})", method, path, state.requests_seen);

    if state.fail_remaining > 0 {
        state.fail_remaining -= 1;
        let status = state.failure_status;
        return json_response(status, json!({"message": "simulated outage"}));
    }

    if let Some(required) = &state.required_api_key {
        if api_key.as_deref() != Some(required.as_str()) {
            return json_response(401, json!({"message": "invalid api_key"}));
        }
    }

    if path == "/pet" && method == Method::POST {
        upsert_pet(&mut state, &body_bytes, false)
    } else if path == "/pet" && method == Method::PUT {
        upsert_pet(&mut state, &body_bytes, true)
    } else if let Some(captures) = PET_PATH.captures(&path) {
        let pet_id: i64 = match captures["id"].parse() {
            Ok(id) => id,
            Err(_) => return json_response(400, json!({"message": "invalid ID supplied"})),
        };
        if method == Method::GET {
            match state.pets.get(&pet_id) {
                Some(pet) => json_response(200, pet.clone()),
                None => json_response(404, json!({"message": "Pet not found"})),
            }
        } else if method == Method::DELETE {
            match state.pets.remove(&pet_id) {
                Some(_) => json_response(200, json!({"message": pet_id.to_string()})),
                None => json_response(404, json!({"message": "Pet not found"})),
            }
        } else {
            json_response(405, json!({"message": "method not allowed"}))
        }
    } else {
        json_response(404, json!({"message": "unknown path"}))
    }
}

/// POST stores a new pet (assigning an id when the payload has none), PUT
/// requires the pet to exist already. Both validate the payload shape.
fn upsert_pet(state: &mut StubState, body: &[u8], must_exist: bool) -> Response<Body> {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return json_response(400, json!({"message": "bad input"})),
    };

    if let Err(message) = validate_pet_payload(&payload) {
        return json_response(400, json!({ "message": message }));
    }

    let pet_id = match payload.get("id") {
        Some(value) => match value.as_i64() {
            Some(id) if id > 0 => id,
            _ => return json_response(400, json!({"message": "invalid ID supplied"})),
        },
        None => state.pets.keys().max().copied().unwrap_or(0) + 1,
    };

    if must_exist && !state.pets.contains_key(&pet_id) {
        return json_response(404, json!({"message": "Pet not found"}));
    }

    let mut stored = payload;
    stored["id"] = json!(pet_id);
    state.pets.insert(pet_id, stored.clone());
    json_response(200, stored)
}

fn validate_pet_payload(payload: &Value) -> Result<(), &'static str> {
    let object = match payload.as_object() {
        Some(object) => object,
        None => return Err("payload must be an object"),
    };

    match object.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => (),
        _ => return Err("name is required"),
    }

    if let Some(photo_urls) = object.get("photoUrls") {
        if !photo_urls.is_array() {
            return Err("photoUrls must be an array");
        }
    }

    if let Some(status) = object.get("status") {
        match status.as_str() {
            Some(status) if VALID_STATUSES.contains(&status) => (),
            _ => return Err("invalid status"),
        }
    }

    Ok(())
}

fn json_response(status: u16, body: Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        // the builder only fails on malformed parts, and ours are fixed
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_name_is_rejected() {
        let payload = json!({"id": 1, "photoUrls": [], "status": "available"});
        assert_eq!(validate_pet_payload(&payload), Err("name is required"));
    }

    #[test]
    fn payload_with_blank_name_is_rejected() {
        let payload = json!({"id": 1, "name": "   ", "photoUrls": []});
        assert_eq!(validate_pet_payload(&payload), Err("name is required"));
    }

    #[test]
    fn payload_with_bad_status_is_rejected() {
        let payload = json!({"id": 1, "name": "Buddy", "status": "missing"});
        assert_eq!(validate_pet_payload(&payload), Err("invalid status"));
    }

    #[test]
    fn complete_payload_is_accepted() {
        let payload = json!({
            "id": 1,
            "name": "Buddy",
            "photoUrls": ["https://example.com/pet1.jpg"],
            "status": "available"
        });
        assert_eq!(validate_pet_payload(&payload), Ok(()));
    }

    #[test]
    fn post_assigns_an_id_when_the_payload_has_none() {
        let mut state = StubState::new();
        let body = serde_json::to_vec(&json!({"name": "Buddy", "status": "available"})).unwrap();

        let response = upsert_pet(&mut state, &body, false);
        assert_eq!(response.status(), 200);
        assert_eq!(state.pets.len(), 1);
        assert!(state.pets.contains_key(&1));
    }

    #[test]
    fn put_requires_an_existing_pet() {
        let mut state = StubState::new();
        let body = serde_json::to_vec(&json!({"id": 5, "name": "Buddy"})).unwrap();

        let response = upsert_pet(&mut state, &body, true);
        assert_eq!(response.status(), 404);
        assert!(state.pets.is_empty());
    }

    #[test]
    fn pet_path_regex_only_matches_numeric_ids() {
        assert!(PET_PATH.is_match("/pet/42"));
        assert!(PET_PATH.is_match("/pet/-1"));
        assert!(!PET_PATH.is_match("/pet/abc"));
        assert!(!PET_PATH.is_match("/pet/42/photos"));
        assert!(!PET_PATH.is_match("/pet"));
    }
}
