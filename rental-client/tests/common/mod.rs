//! Scripted backend shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::{Method, StatusCode};
use rental_client::{
    ApiReply, ApiRequest, ClientConfig, ClientError, ClientResult, HttpClient, Identity,
    KeyValueStore, LoginRequest, MemoryStore, RentalClient,
};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Timeout,
    Connection,
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(u16, Value),
    Fail(Fault),
}

type Route = (Method, String);

/// In-process backend: replies are scripted per route, every request is recorded
#[derive(Default)]
pub struct MockBackend {
    once: Mutex<HashMap<Route, VecDeque<Scripted>>>,
    always: Mutex<HashMap<Route, Scripted>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a one-shot reply
    pub fn once(&self, method: Method, path: &str, status: u16, body: Value) {
        self.once
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Scripted::Reply(status, body));
    }

    /// Queue a one-shot transport failure
    pub fn fail_once(&self, method: Method, path: &str, fault: Fault) {
        self.once
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Scripted::Fail(fault));
    }

    /// Reply used whenever the one-shot queue of the route is empty
    pub fn always(&self, method: Method, path: &str, status: u16, body: Value) {
        self.always
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Scripted::Reply(status, body));
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    pub fn last_call(&self) -> Option<ApiRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpClient for MockBackend {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiReply> {
        let route = (request.method.clone(), request.path.clone());
        self.calls.lock().unwrap().push(request);

        let scripted = {
            let mut once = self.once.lock().unwrap();
            once.get_mut(&route).and_then(VecDeque::pop_front)
        }
        .or_else(|| self.always.lock().unwrap().get(&route).cloned());

        match scripted {
            Some(Scripted::Reply(status, body)) => Ok(ApiReply::new(
                StatusCode::from_u16(status).unwrap(),
                body,
            )),
            Some(Scripted::Fail(Fault::Timeout)) => {
                Err(ClientError::Timeout("operation timed out".into()))
            }
            Some(Scripted::Fail(Fault::Connection)) => {
                Err(ClientError::Connection("connection refused".into()))
            }
            None => Ok(ApiReply::new(
                StatusCode::NOT_FOUND,
                json!({"message": format!("no route for {} {}", route.0, route.1)}),
            )),
        }
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new("http://backend.test/api")
        .with_login_retry(3, Duration::from_millis(10))
        .with_poll_intervals(Duration::from_secs(15), Duration::from_secs(30))
}

pub fn build_client(backend: &Arc<MockBackend>, store: &Arc<MemoryStore>) -> RentalClient {
    RentalClient::builder()
        .config(test_config())
        .http(backend.clone())
        .storage(store.clone())
        .build()
        .unwrap()
}

pub fn identity_json(id: u32, role: &str) -> Value {
    json!({
        "id": id,
        "name": "Ana",
        "email": "ana@example.com",
        "role": role,
    })
}

pub fn department_json(id: u32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "address": "Av. Siempre Viva 742",
        "bedrooms": 2,
        "pricePerNight": 80.0,
        "rating": 4.5,
        "description": "Bright flat",
        "amenities": ["wifi"],
        "images": ["https://img.example.com/a.jpg"],
    })
}

pub fn reservation_json(id: u32, status: &str) -> Value {
    json!({
        "id": id,
        "departmentId": 1,
        "date": "2026-11-02",
        "time": "14:00",
        "duration": 3,
        "status": status,
        "amount": 240.0,
        "paymentMethod": "card",
    })
}

/// Log in through the scripted backend with the given role
pub async fn login_as(client: &RentalClient, backend: &MockBackend, role: &str) -> Identity {
    backend.once(
        Method::POST,
        "auth/login",
        200,
        json!({"token": format!("tok-{}", role), "user": identity_json(1, role)}),
    );
    client
        .login(LoginRequest {
            email: "ana@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap()
}

pub async fn stored_token(store: &MemoryStore) -> Option<String> {
    store.get(rental_client::storage::TOKEN_KEY).await.unwrap()
}
