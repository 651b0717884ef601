//! reqwest transport against a local mock server

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use rental_client::http::interpret;
use rental_client::storage::TOKEN_KEY;
use rental_client::{
    ApiRequest, ClientConfig, ClientError, HttpClient, KeyValueStore, LoginRequest, MemoryStore,
    NetworkHttpClient, RentalClient, SessionState,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> NetworkHttpClient {
    NetworkHttpClient::new(&format!("{}/api/", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_json_reply_and_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reservations/my"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let http = client_for(&server);
    let reply = http
        .execute(ApiRequest::get("reservations/my").with_bearer(Some("tok-1".into())))
        .await
        .unwrap();

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([{"id": 1}]));
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/favorites"))
        .and(body_json(json!({"departmentId": "4"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "added"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::post("favorites")
        .json(&json!({"departmentId": "4"}))
        .unwrap();
    let reply = client_for(&server).execute(request).await.unwrap();
    assert_eq!(reply.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_error_statuses_are_replies_not_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/departments/5"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": {"name": ["Name is required"], "price": ["Must be positive"]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let http = client_for(&server);

    let reply = http.execute(ApiRequest::put("departments/5")).await.unwrap();
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    match interpret(reply).unwrap_err() {
        ClientError::Api {
            status,
            message,
            details,
        } => {
            assert_eq!(status, 422);
            assert!(message.contains("Name is required"));
            assert!(message.contains("Must be positive"));
            assert!(details.is_some());
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let reply = http.execute(ApiRequest::get("stats")).await.unwrap();
    assert_eq!(reply.body, json!("Bad Gateway"));
    assert_eq!(interpret(reply).unwrap_err().to_string(), "Bad Gateway");
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/notifications/3"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .execute(ApiRequest::delete("notifications/3"))
        .await
        .unwrap();
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(reply.body.is_null());
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let http =
        NetworkHttpClient::new(&format!("{}/api", server.uri()), Duration::from_millis(100))
            .unwrap();
    let err = http.execute(ApiRequest::get("departments")).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "got {:?}", err);
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let http = NetworkHttpClient::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
    let err = http.execute(ApiRequest::get("departments")).await.unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_login_then_fetch_over_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "ana@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-wire",
            "user": {"id": 1, "name": "Ana", "email": "ana@example.com", "role": "admin"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "departments": [{"id": 5, "name": "Loft", "pricePerNight": 80}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reservations"))
        .and(header("authorization", "Bearer tok-wire"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = RentalClient::builder()
        .config(ClientConfig::new(format!("{}/api", server.uri())))
        .storage(store.clone())
        .build()
        .unwrap();

    client
        .login(LoginRequest {
            email: "ana@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(client.session().state(), SessionState::Authenticated);
    assert_eq!(
        store.get(TOKEN_KEY).await.unwrap().as_deref(),
        Some("tok-wire")
    );

    let departments = client.gateway().fetch_departments().await.unwrap();
    assert_eq!(departments[0].id, "5");
    assert_eq!(departments[0].price_per_night, 80.0);

    assert!(client.gateway().fetch_reservations().await.unwrap().is_empty());
}
