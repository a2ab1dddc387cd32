//! End-to-end tests against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{basic_auth, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use courier::{Client, CourierError, EventExecutor, ResponseType};

fn client_for(server: &MockServer) -> Client {
    let base = server.uri();
    Client::new().mutate(move |req| req.base = base.clone())
}

#[tokio::test]
async fn gets_json_through_the_default_executor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "laundry" })))
        .mount(&server)
        .await;

    let response = client_for(&server).get("todos/1").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body.as_json().unwrap()["title"],
        json!("laundry")
    );
}

#[tokio::test]
async fn decodes_into_a_typed_body() {
    #[derive(serde::Deserialize)]
    struct Todo {
        title: String,
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "laundry" })))
        .mount(&server)
        .await;

    let todo: Todo = client_for(&server).body("todos/1").await.unwrap();
    assert_eq!(todo.title, "laundry");
}

#[tokio::test]
async fn query_parameters_are_appended_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .and(query_param("done", "true"))
        .and(query_param("owner", "awi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .mutate(|req| {
            req.query.set("done", "true");
            req.query.set("owner", "awi");
        })
        .get("todos")
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn explicit_credentials_become_a_basic_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secure"))
        .and(basic_auth("awi", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .mutate(|req| {
            req.authentication.username = Some("awi".to_string());
            req.authentication.password = Some("secret".to_string());
        })
        .get("secure")
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn structured_post_bodies_go_out_as_json_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/todos"))
        .and(header("content-type", "application/json;charset=utf-8"))
        .and(body_string("{\"title\":\"laundry\"}"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 2 })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .post("todos", json!({ "title": "laundry" }))
        .await
        .unwrap();

    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn a_status_rejection_carries_the_decoded_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "reason": "gone" })))
        .mount(&server)
        .await;

    let error = client_for(&server).get("missing").await.unwrap_err();

    assert_eq!(error.status(), Some(404));
    let response = error.response().unwrap();
    assert_eq!(response.body.as_json().unwrap()["reason"], json!("gone"));
}

#[tokio::test]
async fn optional_turns_a_status_rejection_into_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let value: Option<serde_json::Value> =
        client_for(&server).optional("missing").await.unwrap();

    assert!(value.is_none());
}

#[tokio::test]
async fn a_slow_reply_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .mutate(|req| req.timeout = 30)
        .get("slow")
        .await
        .unwrap_err();

    assert!(matches!(error, CourierError::RequestTimedOut { .. }));
}

#[tokio::test]
async fn a_fast_reply_beats_the_timer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .mutate(|req| req.timeout = 5_000)
        .get("fast")
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn the_event_executor_performs_one_exchange_then_invalidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/once"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let mut client = client_for(&server).executor(Arc::new(EventExecutor::new()));

    let first = client.get("once").await.unwrap();
    assert_eq!(first.status, 200);

    let error = client.get("once").await.unwrap_err();
    assert!(matches!(error, CourierError::RequestInvalidated { .. }));
}

#[tokio::test]
async fn an_aborted_event_executor_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let executor = Arc::new(EventExecutor::new());
    let handle = executor.abort_handle();
    let mut client = client_for(&server).executor(executor);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let error = client.get("never").await.unwrap_err();
    assert!(matches!(error, CourierError::RequestAborted { .. }));
}

#[tokio::test]
async fn text_responses_skip_json_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .and(header("accept", "text/plain */*"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\":\"decoded\"}"))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .mutate(|req| req.response.kind = ResponseType::Text)
        .get("plain")
        .await
        .unwrap();

    assert_eq!(response.body.as_text(), Some("{\"not\":\"decoded\"}"));
}

#[tokio::test]
async fn an_unparseable_json_reply_falls_back_to_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mangled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let response = client_for(&server).get("mangled").await.unwrap();
    assert_eq!(response.body.as_text(), Some("not json at all"));
}

#[tokio::test]
async fn an_unreachable_host_fails_the_request() {
    let error = Client::new()
        .mutate(|req| req.base = "http://127.0.0.1:9".to_string())
        .get("anything")
        .await
        .unwrap_err();

    assert!(matches!(error, CourierError::RequestFailed { .. }));
}

#[tokio::test]
async fn an_unparseable_base_is_an_invalid_url() {
    let error = Client::new()
        .mutate(|req| req.base = "not a url".to_string())
        .get("anything")
        .await
        .unwrap_err();

    assert!(matches!(error, CourierError::InvalidRequestUrl { .. }));
    assert!(error.to_string().contains("GET"));
}
