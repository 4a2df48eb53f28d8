use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use orange_bridge::testing::StubEngine;
use orange_bridge::{Bridge, EngineHandle};
use orange_server::{OrangeServer, build_router};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

/// Test helper wiring a stub engine into the real router
fn create_test_app(stub: &StubEngine, dist_dir: &Path, initialize: bool) -> Router {
    let engine = Arc::new(EngineHandle::from_provider(Box::new(stub.provider())));
    if initialize {
        engine.setup().unwrap();
    }
    let bridge = Arc::new(Bridge::new(engine, true));
    build_router(Arc::new(OrangeServer::new(bridge, dist_dir)))
}

fn dist_with_index() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>orange</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('orange');").unwrap();
    dir
}

/// Test helper to make HTTP requests
async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, String) {
    let request_builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    let request = if let Some(body) = body {
        request_builder.body(Body::from(body.to_string())).unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body_str = String::from_utf8(body_bytes.to_vec()).unwrap_or_default();

    (status, body_str)
}

#[tokio::test]
async fn test_exec_returns_results_and_time() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/exec",
        Some(json!({"sql": "SELECT * FROM fruit;"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["results"], "SELECT * FROM fruit;");
    assert!(body["time"].as_f64().unwrap() >= 0.0);
    assert_eq!(stub.calls().arguments(), vec!["SELECT * FROM fruit;"]);
    assert_eq!(stub.calls().outstanding(), 0);
}

#[tokio::test]
async fn test_exec_preserves_unicode() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let sql = "INSERT INTO t VALUES ('橙子 🍊');";
    let (status, body) =
        make_request(&app, Method::POST, "/api/exec", Some(json!({"sql": sql}))).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["results"], sql);
}

#[tokio::test]
async fn test_exec_blank_statement_is_bad_request() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let (status, body) =
        make_request(&app, Method::POST, "/api/exec", Some(json!({"sql": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["kind"], "invalid_argument");
    assert_eq!(stub.calls().exec_count(), 0);
}

#[tokio::test]
async fn test_exec_nul_byte_is_bad_request() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/api/exec",
        Some(json!({"sql": "SELECT 1\u{0000};"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stub.calls().exec_count(), 0);
}

#[tokio::test]
async fn test_exec_missing_sql_field_is_rejected() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let (status, _) =
        make_request(&app, Method::POST, "/api/exec", Some(json!({"query": "x"}))).await;

    assert!(status.is_client_error());
    assert_eq!(stub.calls().exec_count(), 0);
}

#[tokio::test]
async fn test_exec_before_setup_is_unavailable() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), false);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/exec",
        Some(json!({"sql": "SELECT 1;"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["kind"], "not_initialized");
    assert_eq!(stub.calls().exec_count(), 0);
}

#[tokio::test]
async fn test_exec_null_result_is_server_error() {
    let dist = dist_with_index();
    let stub = StubEngine::new(|_| None, || b"null engine".to_vec());
    let app = create_test_app(&stub, dist.path(), true);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/exec",
        Some(json!({"sql": "SELECT 1;"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["kind"], "engine_call_failure");
}

#[tokio::test]
async fn test_info_returns_engine_text() {
    let dist = dist_with_index();
    let stub = StubEngine::new(|sql| Some(sql.to_vec()), || b"Orange DBMS v0.1\nbuilt today".to_vec());
    let app = create_test_app(&stub, dist.path(), true);

    let (status, body) = make_request(&app, Method::GET, "/api/info", None).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["info"], "Orange DBMS v0.1\nbuilt today");
    assert_eq!(stub.calls().info_count(), 1);
}

#[tokio::test]
async fn test_health_reports_engine_state() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "Healthy");
    assert_eq!(body["engine"]["state"], "initialized");
    assert_eq!(body["engine"]["provider"], "stub");
    assert_eq!(body["engine"]["serialized"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_unhealthy_before_setup() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), false);

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "Unhealthy");
    assert_eq!(body["engine"]["state"], "loaded");
}

#[tokio::test]
async fn test_static_asset_is_served() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let (status, body) = make_request(&app, Method::GET, "/app.js", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "console.log('orange');");
}

#[tokio::test]
async fn test_unknown_path_falls_back_to_index() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    for uri in ["/", "/query/history", "/some/deep/route"] {
        let (status, body) = make_request(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body, "<html>orange</html>", "{}", uri);
    }
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_statements() {
    let dist = dist_with_index();
    let stub = StubEngine::echo();
    let app = create_test_app(&stub, dist.path(), true);

    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let sql = format!("SELECT {} FROM fruit;", i);
            let (status, body) =
                make_request(&app, Method::POST, "/api/exec", Some(json!({"sql": sql}))).await;
            (sql, status, body)
        }));
    }

    for handle in handles {
        let (sql, status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["results"], sql);
    }
    assert_eq!(stub.calls().exec_count(), 16);
    assert_eq!(stub.calls().max_in_flight(), 1);
}
