use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_app, build_metrics_app, AppState};
use tower::ServiceExt;

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn load(app: &Router, uri: &str, text: impl Into<Body>) -> (StatusCode, Value) {
    send(app, Request::post(uri).body(text.into()).unwrap()).await
}

#[tokio::test]
async fn load_then_search() {
    let app = build_app(AppState::default());

    let (status, body) = load(&app, "/load?index=books&name=d1", "the cat sat on the mat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK" }));

    let (status, body) = get(&app, "/search?index=books&q=the").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["data"], json!({ "2": [{ "document_name": "d1", "char_positions": [0, 15] }] }));
}

#[tokio::test]
async fn missing_parameters_are_client_errors() {
    let app = build_app(AppState::default());

    let (status, _) = load(&app, "/load?name=d1", "text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = load(&app, "/load?index=books&name=", "text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "Bad Request");

    let (status, _) = get(&app, "/search?q=cat").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(&app, "/search?index=books").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_collection_and_word_are_not_found() {
    let app = build_app(AppState::default());

    let (status, body) = get(&app, "/search?index=nowhere&q=cat").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "Not Found");
    assert!(body["error"].as_str().unwrap().contains("collection"));

    load(&app, "/load?index=books&name=d1", "dog").await;
    let (status, body) = get(&app, "/search?index=books&q=cat").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("word"));
}

#[tokio::test]
async fn invalid_utf8_leaves_no_collection() {
    let app = build_app(AppState::default());

    let (status, _) = load(&app, "/load?index=books&name=d1", vec![0xffu8, 0xfe, 0xfd]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(&app, "/documents?index=books").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = build_app(AppState::default());
    let (status, _) = get(&app, "/load?index=books&name=d1").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = load(&app, "/search?index=books&q=x", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn list_and_dump_documents() {
    let app = build_app(AppState::default());
    load(&app, "/load?index=notes&name=a", "first note").await;
    load(&app, "/load?index=notes&name=b", "second, note").await;

    let (status, body) = get(&app, "/documents?index=notes").await;
    assert_eq!(status, StatusCode::OK);
    let mut names: Vec<String> = serde_json::from_value(body["data"].clone()).unwrap();
    names.sort();
    assert_eq!(names, vec!["a", "b"]);

    let (status, body) = get(&app, "/dump?index=notes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "a": "first note", "b": "second, note" }));
}

#[tokio::test]
async fn healthz_reports_route_counts() {
    let state = AppState::default();
    let app = build_app(state.clone());
    let metrics = build_metrics_app(state);

    load(&app, "/load?index=books&name=d1", "rust").await;
    get(&app, "/search?index=books&q=rust").await;
    get(&app, "/search?index=books&q=rust").await;
    // Failed requests are not counted.
    get(&app, "/search?index=books&q=missing").await;

    let (status, body) = get(&metrics, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests_count"]["load"], 1);
    assert_eq!(body["requests_count"]["search"], 2);
    assert!(body["response_time_ms"]["search"].as_f64().unwrap() >= 0.0);

    let (status, body) = get(&metrics, "/healthz?format=json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests_count"]["healthz"], 1);

    let (status, _) = get(&metrics, "/healthz?format=xml").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn healthz_treats_empty_format_as_json() {
    let metrics = build_metrics_app(AppState::default());
    let (status, body) = get(&metrics, "/healthz?format=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["requests_count"].is_object());
}

#[tokio::test]
async fn prometheus_text_lists_routes() {
    let state = AppState::default();
    let app = build_app(state.clone());
    let metrics = build_metrics_app(state);
    load(&app, "/load?index=books&name=d1", "rust").await;

    let resp = metrics.clone().oneshot(Request::get("/metrics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("route=\"load\""));
}

#[tokio::test]
async fn large_documents_load_under_the_configured_limit() {
    let app = build_app(AppState::default());
    // Past axum's stock 2 MB limit.
    let text = "word ".repeat(600_000);
    let (status, _) = load(&app, "/load?index=big&name=d1", text).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&app, "/search?index=big&q=word").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["600000"][0]["document_name"], "d1");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = build_app(AppState::default().with_max_body_bytes(16));
    let req = Request::post("/load?index=small&name=d1").body(Body::from("x ".repeat(32))).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let (status, _) = get(&app, "/documents?index=small").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
