use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
};
use axum_test::TestServer;
use edge_api::routes::MAX_BODY_BYTES;
use edge_api::{create_router, AppConfig, AppState, AssetStore, EdgeEnv};
use edge_core::{
    EdgeError, EdgeResult, PaymentService, PaymentSessionRequest, ProductCatalog,
    X402PaymentPayload,
};
use edge_upstream::{HttpPaymentService, ServiceConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records every upstream call and answers with a fixed body
#[derive(Default)]
struct RecordingService {
    calls: Mutex<Vec<(&'static str, Value)>>,
    fail: bool,
}

impl RecordingService {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str, body: Value) -> EdgeResult<Value> {
        self.calls.lock().unwrap().push((name, body.clone()));
        if self.fail {
            return Err(EdgeError::Upstream("connection refused".into()));
        }
        Ok(json!({ "upstream": name, "echo": body }))
    }
}

#[async_trait]
impl PaymentService for RecordingService {
    async fn create_session(&self, request: &PaymentSessionRequest) -> EdgeResult<Value> {
        self.record("create_session", serde_json::to_value(request).unwrap())
    }

    async fn fetch_session(&self, session_id: &str) -> EdgeResult<Value> {
        self.record("fetch_session", json!(session_id))
    }

    async fn x402_requirements(&self, request: &PaymentSessionRequest) -> EdgeResult<Value> {
        self.record("x402_requirements", serde_json::to_value(request).unwrap())
    }

    async fn x402_payment(&self, payload: &X402PaymentPayload) -> EdgeResult<Value> {
        self.record("x402_payment", payload.0.clone())
    }

    fn service_name(&self) -> &'static str {
        "recording"
    }
}

/// Asset store backed by a map
struct MemoryAssets(HashMap<&'static str, &'static str>);

#[async_trait]
impl AssetStore for MemoryAssets {
    async fn fetch(&self, path: &str) -> EdgeResult<Response> {
        Ok(match self.0.get(path) {
            Some(content) => (
                StatusCode::OK,
                [(CONTENT_TYPE, "text/html; charset=utf-8")],
                Body::from(*content),
            )
                .into_response(),
            None => (StatusCode::NOT_FOUND, "missing asset").into_response(),
        })
    }
}

fn config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        assets_dir: None,
        catalog_path: None,
        environment: "test".to_string(),
    }
}

fn assets(files: &[(&'static str, &'static str)]) -> Arc<MemoryAssets> {
    Arc::new(MemoryAssets(files.iter().copied().collect()))
}

fn server_with(env: EdgeEnv) -> TestServer {
    let state = AppState::with_env(config(), env).unwrap();
    TestServer::new(create_router(state)).unwrap()
}

fn server(service: Arc<RecordingService>) -> TestServer {
    let env = EdgeEnv::new(ProductCatalog::builtin())
        .with_service(service)
        .with_assets(assets(&[
            ("/payment.html", "<h1>pay</h1>"),
            ("/x402.html", "<h1>x402</h1>"),
            ("/8004.html", "<h1>8004</h1>"),
            ("/app.js", "console.log('app')"),
        ]));
    server_with(env)
}

fn assert_cors(response: &axum_test::TestResponse) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn buy_product_forwards_priced_session() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server
        .post("/products")
        .json(&json!({ "product": 1, "email": "a@b.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    assert_cors(&response);
    assert_eq!(
        response.json::<Value>(),
        json!({
            "upstream": "create_session",
            "echo": { "customer": "a@b.com", "amount": 200 }
        })
    );
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test]
async fn unknown_product_is_rejected_without_upstream_call() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server
        .post("/products")
        .json(&json!({ "product": 999 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert_eq!(response.json::<Value>(), json!({ "error": "no product" }));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn fetch_session_passes_captured_id() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server.get("/sessions/42").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(service.calls(), vec![("fetch_session", json!("42"))]);
}

#[tokio::test]
async fn non_numeric_session_id_does_not_match() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server.get("/sessions/abc").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_cors(&response);
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn webhook_always_succeeds() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server.post("/webhook").text("{\"anything\": true}").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "status": "success" }));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn x402_requirements_are_priced() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server
        .post("/x402/requirements")
        .json(&json!({ "product": "2", "email": "a@b.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        service.calls(),
        vec![(
            "x402_requirements",
            json!({ "customer": "a@b.com", "amount": 1000 })
        )]
    );

    let rejected = server
        .post("/x402/requirements")
        .json(&json!({ "product": 3 }))
        .await;
    assert_eq!(rejected.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        rejected.json::<Value>(),
        json!({ "errorReason": "no product" })
    );
}

#[tokio::test]
async fn x402_payment_is_forwarded_verbatim() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());
    let payload = json!({
        "x402Version": 1,
        "scheme": "exact",
        "payload": { "signature": "0xdead", "nested": [1, 2, 3] }
    });

    let response = server.post("/x402/payments").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(service.calls(), vec![("x402_payment", payload)]);
}

#[tokio::test]
async fn malformed_json_is_500_with_message() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server.post("/products").text("{not json").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    let expected = EdgeError::from(serde_json::from_str::<Value>("{not json").unwrap_err());
    assert_eq!(response.text(), expected.to_string());
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn oversized_body_is_500_with_cors() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server
        .post("/products")
        .bytes(vec![b' '; MAX_BODY_BYTES + 1].into())
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    assert!(response.text().starts_with("Invalid request body:"));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn integral_float_product_is_priced() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    let response = server
        .post("/products")
        .json(&json!({ "product": 1.0, "email": "a@b.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        service.calls(),
        vec![("create_session", json!({ "customer": "a@b.com", "amount": 200 }))]
    );
}

#[tokio::test]
async fn upstream_failure_is_500() {
    let service = Arc::new(RecordingService::failing());
    let server = server(service.clone());

    let response = server.get("/sessions/1").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    assert_eq!(
        response.text(),
        "Upstream request failed: connection refused"
    );
}

#[tokio::test]
async fn missing_service_binding_is_500() {
    let server = server_with(EdgeEnv::new(ProductCatalog::builtin()));

    let response = server
        .post("/products")
        .json(&json!({ "product": 1, "email": "a@b.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().starts_with("Missing environment binding"));
}

#[tokio::test]
async fn options_is_preflight_on_any_path() {
    let service = Arc::new(RecordingService::default());
    let server = server(service.clone());

    for path in ["/products", "/sessions/42", "/not/registered"] {
        let response = server.method(Method::OPTIONS, path).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_cors(&response);
        assert!(response.text().is_empty());
    }
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn ui_routes_serve_named_pages() {
    let server = server(Arc::new(RecordingService::default()));

    for (route, page) in [
        ("/", "<h1>pay</h1>"),
        ("/x402", "<h1>x402</h1>"),
        ("/8004", "<h1>8004</h1>"),
    ] {
        let response = server.get(route).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_cors(&response);
        assert_eq!(response.text(), page);
    }
}

#[tokio::test]
async fn unmatched_get_falls_back_to_assets() {
    let server = server(Arc::new(RecordingService::default()));

    let response = server.get("/app.js").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.text(), "console.log('app')");

    let missing = server.get("/missing.css").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_cors(&missing);
    assert_eq!(missing.text(), "Not found");
}

#[tokio::test]
async fn root_falls_back_to_index_when_page_is_missing() {
    let env = EdgeEnv::new(ProductCatalog::builtin())
        .with_assets(assets(&[("/index.html", "<h1>index</h1>")]));
    let server = server_with(env);

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "<h1>index</h1>");
}

#[tokio::test]
async fn non_get_unmatched_is_404_without_fallback() {
    let server = server(Arc::new(RecordingService::default()));

    let response = server.post("/app.js").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_cors(&response);

    let put = server.put("/products").await;
    assert_eq!(put.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn forwards_to_http_upstream_with_api_key() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(query_param("apikey", "test-key"))
        .and(body_json(json!({ "customer": "a@b.com", "amount": 200 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 42, "url": "https://pay.example/42" })),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/sessions/42"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "status": "paid" })))
        .expect(1)
        .mount(&upstream)
        .await;

    let service = HttpPaymentService::new(ServiceConfig::new(upstream.uri(), "test-key"));
    let server = server_with(EdgeEnv::new(ProductCatalog::builtin()).with_service(Arc::new(service)));

    let created = server
        .post("/products")
        .json(&json!({ "product": 1, "email": "a@b.com" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::OK);
    assert_eq!(
        created.json::<Value>(),
        json!({ "id": 42, "url": "https://pay.example/42" })
    );

    let fetched = server.get("/sessions/42").await;
    assert_eq!(fetched.json::<Value>(), json!({ "id": 42, "status": "paid" }));
}
