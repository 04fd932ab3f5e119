//! # Edge Dispatcher
//!
//! Ordered first-match routing over `(method, pattern)` rules.
//!
//! ```text
//! request ─▶ OPTIONS? ──yes──▶ preflight
//!               │no
//!               ▼
//!         routes in registration order ─▶ handler(request, env, params)
//!               │no match                     │Err
//!               ▼                             ▼
//!          404 "Not found"              status + error message
//!               │GET + ASSETS
//!               ▼
//!         asset fallback ─▶ CORS headers ─▶ client
//! ```

use crate::assets::fallback_path;
use crate::cors::{apply_cors, preflight};
use crate::state::EdgeEnv;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use edge_core::{EdgeError, EdgeResult};
use regex::Regex;
use std::sync::Arc;
use tracing::{error, info};

/// Inbound request with its body already buffered
pub type EdgeRequest = Request<Bytes>;

/// A handler bound to a route.
///
/// `params` holds the pattern's capture groups, in order.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(
        &self,
        request: &EdgeRequest,
        env: &EdgeEnv,
        params: &[String],
    ) -> EdgeResult<Response>;
}

/// Type alias for a shared route handler (dynamic dispatch)
pub type BoxedRouteHandler = Arc<dyn RouteHandler>;

/// A `(method, pattern, handler)` binding
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: String,
    matcher: Regex,
    handler: BoxedRouteHandler,
}

impl Route {
    /// Compile a route; the pattern must match the whole path
    pub fn new(method: Method, pattern: &str, handler: BoxedRouteHandler) -> EdgeResult<Self> {
        let matcher =
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| EdgeError::InvalidRoutePattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            method,
            pattern: pattern.to_string(),
            matcher,
            handler,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Capture groups if this route accepts the request
    pub fn matches(&self, method: &Method, path: &str) -> Option<Vec<String>> {
        if *method != self.method {
            return None;
        }
        let captures = self.matcher.captures(path)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Route table, built once at startup and shared read-only
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a route; routes are tried in registration order
    pub fn register<H>(&mut self, method: Method, pattern: &str, handler: H) -> EdgeResult<()>
    where
        H: RouteHandler + 'static,
    {
        let route = Route::new(method, pattern, Arc::new(handler))?;
        self.routes.push(route);
        Ok(())
    }

    /// Register with builder pattern
    pub fn with_route<H>(mut self, method: Method, pattern: &str, handler: H) -> EdgeResult<Self>
    where
        H: RouteHandler + 'static,
    {
        self.register(method, pattern, handler)?;
        Ok(self)
    }

    /// Registered routes, in match order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Match a request against the table and run the first matching handler.
    ///
    /// OPTIONS never consults the table. Handler failures become a response
    /// carrying the error message; no match is a plain 404.
    pub async fn route(&self, request: &EdgeRequest, env: &EdgeEnv) -> Response {
        if request.method() == Method::OPTIONS {
            return preflight();
        }

        let path = request.uri().path();
        for route in &self.routes {
            let Some(params) = route.matches(request.method(), path) else {
                continue;
            };

            return match route.handler.handle(request, env, &params).await {
                Ok(response) => response,
                Err(err) => {
                    error!("Handler failed: {} {} -> {}", route.method, route.pattern, err);
                    error_response(&err)
                }
            };
        }

        not_found()
    }

    /// Full request cycle: route, GET asset fallback, CORS finishing.
    pub async fn serve(&self, request: EdgeRequest, env: &EdgeEnv) -> Response {
        let mut response = self.route(&request, env).await;

        if response.status() == StatusCode::NOT_FOUND && request.method() == Method::GET {
            if let Some(assets) = &env.assets {
                match assets.fetch(fallback_path(request.uri().path())).await {
                    Ok(asset) if asset.status() != StatusCode::NOT_FOUND => response = asset,
                    Ok(_) => {}
                    Err(err) => {
                        error!("Asset fallback failed: {}", err);
                        response = error_response(&err);
                    }
                }
            }
        }

        info!(
            "{} {} -> {}",
            request.method(),
            request.uri().path(),
            response.status().as_u16()
        );

        apply_cors(response)
    }
}

/// Plain-text 500 carrying the error message
pub fn error_response(err: &EdgeError) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

/// Plain-text 404
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and echoes captured params
    #[derive(Clone, Default)]
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RouteHandler for Counting {
        async fn handle(
            &self,
            _request: &EdgeRequest,
            _env: &EdgeEnv,
            params: &[String],
        ) -> EdgeResult<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(params.join(",").into_response())
        }
    }

    struct Failing;

    #[async_trait]
    impl RouteHandler for Failing {
        async fn handle(
            &self,
            _request: &EdgeRequest,
            _env: &EdgeEnv,
            _params: &[String],
        ) -> EdgeResult<Response> {
            Err(EdgeError::Upstream("connection reset".into()))
        }
    }

    fn request(method: Method, uri: &str) -> EdgeRequest {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut dispatcher = Dispatcher::new();
        let result = dispatcher.register(Method::GET, "/sessions/(\\d+", Counting::default());
        assert!(matches!(result, Err(EdgeError::InvalidRoutePattern { .. })));
        assert!(dispatcher.routes().is_empty());
    }

    #[test]
    fn test_route_matching_is_anchored() {
        let route = Route::new(
            Method::GET,
            "/sessions/(\\d+)",
            Arc::new(Counting::default()),
        )
        .unwrap();

        assert_eq!(
            route.matches(&Method::GET, "/sessions/42"),
            Some(vec!["42".to_string()])
        );
        assert_eq!(route.matches(&Method::GET, "/sessions/42/extra"), None);
        assert_eq!(route.matches(&Method::GET, "/api/sessions/42"), None);
        assert_eq!(route.matches(&Method::GET, "/sessions/abc"), None);
        assert_eq!(route.matches(&Method::POST, "/sessions/42"), None);
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let route = Route::new(Method::GET, "/a|/b", Arc::new(Counting::default())).unwrap();
        assert!(route.matches(&Method::GET, "/a").is_some());
        assert!(route.matches(&Method::GET, "/b").is_some());
        assert!(route.matches(&Method::GET, "/a/x").is_none());
        assert!(route.matches(&Method::GET, "/x/b").is_none());
    }

    #[tokio::test]
    async fn test_first_match_wins_and_runs_once() {
        let first = Counting::default();
        let second = Counting::default();
        let dispatcher = Dispatcher::new()
            .with_route(Method::GET, "/items/(\\d+)", first.clone())
            .unwrap()
            .with_route(Method::GET, "/items/(.+)", second.clone())
            .unwrap();

        let response = dispatcher
            .route(&request(Method::GET, "/items/7"), &EdgeEnv::default())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "7");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_method_mismatch_falls_through() {
        let get = Counting::default();
        let post = Counting::default();
        let dispatcher = Dispatcher::new()
            .with_route(Method::GET, "/thing", get.clone())
            .unwrap()
            .with_route(Method::POST, "/thing", post.clone())
            .unwrap();

        let response = dispatcher
            .route(&request(Method::POST, "/thing"), &EdgeEnv::default())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get.calls.load(Ordering::SeqCst), 0);
        assert_eq!(post.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_options_bypasses_routes() {
        let counting = Counting::default();
        let dispatcher = Dispatcher::new()
            .with_route(Method::OPTIONS, "/thing", counting.clone())
            .unwrap();

        let response = dispatcher
            .route(&request(Method::OPTIONS, "/unregistered"), &EdgeEnv::default())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_becomes_500_with_message() {
        let dispatcher = Dispatcher::new()
            .with_route(Method::GET, "/boom", Failing)
            .unwrap();

        let response = dispatcher
            .route(&request(Method::GET, "/boom"), &EdgeEnv::default())
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            EdgeError::Upstream("connection reset".into()).to_string()
        );
    }

    #[tokio::test]
    async fn test_every_handler_error_is_500() {
        for err in [
            EdgeError::InvalidJson("eof".into()),
            EdgeError::MissingBinding("ASSETS"),
            EdgeError::Configuration("bad".into()),
        ] {
            let message = err.to_string();
            let response = error_response(&err);
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_text(response).await, message);
        }
    }

    #[tokio::test]
    async fn test_unmatched_is_404_with_cors_after_serve() {
        let dispatcher = Dispatcher::new();
        let response = dispatcher
            .serve(request(Method::GET, "/missing"), &EdgeEnv::default())
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
        assert_eq!(body_text(response).await, "Not found");
    }
}
