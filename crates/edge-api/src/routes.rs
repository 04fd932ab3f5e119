//! # Routes
//!
//! The route table and the axum router that feeds it.
//!
//! Axum only carries the connection: every request, whatever its method or
//! path, lands in one fallback that buffers the body and hands it to
//! [`Dispatcher::serve`].

use crate::cors::apply_cors;
use crate::dispatcher::{error_response, Dispatcher};
use crate::handlers::Endpoint;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::Method,
    response::Response,
    Router,
};
use edge_core::{EdgeError, EdgeResult};
use tower_http::trace::TraceLayer;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Largest request body the dispatcher will buffer
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the route table
///
/// Routes, in match order:
/// - POST /products            - create a payment session
/// - GET  /sessions/{id}       - look up a session (decimal id)
/// - POST /webhook             - acknowledge a webhook
/// - POST /x402/requirements   - x402 payment requirements
/// - POST /x402/payments       - x402 payment submission
/// - GET  /, /x402, /8004      - payment pages
///
/// OPTIONS is answered by the dispatcher before the table is consulted.
pub fn edge_routes() -> EdgeResult<Dispatcher> {
    Dispatcher::new()
        .with_route(Method::POST, "/products", Endpoint::BuyProduct)?
        .with_route(Method::GET, "/sessions/(\\d+)", Endpoint::FetchSession)?
        .with_route(Method::POST, "/webhook", Endpoint::Webhook)?
        .with_route(Method::POST, "/x402/requirements", Endpoint::X402Requirements)?
        .with_route(Method::POST, "/x402/payments", Endpoint::X402Payment)?
        // UI routes
        .with_route(Method::GET, "/", Endpoint::Asset("/payment.html"))?
        .with_route(Method::GET, "/x402", Endpoint::Asset("/x402.html"))?
        .with_route(Method::GET, "/8004", Endpoint::Asset("/8004.html"))
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let span = info_span!("edge", request_id = %Uuid::new_v4());

    async move {
        let (parts, body) = request.into_parts();
        let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(body) => body,
            Err(e) => {
                return apply_cors(error_response(&EdgeError::InvalidBody(e.to_string())));
            }
        };

        state
            .dispatcher
            .serve(axum::http::Request::from_parts(parts, body), &state.env)
            .await
    }
    .instrument(span)
    .await
}
