//! # Request Handlers
//!
//! The handlers bound in the route table. API handlers parse the body,
//! price the product when needed, make one upstream call and return its
//! JSON verbatim. UI handlers serve a fixed asset.

use crate::dispatcher::{EdgeRequest, RouteHandler};
use crate::state::EdgeEnv;
use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use edge_core::{
    EdgeError, EdgeResult, PaymentSessionRequest, PurchaseForm, X402PaymentPayload,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

/// Handlers known to the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// POST /products - create a payment session
    BuyProduct,
    /// GET /sessions/{id} - look up a session
    FetchSession,
    /// POST /webhook - acknowledge without inspecting
    Webhook,
    /// POST /x402/requirements - price and forward
    X402Requirements,
    /// POST /x402/payments - forward as-is
    X402Payment,
    /// Serve a named static asset
    Asset(&'static str),
}

#[async_trait]
impl RouteHandler for Endpoint {
    async fn handle(
        &self,
        request: &EdgeRequest,
        env: &EdgeEnv,
        params: &[String],
    ) -> EdgeResult<Response> {
        match self {
            Endpoint::BuyProduct => buy_product(request, env).await,
            Endpoint::FetchSession => fetch_session(env, params).await,
            Endpoint::Webhook => Ok(webhook(request)),
            Endpoint::X402Requirements => x402_requirements(request, env).await,
            Endpoint::X402Payment => x402_payment(request, env).await,
            Endpoint::Asset(path) => serve_asset(env, path).await,
        }
    }
}

/// JSON response with the given status
pub fn json_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn parse_json<T: DeserializeOwned>(request: &EdgeRequest) -> EdgeResult<T> {
    serde_json::from_slice(request.body()).map_err(EdgeError::from)
}

/// Price the form's product, or `None` when the catalog doesn't know it
fn session_request(form: PurchaseForm, env: &EdgeEnv) -> Option<PaymentSessionRequest> {
    let product = form
        .product
        .as_ref()
        .and_then(|product| env.catalog.lookup(product))?;
    debug!("Product {} ({}) priced at {}", product.id, product.label(), product.price);
    Some(PaymentSessionRequest::new(form.email, product.price))
}

#[instrument(skip_all)]
async fn buy_product(request: &EdgeRequest, env: &EdgeEnv) -> EdgeResult<Response> {
    let form: PurchaseForm = parse_json(request)?;
    let Some(session_request) = session_request(form, env) else {
        return Ok(json_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "no product" }),
        ));
    };

    let service = env.service()?;
    let session = service.create_session(&session_request).await?;
    info!(
        "Created session via {}: amount={}",
        service.service_name(),
        session_request.amount
    );

    Ok(json_response(StatusCode::OK, session))
}

#[instrument(skip_all)]
async fn fetch_session(env: &EdgeEnv, params: &[String]) -> EdgeResult<Response> {
    let session_id = params.first().ok_or_else(|| {
        EdgeError::Configuration("session route has no id capture".to_string())
    })?;

    let session = env.service()?.fetch_session(session_id).await?;
    Ok(json_response(StatusCode::OK, session))
}

// TODO: verify the upstream webhook signature once the service publishes a signing scheme
fn webhook(request: &EdgeRequest) -> Response {
    debug!("Webhook received: {} bytes", request.body().len());
    json_response(StatusCode::OK, json!({ "status": "success" }))
}

#[instrument(skip_all)]
async fn x402_requirements(request: &EdgeRequest, env: &EdgeEnv) -> EdgeResult<Response> {
    let form: PurchaseForm = parse_json(request)?;
    let Some(session_request) = session_request(form, env) else {
        return Ok(json_response(
            StatusCode::BAD_REQUEST,
            json!({ "errorReason": "no product" }),
        ));
    };

    let requirements = env.service()?.x402_requirements(&session_request).await?;
    Ok(json_response(StatusCode::OK, requirements))
}

#[instrument(skip_all)]
async fn x402_payment(request: &EdgeRequest, env: &EdgeEnv) -> EdgeResult<Response> {
    let payload: X402PaymentPayload = parse_json(request)?;
    let result = env.service()?.x402_payment(&payload).await?;
    Ok(json_response(StatusCode::OK, result))
}

async fn serve_asset(env: &EdgeEnv, path: &str) -> EdgeResult<Response> {
    env.assets()?.fetch(path).await
}
