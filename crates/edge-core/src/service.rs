//! # Upstream Payment Service
//!
//! The router owns no payment state. Sessions and x402 requirements live in
//! an upstream service reached through this trait.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           PaymentService (trait)             │
//! │  ├── create_session()                        │
//! │  ├── fetch_session()                         │
//! │  ├── x402_requirements()                     │
//! │  └── x402_payment()                          │
//! └──────────────────────────────────────────────┘
//!                       ▲
//!          ┌────────────┴────────────┐
//!  ┌───────┴────────┐        ┌───────┴───────┐
//!  │HttpPayment     │        │ test doubles  │
//!  │Service (reqwest)│       │               │
//!  └────────────────┘        └───────────────┘
//! ```

use crate::error::EdgeResult;
use crate::session::{PaymentSessionRequest, X402PaymentPayload};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Upstream payment service.
///
/// Every method performs exactly one upstream call and returns the upstream
/// JSON unchanged.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Create a payment session (`POST /sessions`)
    async fn create_session(&self, request: &PaymentSessionRequest) -> EdgeResult<Value>;

    /// Look up a session by id (`GET /sessions/{id}`)
    async fn fetch_session(&self, session_id: &str) -> EdgeResult<Value>;

    /// Request x402 payment requirements (`POST /x402/requirements`)
    async fn x402_requirements(&self, request: &PaymentSessionRequest) -> EdgeResult<Value>;

    /// Submit an x402 payment (`POST /x402/payments`)
    async fn x402_payment(&self, payload: &X402PaymentPayload) -> EdgeResult<Value>;

    /// Service name (for logging)
    fn service_name(&self) -> &'static str;
}

/// Type alias for a shared payment service (dynamic dispatch)
pub type BoxedPaymentService = Arc<dyn PaymentService>;
