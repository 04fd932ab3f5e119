//! # edge-upstream
//!
//! Client for the upstream payment service behind the edge router.
//!
//! The service owns sessions and x402 state; this crate only forwards.
//! Every endpoint gets the api key appended as `?apikey=`:
//!
//! | Method | Upstream path |
//! |--------|---------------|
//! | POST | `{SERVICE}/sessions` |
//! | GET | `{SERVICE}/sessions/{id}` |
//! | POST | `{SERVICE}/x402/requirements` |
//! | POST | `{SERVICE}/x402/payments` |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use edge_upstream::HttpPaymentService;
//! use edge_core::{PaymentService, PaymentSessionRequest};
//!
//! // Reads SERVICE and APIKEY
//! let service = HttpPaymentService::from_env()?;
//!
//! let session = service
//!     .create_session(&PaymentSessionRequest::new(Some("a@b.com".into()), 200))
//!     .await?;
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::HttpPaymentService;
pub use config::{ServiceConfig, DEFAULT_SERVICE_URL};
