//! # edge-core
//!
//! Core types and traits for the payment edge router.
//!
//! This crate provides:
//! - `PaymentService` trait for the upstream payment service
//! - `ProductCatalog` mapping product ids to prices
//! - `PurchaseForm`, `PaymentSessionRequest` and `X402PaymentPayload` bodies
//! - `EdgeError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use edge_core::{PaymentSessionRequest, ProductCatalog};
//! use serde_json::json;
//!
//! let catalog = ProductCatalog::builtin();
//! if let Some(product) = catalog.lookup(&json!("1")) {
//!     let session = service
//!         .create_session(&PaymentSessionRequest::new(Some(json!(email)), product.price))
//!         .await?;
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod service;
pub mod session;

// Re-exports for convenience
pub use catalog::{Product, ProductCatalog, ProductId};
pub use error::{EdgeError, EdgeResult};
pub use service::{BoxedPaymentService, PaymentService};
pub use session::{PaymentSessionRequest, PurchaseForm, X402PaymentPayload};
