//! # edge-api
//!
//! Edge dispatcher and HTTP server for the payment edge router.
//!
//! This crate provides:
//! - `Dispatcher`: ordered first-match routing with asset fallback and CORS finishing
//! - `Endpoint` handlers forwarding to the upstream payment service
//! - `AssetStore` for the payment pages and unmatched GETs
//! - Axum server wiring
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/products` | Create payment session |
//! | GET | `/sessions/{id}` | Get session |
//! | POST | `/webhook` | Webhook acknowledgement |
//! | POST | `/x402/requirements` | x402 payment requirements |
//! | POST | `/x402/payments` | x402 payment |
//! | GET | `/`, `/x402`, `/8004` | Payment pages |
//! | OPTIONS | any | CORS preflight |

pub mod assets;
pub mod cors;
pub mod dispatcher;
pub mod handlers;
pub mod routes;
pub mod state;

pub use assets::{AssetStore, BoxedAssetStore, DirAssetStore};
pub use dispatcher::{Dispatcher, EdgeRequest, Route, RouteHandler};
pub use handlers::Endpoint;
pub use routes::{create_router, edge_routes};
pub use state::{AppConfig, AppState, EdgeEnv};
