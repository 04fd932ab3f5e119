//! # Application State
//!
//! Shared state for the Axum application: the route table, the environment
//! bindings handed to every handler, and the server configuration.
//! Nothing here is mutated after startup.

use crate::assets::{BoxedAssetStore, DirAssetStore};
use crate::dispatcher::Dispatcher;
use crate::routes::edge_routes;
use edge_core::{BoxedPaymentService, EdgeError, EdgeResult, PaymentService, ProductCatalog};
use edge_upstream::HttpPaymentService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory backing the ASSETS binding
    pub assets_dir: Option<PathBuf>,
    /// TOML catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(9001),
            assets_dir: std::env::var("ASSETS_DIR").ok().map(PathBuf::from),
            catalog_path: std::env::var("CATALOG_PATH").ok().map(PathBuf::from),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Environment bindings visible to handlers.
///
/// An absent binding is reported by the handler that needs it, as a 500.
#[derive(Clone, Default)]
pub struct EdgeEnv {
    /// Upstream payment service (SERVICE + APIKEY)
    pub service: Option<BoxedPaymentService>,
    /// Static asset collaborator (ASSETS)
    pub assets: Option<BoxedAssetStore>,
    /// Product catalog
    pub catalog: Arc<ProductCatalog>,
}

impl EdgeEnv {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self {
            service: None,
            assets: None,
            catalog: Arc::new(catalog),
        }
    }

    /// Builder: bind the upstream payment service
    pub fn with_service(mut self, service: BoxedPaymentService) -> Self {
        self.service = Some(service);
        self
    }

    /// Builder: bind the asset store
    pub fn with_assets(mut self, assets: BoxedAssetStore) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Upstream service, or the missing-binding error
    pub fn service(&self) -> EdgeResult<&BoxedPaymentService> {
        self.service
            .as_ref()
            .ok_or(EdgeError::MissingBinding("SERVICE/APIKEY"))
    }

    /// Asset store, or the missing-binding error
    pub fn assets(&self) -> EdgeResult<&BoxedAssetStore> {
        self.assets.as_ref().ok_or(EdgeError::MissingBinding("ASSETS"))
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Route table
    pub dispatcher: Arc<Dispatcher>,
    /// Handler environment
    pub env: EdgeEnv,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Bind the upstream service and asset store described by `config`
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let catalog = load_product_catalog(&config)?;
        let mut env = EdgeEnv::new(catalog);

        match HttpPaymentService::from_env() {
            Ok(service) => {
                info!(
                    "Upstream payment service: {} at {}",
                    service.service_name(),
                    service.config().base_url
                );
                env = env.with_service(Arc::new(service));
            }
            Err(e) => warn!("Upstream payment service not bound: {}", e),
        }

        match &config.assets_dir {
            Some(dir) => {
                info!("Serving assets from {}", dir.display());
                env = env.with_assets(Arc::new(DirAssetStore::new(dir)));
            }
            None => warn!("ASSETS_DIR not set, asset routes will fail"),
        }

        Self::with_env(config, env)
    }

    /// Create state with explicit bindings
    pub fn with_env(config: AppConfig, env: EdgeEnv) -> anyhow::Result<Self> {
        let dispatcher = edge_routes()
            .map_err(|e| anyhow::anyhow!("Failed to build route table: {}", e))?;

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            env,
            config,
        })
    }
}

/// Load the product catalog: CATALOG_PATH if set, else the built-in one
fn load_product_catalog(config: &AppConfig) -> anyhow::Result<ProductCatalog> {
    let Some(path) = &config.catalog_path else {
        return Ok(ProductCatalog::builtin());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let catalog = ProductCatalog::from_toml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    info!("Loaded {} products from {}", catalog.len(), path.display());
    Ok(catalog)
}
