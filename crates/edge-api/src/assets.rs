//! # Static Assets
//!
//! The asset collaborator serves the payment pages and is the fallback for
//! unmatched GET requests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
};
use edge_core::{EdgeError, EdgeResult};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Static file store.
///
/// A missing file is a 404 response, not an error.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn fetch(&self, path: &str) -> EdgeResult<Response>;
}

/// Type alias for a shared asset store
pub type BoxedAssetStore = Arc<dyn AssetStore>;

/// Asset path to try when a GET matched no route
pub fn fallback_path(path: &str) -> &str {
    if path == "/" {
        "/index.html"
    } else {
        path
    }
}

/// Assets served from a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    serve_dir: ServeDir,
}

impl DirAssetStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            serve_dir: ServeDir::new(root).append_index_html_on_directories(true),
        }
    }
}

#[async_trait]
impl AssetStore for DirAssetStore {
    async fn fetch(&self, path: &str) -> EdgeResult<Response> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .map_err(|e| EdgeError::Asset(format!("bad asset path {}: {}", path, e)))?;

        let response = self
            .serve_dir
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        Ok(response.map(Body::new))
    }
}
