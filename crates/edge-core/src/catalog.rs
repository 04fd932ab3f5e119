//! # Product Catalog
//!
//! Fixed mapping from product id to price in minor currency units.
//! The built-in catalog is compiled into the process; a TOML file can
//! replace it at startup. Either way it is read-only once loaded.

use crate::error::{EdgeError, EdgeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Product identifier as sent by the browser forms
pub type ProductId = u32;

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Price in minor currency units (cents)
    pub price: i64,

    /// Optional display name, shown in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Product {
    pub fn new(id: ProductId, price: i64) -> Self {
        Self {
            id,
            price,
            name: None,
        }
    }

    /// Name for log lines
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

/// Product catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// The catalog compiled into the router
    pub fn builtin() -> Self {
        Self::new()
            .with_product(Product::new(1, 200)) // $2
            .with_product(Product::new(2, 1000)) // $10
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Add a product with builder pattern
    pub fn with_product(mut self, product: Product) -> Self {
        self.add(product);
        self
    }

    /// Find a product by id
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Price of a product, only when it is defined and positive
    pub fn price_of(&self, id: ProductId) -> Option<i64> {
        self.get(id).map(|p| p.price).filter(|price| *price > 0)
    }

    /// Look up the `product` field of a purchase form.
    ///
    /// The id is matched the way a JS object key is: a JSON number must be
    /// a non-negative integer (`1.0` is `1`), a string must be the canonical
    /// decimal form (`"01"`, `" 1"` and `"+1"` match nothing).
    pub fn lookup(&self, product: &Value) -> Option<&Product> {
        let id = match product {
            Value::Number(n) => n.as_f64().and_then(integral_id),
            Value::String(s) => canonical_id(s),
            _ => None,
        }?;
        self.get(id).filter(|p| p.price > 0)
    }

    /// Price of the `product` field of a purchase form
    pub fn resolve(&self, product: &Value) -> Option<i64> {
        self.lookup(product).map(|p| p.price)
    }

    /// Check catalog invariants: positive prices, unique ids
    pub fn validate(&self) -> EdgeResult<()> {
        let mut seen = HashSet::new();
        for product in &self.products {
            if product.price <= 0 {
                return Err(EdgeError::Configuration(format!(
                    "product {} has non-positive price {}",
                    product.id, product.price
                )));
            }
            if !seen.insert(product.id) {
                return Err(EdgeError::Configuration(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
        }
        Ok(())
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> EdgeResult<Self> {
        let catalog: Self = toml::from_str(toml_str)
            .map_err(|e| EdgeError::Configuration(format!("invalid catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Number of products
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn integral_id(n: f64) -> Option<ProductId> {
    if n.is_finite() && n.fract() == 0.0 && n >= 0.0 && n <= f64::from(ProductId::MAX) {
        Some(n as ProductId)
    } else {
        None
    }
}

fn canonical_id(s: &str) -> Option<ProductId> {
    let digits_only = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    s.parse().ok()
}
