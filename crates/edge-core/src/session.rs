//! # Forwarded Payloads
//!
//! Bodies accepted from the browser and the bodies forwarded upstream.
//! None of these are owned here; they live for one request.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Purchase form posted to `/products` and `/x402/requirements`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseForm {
    /// Product id (number or decimal string)
    #[serde(default)]
    pub product: Option<Value>,
    /// Customer email, forwarded as sent. `None` only when the field is
    /// absent; an explicit `null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Session creation request forwarded to the upstream service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSessionRequest {
    /// Customer email (any JSON value the form carried)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Value>,
    /// Amount in minor currency units
    pub amount: i64,
}

impl PaymentSessionRequest {
    pub fn new(customer: Option<Value>, amount: i64) -> Self {
        Self { customer, amount }
    }
}

/// x402 payment payload, forwarded without interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct X402PaymentPayload(pub Value);

impl X402PaymentPayload {
    pub fn into_inner(self) -> Value {
        self.0
    }
}
