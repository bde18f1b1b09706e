//! Request and response bodies exchanged with the billing service.
//!
//! The service speaks PascalCase JSON. Missing response fields decode to
//! their empty value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
    Cancelled,
    Other(String),
}

impl PaymentStatus {
    pub fn from_status(value: &str) -> Self {
        match value {
            "SUCCESS" => PaymentStatus::Success,
            "PENDING" => PaymentStatus::Pending,
            "FAILED" => PaymentStatus::Failed,
            "CANCELLED" => PaymentStatus::Cancelled,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Other(value) => value,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderRequest {
    pub customer_email: String,
    pub customer_full_name: String,
    pub customer_id: String,
    pub billing_provider: String,
    pub price_id: String,
    pub app_id: String,
    /// Set by the client from the configured application URL
    #[serde(default)]
    pub webhook: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OrderResponse {
    pub order_id: String,
    pub payment_url: String,
    pub price_id: String,
    pub app_id: String,
    pub payment_token: String,
    pub description: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderStatusRequest {
    pub order_id: String,
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OrderStatusResponse {
    pub order_id: String,
    pub status: String,
    pub price_id: String,
    pub customer_id: String,
    pub payment_token: String,
    pub description: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentRequest {
    pub app_id: String,
    pub transaction_id: String,
    /// Minor units; rendered in decimal for the signature
    pub total_amount: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// ISO-3166 alpha-3; the local record falls back to "SEN"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Set by the client before sending
    #[serde(default)]
    pub hash: String,
    /// Set by the client before sending
    #[serde(default)]
    pub webhook: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PaymentResponse {
    pub token: String,
    pub payment_id: String,
    pub payment_url: String,
    pub description: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PaymentStatusResponse {
    pub token: String,
    pub payment_id: String,
    pub transaction_id: String,
    pub status: String,
    pub total_amount: i64,
}

impl PaymentStatusResponse {
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_status(&self.status)
    }
}

/// Inbound payment notification. Verify before trusting `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWebhook {
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "TransactionID", alias = "TransactionId")]
    pub transaction_id: String,
}

impl PaymentWebhook {
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_status(&self.status)
    }

    pub fn is_success(&self) -> bool {
        self.payment_status() == PaymentStatus::Success
    }
}
