//! Client SDK for the Akouendy billing service.
//!
//! - [`billing::BillingClient`] creates orders and payments and looks up their status.
//! - [`signature::SignatureEngine`] signs payment requests and verifies webhooks.
//! - [`database`] stores the resulting [`BillingTransaction`] records in Postgres.
//! - [`services::BillingService`] ties the three together.

pub mod billing;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod services;
pub mod signature;

pub use billing::types::{
    OrderRequest, OrderResponse, OrderStatusRequest, OrderStatusResponse, PaymentRequest,
    PaymentResponse, PaymentStatus, PaymentStatusResponse, PaymentWebhook,
};
pub use billing::{BillingClient, Mapped, TransactionState};
pub use config::{BillingConfig, DecodePolicy, Environment};
pub use database::billing_transaction_repository::BillingTransaction;
pub use error::{BillingError, BillingResult};
pub use signature::SignatureEngine;
