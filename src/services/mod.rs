pub mod billing_service;

pub use billing_service::{BillingService, WebhookOutcome};
