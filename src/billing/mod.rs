pub mod client;
pub mod hooks;
pub mod mapper;
pub mod types;

pub use client::{BillingClient, BillingClientBuilder};
pub use mapper::{Mapped, RawResponse, TransactionState};
