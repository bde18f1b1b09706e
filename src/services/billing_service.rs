//! Billing Service
//!
//! Places orders and payments through the billing client, stores the
//! resulting records, and authenticates inbound payment webhooks.

use crate::billing::client::BillingClient;
use crate::billing::mapper::Mapped;
use crate::billing::types::{
    OrderRequest, OrderResponse, PaymentRequest, PaymentResponse, PaymentWebhook,
};
use crate::config::BillingConfig;
use crate::database::billing_transaction_repository::BillingTransaction;
use crate::database::repository::TransactionStore;
use crate::error::{BillingError, BillingResult};
use crate::signature::SignatureEngine;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of handling an inbound webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Signature did not match; the payload must not be trusted
    Rejected { transaction_id: String },
    /// Signature matched. `transaction` is the local record, if one exists.
    Accepted {
        webhook: PaymentWebhook,
        transaction: Option<BillingTransaction>,
    },
}

impl WebhookOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, WebhookOutcome::Accepted { .. })
    }
}

pub struct BillingService {
    client: Arc<BillingClient>,
    store: Arc<dyn TransactionStore>,
    signer: SignatureEngine,
}

impl BillingService {
    pub fn new(
        config: &BillingConfig,
        client: Arc<BillingClient>,
        store: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            client,
            store,
            signer: SignatureEngine::from_config(config),
        }
    }

    pub fn client(&self) -> &BillingClient {
        &self.client
    }

    /// Create an order and store its record when the service accepted it.
    ///
    /// `country_code` overrides the default "SEN" on the stored record.
    pub async fn place_order(
        &self,
        transaction_id: &str,
        request: OrderRequest,
        country_code: Option<&str>,
    ) -> BillingResult<Mapped<OrderResponse>> {
        let mut mapped = self.client.create_order(transaction_id, request).await?;
        if let Some(transaction) = mapped.transaction.take() {
            let stored = self
                .store
                .create(&transaction.with_country_code(country_code))
                .await?;
            mapped.transaction = Some(stored);
        }
        Ok(mapped)
    }

    /// Initiate a signed payment and store its record when accepted.
    pub async fn place_payment(
        &self,
        request: PaymentRequest,
    ) -> BillingResult<Mapped<PaymentResponse>> {
        let mut mapped = self.client.create_payment(request).await?;
        if let Some(transaction) = mapped.transaction.take() {
            mapped.transaction = Some(self.store.create(&transaction).await?);
        }
        Ok(mapped)
    }

    pub async fn find_by_payment_token(
        &self,
        payment_token: &str,
    ) -> BillingResult<Option<BillingTransaction>> {
        Ok(self.store.find_by_payment_token(payment_token).await?)
    }

    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> BillingResult<Option<BillingTransaction>> {
        Ok(self.store.find_by_transaction_id(transaction_id).await?)
    }

    /// Decode a raw webhook body, then verify it.
    pub async fn handle_webhook(&self, payload: &[u8]) -> BillingResult<WebhookOutcome> {
        let webhook: PaymentWebhook =
            serde_json::from_slice(payload).map_err(|e| BillingError::Decode {
                message: format!("invalid webhook payload: {}", e),
                body: String::from_utf8_lossy(payload).into_owned(),
            })?;
        self.accept_webhook(webhook).await
    }

    /// Verify a decoded webhook and attach the matching local record.
    pub async fn accept_webhook(&self, webhook: PaymentWebhook) -> BillingResult<WebhookOutcome> {
        if !self.signer.verify(&webhook) {
            warn!(
                transaction_id = %webhook.transaction_id,
                "Invalid payment webhook signature"
            );
            return Ok(WebhookOutcome::Rejected {
                transaction_id: webhook.transaction_id,
            });
        }

        let transaction = self
            .store
            .find_by_transaction_id(&webhook.transaction_id)
            .await?;
        info!(
            transaction_id = %webhook.transaction_id,
            status = %webhook.status,
            known = transaction.is_some(),
            "payment webhook accepted"
        );
        Ok(WebhookOutcome::Accepted {
            webhook,
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::database::error::DatabaseError;
    use crate::signature::webhook_signature;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<BillingTransaction>>,
    }

    #[async_trait]
    impl TransactionStore for MemoryStore {
        async fn create(
            &self,
            transaction: &BillingTransaction,
        ) -> Result<BillingTransaction, DatabaseError> {
            self.records
                .lock()
                .expect("lock")
                .push(transaction.clone());
            Ok(transaction.clone())
        }

        async fn find_by_payment_token(
            &self,
            payment_token: &str,
        ) -> Result<Option<BillingTransaction>, DatabaseError> {
            Ok(self
                .records
                .lock()
                .expect("lock")
                .iter()
                .find(|t| t.payment_token == payment_token)
                .cloned())
        }

        async fn find_by_transaction_id(
            &self,
            transaction_id: &str,
        ) -> Result<Option<BillingTransaction>, DatabaseError> {
            Ok(self
                .records
                .lock()
                .expect("lock")
                .iter()
                .rev()
                .find(|t| t.app_trx_id == transaction_id)
                .cloned())
        }
    }

    fn service(store: Arc<MemoryStore>) -> BillingService {
        let config = BillingConfig::new(Environment::Sandbox, "tok1");
        let client = Arc::new(BillingClient::new(Arc::new(config.clone())).expect("client"));
        BillingService::new(&config, client, store)
    }

    #[tokio::test]
    async fn valid_webhook_is_accepted_with_record() {
        let store = Arc::new(MemoryStore::default());
        store
            .create(&BillingTransaction::new("abc123", "tok-xyz"))
            .await
            .expect("seed");
        let service = service(store);

        let payload = serde_json::json!({
            "Hash": webhook_signature("tok1", "abc123", "SUCCESS"),
            "Status": "SUCCESS",
            "TransactionID": "abc123",
        });
        let outcome = service
            .handle_webhook(payload.to_string().as_bytes())
            .await
            .expect("should handle");

        match outcome {
            WebhookOutcome::Accepted {
                webhook,
                transaction,
            } => {
                assert!(webhook.is_success());
                assert_eq!(transaction.expect("record").payment_token, "tok-xyz");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn tampered_webhook_is_rejected() {
        let service = service(Arc::new(MemoryStore::default()));
        let webhook = PaymentWebhook {
            hash: webhook_signature("tok1", "abc123", "FAILED"),
            status: "SUCCESS".to_string(),
            transaction_id: "abc123".to_string(),
        };
        let outcome = service.accept_webhook(webhook).await.expect("should handle");
        assert_eq!(
            outcome,
            WebhookOutcome::Rejected {
                transaction_id: "abc123".to_string()
            }
        );
        assert!(!outcome.is_accepted());
    }

    #[tokio::test]
    async fn malformed_webhook_is_decode_error() {
        let service = service(Arc::new(MemoryStore::default()));
        let err = service
            .handle_webhook(b"{\"Status\":\"SUCCESS\"}")
            .await
            .expect_err("missing fields should fail");
        assert!(matches!(err, BillingError::Decode { .. }));
    }

    #[tokio::test]
    async fn accepted_webhook_without_record_has_none() {
        let service = service(Arc::new(MemoryStore::default()));
        let webhook = PaymentWebhook {
            hash: webhook_signature("tok1", "unknown", "SUCCESS"),
            status: "SUCCESS".to_string(),
            transaction_id: "unknown".to_string(),
        };
        let outcome = service.accept_webhook(webhook).await.expect("should handle");
        assert!(matches!(
            outcome,
            WebhookOutcome::Accepted {
                transaction: None,
                ..
            }
        ));
    }
}
