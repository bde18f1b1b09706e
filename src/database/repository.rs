use crate::database::billing_transaction_repository::BillingTransaction;
use crate::database::error::DatabaseError;
use async_trait::async_trait;

/// Storage capability for billing transactions.
///
/// Records are written once and only read afterwards.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(
        &self,
        transaction: &BillingTransaction,
    ) -> Result<BillingTransaction, DatabaseError>;

    async fn find_by_payment_token(
        &self,
        payment_token: &str,
    ) -> Result<Option<BillingTransaction>, DatabaseError>;

    /// Latest record created for the caller's transaction id
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<BillingTransaction>, DatabaseError>;
}
