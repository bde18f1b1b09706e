use akouendy_billing::billing::BillingClient;
use akouendy_billing::config::{BillingConfig, LoggingConfig};
use akouendy_billing::database::billing_transaction_repository::BillingTransactionRepository;
use akouendy_billing::database::{init_pool_from_config, run_migrations};
use akouendy_billing::logging::init_tracing;
use akouendy_billing::services::BillingService;
use akouendy_billing::{config::DatabaseConfig, OrderRequest};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(&LoggingConfig::from_env()?);

    let config = BillingConfig::from_env()?;
    config.validate()?;

    let db_config = DatabaseConfig::from_env()?;
    db_config.validate()?;
    let pool = init_pool_from_config(&db_config).await?;
    run_migrations(&pool).await?;

    let client = Arc::new(BillingClient::new(Arc::new(config.clone()))?);
    let store = Arc::new(BillingTransactionRepository::new(pool));
    let service = BillingService::new(&config, client, store);

    let transaction_id = uuid::Uuid::new_v4().to_string();
    let placed = service
        .place_order(
            &transaction_id,
            OrderRequest {
                customer_email: "awa@example.sn".to_string(),
                customer_full_name: "Awa Diop".to_string(),
                customer_id: "cus-1".to_string(),
                billing_provider: "wave".to_string(),
                price_id: "price-basic".to_string(),
                app_id: "app-1".to_string(),
                webhook: String::new(),
            },
            None,
        )
        .await?;

    println!("State: {:?}", placed.state);
    println!("Payment URL: {}", placed.response.payment_url);
    if let Some(trx) = placed.transaction {
        println!("Stored transaction {} (token {})", trx.id, trx.payment_token);
    }

    Ok(())
}
