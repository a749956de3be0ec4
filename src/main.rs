use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crpt_api_client::client::CrptClient;
use crpt_api_client::config::Config;
use crpt_api_client::document::ProductDocument;
use crpt_api_client::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load Config first so the log level can come from it
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!(
        "Starting CRPT client. Limit: {} requests per {}s, target: {}",
        config.request_limit, config.interval_secs, config.base_url
    );

    let client = CrptClient::with_settings(
        Duration::from_secs(config.interval_secs),
        config.request_limit,
        config.base_url,
        config.auth_token,
        config.product_group,
    )?;

    // Sample document; real callers fill this in from their own data.
    let document = ProductDocument {
        participant_inn: "1234567890".into(),
        production_date: "2025-08-01".into(),
        usage_type: "SOME_TYPE".into(),
        ..Default::default()
    };
    let signature = std::env::var("CRPT_SIGNATURE").unwrap_or_default();

    match client.submit(&document, &signature).await {
        Ok(body) => info!("Document created: {}", body),
        Err(e) => error!("Submission failed: {}", e),
    }

    client.shutdown();
    Ok(())
}
