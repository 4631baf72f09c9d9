//! Storefront payment proxy - holds the processor secret and creates/confirms payment intents

use anyhow::Result;
use std::sync::Arc;
use storefront_checkout::config::AppConfig;
use storefront_checkout::infrastructure::StripeProcessor;
use storefront_checkout::server::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    if config.stripe_secret_key.is_some() {
        tracing::info!(key = %config.masked_secret_key(), "Stripe secret key detected");
    } else {
        tracing::error!("STRIPE_SECRET_KEY is not set; payment requests will fail");
    }

    let processor = StripeProcessor::new(
        config.http_client()?,
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
        config.currency.clone(),
    );
    let app = router(AppState::new(Arc::new(processor)));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Payment proxy listening on http://{}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
