use std::sync::Arc;
use tickcast::config::Config;
use tickcast::services::{ArtifactStore, ModelRegistry, SignalService};
use tickcast::sources::{PriceSource, YahooFinanceClient};
use tickcast::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickcast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Tickcast server on {}:{}", config.host, config.port);
    info!(
        "Models from {}, financial signals from {}, results to {}",
        config.models_dir.display(),
        config.financial_signals_dir.display(),
        config.output_dir.display()
    );

    let source: Arc<dyn PriceSource> = Arc::new(YahooFinanceClient::new(&config.yahoo_base_url)?);
    let artifacts = Arc::new(ArtifactStore::from_config(&config, &ModelRegistry::new())?);
    let signal_service = Arc::new(SignalService::new(
        source.clone(),
        artifacts,
        config.signals.clone(),
        config.financial_signals_dir.clone(),
        config.output_dir.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        signal_service,
        source,
    };
    let app = tickcast::app(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Tickcast server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
