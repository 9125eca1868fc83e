mod config;

use aishim::{
    AppState, backend::WorkersAiBackend, build_metrics_layer_and_handle, build_metrics_router,
    build_router, client::create_hyper_client,
};
use clap::Parser as _;
use config::Config;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

#[tokio::main]
#[instrument]
pub async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse().validate()?;
    info!(
        port = config.port,
        metrics = config.metrics,
        base_url = %config.base_url,
        account_id = %config.account_id,
        "Starting aishim"
    );

    let backend = WorkersAiBackend::builder()
        .http_client(create_hyper_client(config.pool_settings()))
        .base_url(config.base_url.clone())
        .account_id(config.account_id.clone())
        .api_token(config.api_token.clone())
        .build();

    let mut router = build_router(AppState::new(backend));

    if config.metrics {
        let (prometheus_layer, handle) =
            build_metrics_layer_and_handle(config.metrics_prefix.clone());
        router = router.layer(prometheus_layer);

        let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
        let metrics_listener = TcpListener::bind(&metrics_addr).await?;
        info!("Metrics endpoint listening on {}", metrics_addr);

        let metrics_router = build_metrics_router(handle);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_router).await {
                error!("Metrics server stopped: {}", e);
            }
        });
    }

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("aishim listening on {}", bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
