//! Dashboard server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use tidecast_core::{PriceProvider, ReqwestHttpClient, YahooDailyAdapter};
use tidecast_pipeline::{Orchestrator, OrchestratorConfig};

mod cli;
mod routes;

use cli::ServeArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServeArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidecast=info,tower_http=info".into()),
        )
        .init();

    let provider: Arc<dyn PriceProvider> = if args.real_data {
        info!("using Yahoo Finance daily history");
        Arc::new(YahooDailyAdapter::with_http_client(Arc::new(
            ReqwestHttpClient::new(),
        )))
    } else {
        info!("using deterministic built-in history");
        Arc::new(YahooDailyAdapter::default())
    };

    let config = OrchestratorConfig {
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        forecast_timeout: Duration::from_secs(args.forecast_timeout_secs),
    };
    let orchestrator = Arc::new(Orchestrator::with_config(provider, config));

    // Warm the default selection so the first dashboard request has data.
    let warmup = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        warmup.refresh().await;
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let app = routes::router(orchestrator);

    info!(%addr, "dashboard server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
