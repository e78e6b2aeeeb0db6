use anyhow::Context;
use parking_ingest::{config, liveness, router, subscriber::Subscriber, AppState};
use parkwatch_core::logging;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_from_env();

    let config = config::from_env().context("loading configuration")?;
    let state = Arc::new(AppState::new(&config)?);

    let subscriber = Subscriber::new(config.mqtt.clone(), state.occupancy.clone());
    tokio::spawn(subscriber.run());

    if let Some(secs) = config.liveness.stale_after_secs {
        liveness::spawn(state.occupancy.clone(), Duration::from_secs(secs));
    }

    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", config.http.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!("Parking ingest service listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
