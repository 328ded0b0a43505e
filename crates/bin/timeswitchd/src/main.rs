use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use timeswitch_adapter_http_axum::state::AppState;
use timeswitch_adapter_state_memory::InMemoryStateStore;
use timeswitchd::config::Config;
use timeswitchd::wiring;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // State
    let states = Arc::new(
        InMemoryStateStore::load(&config.state.snapshot).context("loading state snapshot")?,
    );

    // Processor and schedules
    let (processor, jobs) = wiring::build_default_processor(&config, Arc::clone(&states))
        .context("building command processor")?;
    let loaded =
        wiring::load_schedules(&processor, &states, &config.state.schedule_prefix).await;
    tracing::info!(schedules = loaded, "schedules loaded");

    // HTTP
    let app = timeswitch_adapter_http_axum::router::build(AppState::new(Arc::clone(&processor)));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "timeswitchd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    // Shutdown
    processor.shutdown().await;
    jobs.shutdown();
    states
        .save(&config.state.snapshot)
        .context("saving state snapshot")?;
    tracing::info!("timeswitchd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
