use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use taskhub::config::Configuration;
use taskhub::{app, initialize_state, telemetry};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() {
    telemetry::setup_logging();

    let config = Configuration::default()
        .path(
            std::env::var("CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_default(),
        )
        .read();

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "cannot install prometheus recorder");
            std::process::exit(1);
        },
    };

    // Without a store the API is unusable; an operator must fix the
    // configuration and restart.
    let state = match initialize_state(config.clone(), metrics).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "cannot connect to the store");
            std::process::exit(1);
        },
    };

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "cannot bind address");
            std::process::exit(1);
        },
    };

    tracing::info!(%addr, version = %config.version, "server started");

    if let Err(err) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server stopped unexpectedly");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl+c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}
