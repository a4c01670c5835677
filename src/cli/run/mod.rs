//! Run command - starts the job worker and the health server

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::{create_router, ApiState};
use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::observability::init_metrics;

/// Run the worker until Ctrl+C or SIGTERM
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let state = crate::create_worker_state(&config)?;
    let metrics = init_metrics(&config.metrics);
    let shutdown = CancellationToken::new();

    let server = if config.server.enabled {
        let addr = build_socket_addr(&config)?;
        let listener = TcpListener::bind(addr).await?;
        info!("Health server listening on {}", addr);

        let app = create_router(
            ApiState::new(state.worker.status(), config.worker.task_type.clone()),
            metrics,
        );
        let stop = shutdown.clone().cancelled_owned();

        Some(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(stop)
                .await
        }))
    } else {
        None
    };

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    state.worker.run(shutdown.clone()).await;
    shutdown.cancel();

    if let Some(server) = server {
        server.await??;
    }

    info!("Worker shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_socket_addr() {
        let config = AppConfig::default();

        let addr = build_socket_addr(&config).unwrap();

        assert_eq!(addr.to_string(), "0.0.0.0:8081");
    }

    #[test]
    fn test_build_socket_addr_rejects_hostname() {
        let mut config = AppConfig::default();
        config.server.host = "localhost".to_string();

        assert!(build_socket_addr(&config).is_err());
    }
}
