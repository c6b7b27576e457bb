//! concordance-transformer - Smartlogic concordance transformer
//!
//! Listens to the concept stream for concordance updates, transforms the
//! Smartlogic concordance JSON and forwards the result to the concordance
//! writer. The same transformation is exposed over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use concordance_common::config::default_config_path;
use concordance_common::logging::init_logging;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use concordance_transformer::config::{Args, Settings, APP_DESCRIPTION};
use concordance_transformer::consumer::{RedisStreamConsumer, StreamConsumerConfig};
use concordance_transformer::writer::HttpConcordanceWriter;
use concordance_transformer::{build_router, AppState, Dispatcher, ServiceInfo};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let explicit_config = args.config.clone();
    let settings = Settings::load(args).context("Failed to load configuration")?;

    init_logging(&settings.log_level, settings.log_format).context("Failed to initialise logging")?;

    info!(
        "Starting {} v{} [{}] built {} ({})",
        settings.app_name,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match explicit_config.or_else(default_config_path) {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found; using command-line, environment and compiled defaults"),
    }
    info!(
        writer_address = %settings.writer_address,
        topic = %settings.topic,
        group_name = %settings.group_name,
        system_code = %settings.app_system_code,
        port = settings.port,
        "[Startup] smartlogic-concordance-transformer is starting"
    );

    let writer = HttpConcordanceWriter::new(&settings.writer_address, settings.writer_timeout)
        .context("Failed to create writer client")?;
    let dispatcher = Dispatcher::new(Arc::new(writer), settings.topic.clone());

    // Connecting happens on the listener task so HTTP is served while the
    // broker is unreachable
    let consumer = RedisStreamConsumer::new(StreamConsumerConfig::new(
        settings.broker_connection_string.clone(),
        settings.topic.clone(),
        settings.group_name.clone(),
    ))
    .context("Invalid broker connection string")?;

    let state = AppState::new(
        dispatcher.clone(),
        Arc::new(consumer.connectivity_check()),
        ServiceInfo {
            system_code: settings.app_system_code.clone(),
            name: settings.app_name.clone(),
            description: APP_DESCRIPTION.to_string(),
        },
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/__health", addr);

    let shutdown = CancellationToken::new();
    let consumer_task = tokio::spawn(consumer.start_listening(dispatcher, shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down stream consumer");
    shutdown.cancel();
    consumer_task.await.context("Stream consumer task failed")?;

    info!("Stopping application");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
