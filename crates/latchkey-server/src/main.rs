#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use latchkey::{MemoryStore, RedisStore};
use server::config::{CliArgs, ServerConfig, StoreBackend};
use server::service::{AppState, SharedStore, router};
use server::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let store = connect_store(&config).await?;
    let state = AppState::new(store, &config).context("failed to build credential service")?;
    state
        .validator
        .ping()
        .await
        .context("credential store is not reachable")?;
    if config.endpoints.is_empty() {
        tracing::warn!("No endpoints configured, every issuance will fail");
    }

    let tls = match &config.tls {
        Some(tls) => Some(tls.load().await?),
        None => None,
    };

    let listener = TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    log_startup_info(&config);

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
    );

    let res = match tls {
        Some(tls) => serve_tls(listener, app, tls).await,
        None => axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await,
    };

    match &res {
        Ok(()) => tracing::info!("Service shut down successfully"),
        Err(e) => tracing::error!("Server error: {e}"),
    }
    providers.shutdown();
    res.map_err(Into::into)
}

async fn serve_tls(listener: TcpListener, app: Router, tls: RustlsConfig) -> std::io::Result<()> {
    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            handle.graceful_shutdown(None);
        }
    });

    axum_server::from_tcp_rustls(listener.into_std()?, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

async fn connect_store(config: &ServerConfig) -> anyhow::Result<SharedStore> {
    let store: SharedStore = match config.store_backend {
        StoreBackend::Redis => Arc::new(
            RedisStore::connect(&config.redis_addr, config.redis_connect_retries)
                .await
                .with_context(|| format!("failed to connect to redis at {}", config.redis_addr))?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, credentials are local to this process");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting credential service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting credential service on {} ({}) with {} endpoints ({:?} store)",
            config.server_addr,
            if config.tls.is_some() { "https" } else { "http" },
            config.endpoints.len(),
            config.store_backend
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
