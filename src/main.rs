use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use house_stats_backend::clock::SystemClock;
use house_stats_backend::config::Config;
use house_stats_backend::logging::{init_tracing, LogConfig};
use house_stats_backend::routes::build_router;
use house_stats_backend::state::AppState;
use house_stats_backend::store::Store;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = init_tracing(&LogConfig::from(&config)) {
        eprintln!("FATAL: {e}");
        return ExitCode::FAILURE;
    }
    tracing::info!("Starting house-stats-backend");

    let store = match Store::open(&config.sled_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, path = %config.sled_path, "Failed to open sled database");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = store.run_migrations() {
        tracing::error!(error = %e, "Failed to run migrations");
        return ExitCode::FAILURE;
    }

    let cors_layer = match build_cors_layer(&config) {
        Ok(layer) => layer,
        Err(message) => {
            tracing::error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(store.clone(), Arc::new(SystemClock), &config);

    let app = build_router(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind TCP listener");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "Listening");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    if let Err(e) = served {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
        return ExitCode::FAILURE;
    }
    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer, String> {
    let base = CorsLayer::new()
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_methods(Any);

    if config.cors_origin.trim() == "*" {
        return Ok(base.allow_origin(Any));
    }

    config
        .cors_origin
        .parse::<HeaderValue>()
        .map(|origin| base.allow_origin(origin))
        .map_err(|e| format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
}
