use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::ai::AiBridge;
use super::api::{self, AppState, SharedState};
use super::db::{DbHandle, TaskboardDb};
use crate::config::ServerSettings;

/// Origin of the bundled web client during local development.
const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:3000";

/// Build the full application router: API routes, fixed 404, CORS, tracing.
pub fn build_router(state: SharedState, cors: CorsLayer) -> Router {
    api::api_router()
        .fallback(api::not_found)
        .method_not_allowed_fallback(api::not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS policy: `http://localhost:3000` plus `client_url`, with credentials.
///
/// A `client_url` of `*` mirrors whatever origin the request carries. Dev
/// mode allows everything.
pub fn cors_layer(settings: &ServerSettings) -> Result<CorsLayer> {
    if settings.dev_mode {
        return Ok(CorsLayer::permissive());
    }

    let allow_origin = match settings.client_url.as_deref() {
        Some("*") => AllowOrigin::mirror_request(),
        Some(url) => {
            let extra = HeaderValue::from_str(url.trim_end_matches('/'))
                .with_context(|| format!("Invalid CLIENT_URL '{}'", url))?;
            AllowOrigin::list([HeaderValue::from_static(DEFAULT_CLIENT_ORIGIN), extra])
        }
        None => AllowOrigin::exact(HeaderValue::from_static(DEFAULT_CLIENT_ORIGIN)),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Open the database, bind, and serve until Ctrl+C.
pub async fn start_server(settings: &ServerSettings, ai: AiBridge) -> Result<()> {
    if let Some(parent) = settings.db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let db = TaskboardDb::new(&settings.db_path).context("Failed to initialize taskboard database")?;

    let host = if settings.dev_mode {
        "0.0.0.0"
    } else {
        settings.host.as_str()
    };
    let addr = format!("{}:{}", host, settings.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    serve(listener, settings, DbHandle::new(db), ai, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<S>(
    listener: TcpListener,
    settings: &ServerSettings,
    db: DbHandle,
    ai: AiBridge,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState { db, ai });
    let app = build_router(state, cors_layer(settings)?);

    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        db = %settings.db_path.display(),
        dev_mode = settings.dev_mode,
        "Taskboard API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
