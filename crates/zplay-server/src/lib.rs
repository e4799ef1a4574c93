//! HTTP/JSON surface for zplay.
//!
//! [`router`] builds the axum application over a shared
//! [`SessionRegistry`]; [`serve`] runs it until a shutdown future resolves.

/// Request and response bodies plus route handlers.
pub mod api;
/// Server configuration.
pub mod config;
/// Mapping registry failures to HTTP responses.
pub mod error;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span};
use zplay_session::SessionRegistry;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<SessionRegistry>,
}

impl AppState {
    /// Wrap a registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry behind the API.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

/// All routes, with per-request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/games", get(api::list_games))
        .route("/api/sessions", post(api::create_session))
        .route(
            "/api/sessions/{id}",
            get(api::get_session).delete(api::delete_session),
        )
        .route("/api/sessions/{id}/input", post(api::send_input))
        .route("/api/sessions/{id}/output", get(api::get_output))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

async fn trace_request(request: Request, next: Next) -> Response {
    let span = info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    );
    async move {
        let response = next.run(request).await;
        debug!(status = response.status().as_u16(), "response");
        response
    }
    .instrument(span)
    .await
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Periodically evict idle sessions from `registry`.
pub fn spawn_sweeper(registry: Arc<SessionRegistry>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle().await;
            if evicted > 0 {
                let remaining = registry.len().await;
                info!(evicted, remaining, "idle sweep");
            }
        }
    })
}
