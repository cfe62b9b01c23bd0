//! # JustCani Server
//!
//! axum HTTP API over `justcani-db`.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TraceLayer ─► CORS ─► Router                                           │
//! │                          │                                              │
//! │                          ├── AuthUser / AdminUser (Bearer JWT)          │
//! │                          ├── ApiJson<T> (bad JSON → 400 error body)     │
//! │                          ▼                                              │
//! │                       handler ─► repository / aggregator                │
//! │                          │                                              │
//! │                          ▼                                              │
//! │              Json<T>  or  ApiError { code, message }                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod barcode;
pub mod config;
pub mod error;
pub mod images;
pub mod password;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Public URL prefix of stored profile pictures (served from `UPLOAD_DIR`).
pub const PROFILE_PICS_PATH: &str = "/static/uploads/profile_pics";

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router(&state))
        .nest_service(PROFILE_PICS_PATH, ServeDir::new(&state.config.upload_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}
