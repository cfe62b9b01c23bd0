//! Liveness and table counts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use justcani_db::TableCounts;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub barcode_enabled: bool,
    pub tables: Option<TableCounts>,
    pub version: &'static str,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let tables = if database {
        match state.db.table_counts().await {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::warn!("Health check could not count rows: {}", e);
                None
            }
        }
    } else {
        None
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
            barcode_enabled: state.barcodes.is_enabled(),
            tables,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
