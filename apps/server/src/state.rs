//! Shared application state.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState (Clone, handed to every handler by axum)                      │
//! │                                                                         │
//! │  db        Database          SqlitePool, thread-safe                    │
//! │  config    Arc<ServerConfig> read-only after startup                    │
//! │  jwt       Arc<JwtManager>   token issue / validate                     │
//! │  barcodes  BarcodeService    encoder is None when disabled              │
//! │  clock     StoreClock        store-local day boundaries                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database is the only mutable state.

use std::sync::Arc;

use justcani_core::StoreClock;
use justcani_db::Database;

use crate::auth::JwtManager;
use crate::barcode::{BarcodeEncoder, BarcodeService, Code128Encoder};
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
    pub jwt: Arc<JwtManager>,
    pub barcodes: BarcodeService,
    pub clock: StoreClock,
}

impl AppState {
    /// Wires the state from a loaded config and an open database.
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let encoder = config
            .barcode_enabled
            .then(|| Arc::new(Code128Encoder::default()) as Arc<dyn BarcodeEncoder>);

        Self::with_encoder(db, config, encoder)
    }

    /// Same as `new`, with an explicit barcode encoder (or `None` to disable).
    pub fn with_encoder(
        db: Database,
        config: ServerConfig,
        encoder: Option<Arc<dyn BarcodeEncoder>>,
    ) -> Self {
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_lifetime_secs,
        ));

        AppState {
            barcodes: BarcodeService::new(db.clone(), encoder),
            clock: config.store_clock(),
            config: Arc::new(config),
            jwt,
            db,
        }
    }
}
