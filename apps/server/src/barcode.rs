//! # Barcode Service
//!
//! Code128 images for product labels, cached on the product row as a
//! `data:image/png;base64,...` URI.
//!
//! ## Lookup Order
//! ```text
//! get_or_create("KOPI-01")
//!      │
//!      ├── no row in either table ──────────► ProductNotFound (404)
//!      ├── cached image on the row ─────────► { barcode, cached: true }
//!      ├── generation disabled ─────────────► Disabled (503)
//!      └── encode on the blocking pool
//!            └── save on every row with the SKU ► { barcode, cached: false }
//! ```

use std::sync::Arc;

use barcoders::generators::image::Image;
use barcoders::sym::code128::Code128;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use justcani_db::{BarcodeRecord, Database, DbError};

use crate::error::ApiError;

/// Code set B: printable ASCII, which covers every valid SKU.
const CODE_SET_B: char = '\u{0181}';

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum BarcodeError {
    #[error("Barcode generation is disabled")]
    Disabled,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Cannot encode {sku}: {reason}")]
    Encode { sku: String, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<BarcodeError> for ApiError {
    fn from(err: BarcodeError) -> Self {
        match err {
            BarcodeError::Disabled => {
                ApiError::feature_disabled("Barcode generation is not available")
            }
            BarcodeError::ProductNotFound(sku) => ApiError::not_found("Product", &sku),
            BarcodeError::Encode { sku, reason } => {
                tracing::error!(sku = %sku, "Barcode encoding failed: {}", reason);
                ApiError::internal("Barcode encoding failed")
            }
            BarcodeError::Db(e) => ApiError::from(e),
        }
    }
}

// =============================================================================
// Encoders
// =============================================================================

/// Turns a SKU into PNG bytes. Runs on the blocking pool.
pub trait BarcodeEncoder: Send + Sync {
    fn encode_png(&self, sku: &str) -> Result<Vec<u8>, BarcodeError>;
}

/// Code128 rendered with `barcoders`.
#[derive(Debug, Clone, Copy)]
pub struct Code128Encoder {
    height: u32,
}

impl Code128Encoder {
    pub fn new(height: u32) -> Self {
        Code128Encoder { height }
    }
}

impl Default for Code128Encoder {
    fn default() -> Self {
        Code128Encoder::new(80)
    }
}

impl BarcodeEncoder for Code128Encoder {
    fn encode_png(&self, sku: &str) -> Result<Vec<u8>, BarcodeError> {
        let encode_err = |reason: String| BarcodeError::Encode {
            sku: sku.to_string(),
            reason,
        };

        let symbol =
            Code128::new(format!("{}{}", CODE_SET_B, sku)).map_err(|e| encode_err(e.to_string()))?;
        let bars = symbol.encode();

        Image::png(self.height)
            .generate(&bars[..])
            .map_err(|e| encode_err(e.to_string()))
    }
}

pub fn to_data_uri(png: &[u8]) -> String {
    format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(png))
}

// =============================================================================
// Service
// =============================================================================

/// Result of `BarcodeService::get_or_create`.
#[derive(Debug, Clone)]
pub struct ProductBarcode {
    pub record: BarcodeRecord,
    pub barcode: String,
    pub cached: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateAllSummary {
    pub total: usize,
    pub generated: usize,
    pub failed: Vec<String>,
}

/// Barcode lookups and generation. `encoder` is `None` when disabled.
#[derive(Clone)]
pub struct BarcodeService {
    db: Database,
    encoder: Option<Arc<dyn BarcodeEncoder>>,
}

impl BarcodeService {
    pub fn new(db: Database, encoder: Option<Arc<dyn BarcodeEncoder>>) -> Self {
        BarcodeService { db, encoder }
    }

    pub fn is_enabled(&self) -> bool {
        self.encoder.is_some()
    }

    /// Encodes a fresh PNG without touching the database.
    pub async fn encode_png(&self, sku: &str) -> Result<Vec<u8>, BarcodeError> {
        let encoder = self.encoder.clone().ok_or(BarcodeError::Disabled)?;
        let owned = sku.to_string();

        tokio::task::spawn_blocking(move || encoder.encode_png(&owned))
            .await
            .map_err(|e| BarcodeError::Encode {
                sku: sku.to_string(),
                reason: e.to_string(),
            })?
    }

    /// Returns the cached barcode for a product, encoding and caching it on
    /// first use.
    ///
    /// ## Errors
    /// - `ProductNotFound` when the SKU is in neither product table
    /// - `Disabled` when there is no cached image and generation is off
    pub async fn get_or_create(&self, sku: &str) -> Result<ProductBarcode, BarcodeError> {
        let record = self
            .db
            .barcodes()
            .find(sku)
            .await?
            .ok_or_else(|| BarcodeError::ProductNotFound(sku.to_string()))?;

        if let Some(cached) = record.cached_image() {
            debug!(sku = %sku, "Barcode cache hit");
            let barcode = cached.to_string();
            return Ok(ProductBarcode {
                record,
                barcode,
                cached: true,
            });
        }

        let barcode = to_data_uri(&self.encode_png(sku).await?);
        self.db.barcodes().save(sku, &barcode).await?;
        info!(sku = %sku, kind = record.kind.as_str(), "Barcode generated");

        Ok(ProductBarcode {
            record,
            barcode,
            cached: false,
        })
    }

    /// Generates barcodes for every product that has none.
    ///
    /// A SKU that fails to encode is reported in `failed` and skipped.
    pub async fn generate_missing(&self) -> Result<GenerateAllSummary, BarcodeError> {
        if !self.is_enabled() {
            return Err(BarcodeError::Disabled);
        }

        let missing = self.db.barcodes().without_barcode().await?;
        let mut summary = GenerateAllSummary {
            total: missing.len(),
            ..GenerateAllSummary::default()
        };

        for product in missing {
            match self.get_or_create(&product.sku).await {
                Ok(_) => summary.generated += 1,
                Err(BarcodeError::Encode { sku, reason }) => {
                    warn!(sku = %sku, "Skipping barcode: {}", reason);
                    summary.failed.push(sku);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            total = summary.total,
            generated = summary.generated,
            "Bulk barcode generation finished"
        );
        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use justcani_core::{NewAuctionProduct, NewRegularProduct};
    use justcani_db::DbConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    #[derive(Default)]
    struct CountingEncoder {
        calls: AtomicUsize,
    }

    impl BarcodeEncoder for CountingEncoder {
        fn encode_png(&self, sku: &str) -> Result<Vec<u8>, BarcodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if sku.starts_with("BAD") {
                return Err(BarcodeError::Encode {
                    sku: sku.to_string(),
                    reason: "unsupported".to_string(),
                });
            }
            Ok(sku.as_bytes().to_vec())
        }
    }

    async fn db_with(skus: &[&str]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for sku in skus {
            db.products()
                .insert(&NewRegularProduct {
                    sku: sku.to_string(),
                    name: format!("Produk {}", sku),
                    price: 5_000,
                    stock: 10,
                    expiry_date: None,
                })
                .await
                .unwrap();
        }
        db
    }

    #[test]
    fn test_code128_encoder_outputs_png() {
        let png = Code128Encoder::default().encode_png("INDOMIE-GRG").unwrap();
        assert!(png.starts_with(PNG_MAGIC));
        assert!(to_data_uri(&png).starts_with("data:image/png;base64,iVBOR"));
    }

    #[tokio::test]
    async fn test_second_call_is_cached() {
        let db = db_with(&["KOPI-01"]).await;
        let encoder = Arc::new(CountingEncoder::default());
        let service = BarcodeService::new(db, Some(encoder.clone() as Arc<dyn BarcodeEncoder>));

        let first = service.get_or_create("KOPI-01").await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.barcode, to_data_uri(b"KOPI-01"));

        let second = service.get_or_create("KOPI-01").await.unwrap();
        assert!(second.cached);
        assert_eq!(second.barcode, first.barcode);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auction_listing_gets_barcode() {
        let db = db_with(&[]).await;
        db.auctions()
            .insert(&NewAuctionProduct {
                sku: "LLG-01".to_string(),
                name: "Kipas".to_string(),
                price: 50_000,
                reason: None,
            })
            .await
            .unwrap();

        let service = BarcodeService::new(db.clone(), Some(Arc::new(CountingEncoder::default())));
        let barcode = service.get_or_create("LLG-01").await.unwrap();
        assert_eq!(barcode.record.kind, justcani_core::ProductKind::Auction);

        let listing = db.auctions().get_by_sku("LLG-01").await.unwrap().unwrap();
        assert!(listing.has_barcode());
    }

    #[tokio::test]
    async fn test_not_found_and_disabled() {
        let db = db_with(&["TEH-01"]).await;
        let disabled = BarcodeService::new(db.clone(), None);

        assert!(matches!(
            disabled.get_or_create("NOPE").await,
            Err(BarcodeError::ProductNotFound(_))
        ));
        assert!(matches!(
            disabled.get_or_create("TEH-01").await,
            Err(BarcodeError::Disabled)
        ));

        // A barcode cached while enabled is still served when disabled
        let enabled = BarcodeService::new(db, Some(Arc::new(CountingEncoder::default())));
        enabled.get_or_create("TEH-01").await.unwrap();
        assert!(disabled.get_or_create("TEH-01").await.unwrap().cached);
    }

    #[tokio::test]
    async fn test_generate_missing_skips_failures() {
        let db = db_with(&["A-01", "B-01", "BAD-01"]).await;
        let service = BarcodeService::new(db.clone(), Some(Arc::new(CountingEncoder::default())));
        service.get_or_create("A-01").await.unwrap();

        let summary = service.generate_missing().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.generated, 1);
        assert_eq!(summary.failed, vec!["BAD-01".to_string()]);

        let status = db.barcodes().status().await.unwrap();
        assert_eq!(status.with_barcode, 2);
    }
}
