//! # Barcode Repository
//!
//! The encoded Code128 image is cached on the product row. A SKU may sit
//! in either product table, so every query here spans both.
//!
//! ```text
//! regular_products ─┐
//!                   ├── UNION ALL ──► ProductSummary { sku, name, price, kind, has_barcode }
//! auction_products ─┘
//! ```

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use super::begin_write;
use crate::error::DbResult;
use justcani_core::{ProductKind, ProductSummary};

const ALL_PRODUCTS: &str = r#"
    SELECT sku, name, price, 'regular' AS kind,
           (barcode_image IS NOT NULL AND barcode_image <> '') AS has_barcode
    FROM regular_products
    UNION ALL
    SELECT sku, name, price, 'auction' AS kind,
           (barcode_image IS NOT NULL AND barcode_image <> '') AS has_barcode
    FROM auction_products
"#;

/// A product as the barcode service sees it.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BarcodeRecord {
    pub sku: String,
    pub name: String,
    pub price: i64,
    pub kind: ProductKind,
    pub barcode_image: Option<String>,
}

impl BarcodeRecord {
    /// The cached image, treating an empty string as absent.
    pub fn cached_image(&self) -> Option<&str> {
        self.barcode_image.as_deref().filter(|b| !b.is_empty())
    }
}

/// Barcode coverage across both product tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarcodeStatus {
    pub total_products: i64,
    pub with_barcode: i64,
    pub without_barcode: i64,
    /// `with / total × 100`, two decimals; 0 when there are no products.
    pub progress_percentage: f64,
}

impl BarcodeStatus {
    pub fn from_counts(total_products: i64, with_barcode: i64) -> Self {
        let progress_percentage = if total_products > 0 {
            (with_barcode as f64 * 100.0 / total_products as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };

        BarcodeStatus {
            total_products,
            with_barcode,
            without_barcode: total_products - with_barcode,
            progress_percentage,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BarcodeRepository {
    pool: SqlitePool,
}

impl BarcodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BarcodeRepository { pool }
    }

    /// Finds a SKU, preferring the regular table when it exists in both.
    pub async fn find(&self, sku: &str) -> DbResult<Option<BarcodeRecord>> {
        let record = sqlx::query_as::<_, BarcodeRecord>(
            r#"
            SELECT sku, name, price, kind, barcode_image FROM (
                SELECT sku, name, price, 'regular' AS kind, barcode_image, 0 AS pref
                FROM regular_products WHERE sku = ?1
                UNION ALL
                SELECT sku, name, price, 'auction' AS kind, barcode_image, 1 AS pref
                FROM auction_products WHERE sku = ?1
            )
            ORDER BY pref
            LIMIT 1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Stores an encoded image on every row with this SKU.
    ///
    /// ## Returns
    /// Number of rows updated (0 when the SKU exists nowhere).
    pub async fn save(&self, sku: &str, image: &str) -> DbResult<u64> {
        let mut tx = begin_write(&self.pool).await?;

        let regular = sqlx::query("UPDATE regular_products SET barcode_image = ?2 WHERE sku = ?1")
            .bind(sku)
            .bind(image)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let auction = sqlx::query("UPDATE auction_products SET barcode_image = ?2 WHERE sku = ?1")
            .bind(sku)
            .bind(image)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        debug!(sku = %sku, rows = regular + auction, "Barcode cached");
        Ok(regular + auction)
    }

    pub async fn status(&self) -> DbResult<BarcodeStatus> {
        let (total, with_barcode): (i64, i64) = sqlx::query_as(&format!(
            "SELECT COUNT(*), COALESCE(SUM(has_barcode), 0) FROM ({ALL_PRODUCTS})"
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(BarcodeStatus::from_counts(total, with_barcode))
    }

    /// Every product of both kinds, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<ProductSummary>> {
        let products = sqlx::query_as::<_, ProductSummary>(&format!(
            "SELECT * FROM ({ALL_PRODUCTS}) ORDER BY name, kind DESC, sku"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products of both kinds that still need a barcode, ordered by name.
    pub async fn without_barcode(&self) -> DbResult<Vec<ProductSummary>> {
        let products = sqlx::query_as::<_, ProductSummary>(&format!(
            "SELECT * FROM ({ALL_PRODUCTS}) WHERE has_barcode = 0 ORDER BY name, kind DESC, sku"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
