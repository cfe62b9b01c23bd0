//! # Product Repository
//!
//! Regular (stocked) products.
//!
//! ## Key Operations
//! - Substring search over name and SKU
//! - Insert and restock
//! - Move to auction (atomic: delete here, insert into `auction_products`)
//!
//! ## Stock Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert (stock = N)                                                     │
//! │     │                                                                   │
//! │     ├── restock(+q)          stock = stock + q                          │
//! │     ├── checkout(-q)         stock = stock - q  WHERE stock >= q        │
//! │     │                        (TransactionRepository)                    │
//! │     └── move_to_auction      row leaves this table                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{begin_write, like_pattern};
use crate::error::{DbError, DbResult};
use justcani_core::{AuctionProduct, NewRegularProduct, RegularProduct};

pub(crate) const REGULAR_COLUMNS: &str =
    "sku, name, price, stock, expiry_date, barcode_image, created_at";

/// Repository for regular product operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("indomie", 50).await?;
/// let product = repo.get_by_sku("INDOMIE-GRG").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches by case-insensitive substring of name or SKU.
    ///
    /// An empty query lists everything, ordered by name.
    ///
    /// ## Arguments
    /// * `query` - Search term (already validated)
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<RegularProduct>> {
        let query = query.trim();
        debug!(query = %query, limit, "Searching regular products");

        let products = sqlx::query_as::<_, RegularProduct>(&format!(
            r#"
            SELECT {REGULAR_COLUMNS}
            FROM regular_products
            WHERE name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\'
            ORDER BY name, sku
            LIMIT ?2
            "#
        ))
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<RegularProduct>> {
        let product = sqlx::query_as::<_, RegularProduct>(&format!(
            "SELECT {REGULAR_COLUMNS} FROM regular_products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `UniqueViolation` when the SKU already exists.
    pub async fn insert(&self, product: &NewRegularProduct) -> DbResult<RegularProduct> {
        debug!(sku = %product.sku, "Inserting regular product");

        sqlx::query(
            r#"
            INSERT INTO regular_products (sku, name, price, stock, expiry_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.expiry_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&product.sku))?;

        info!(sku = %product.sku, stock = product.stock, "Product added");
        self.require(&product.sku).await
    }

    /// Adds `qty` units to a product's stock.
    ///
    /// ## Returns
    /// The product after restocking.
    pub async fn restock(&self, sku: &str, qty: i64) -> DbResult<RegularProduct> {
        debug!(sku = %sku, qty, "Restocking");

        let result = sqlx::query("UPDATE regular_products SET stock = stock + ?2 WHERE sku = ?1")
            .bind(sku)
            .bind(qty)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", sku));
        }

        self.require(sku).await
    }

    /// Moves a regular product to the auction table.
    ///
    /// ## What This Does
    /// Inside one transaction:
    /// 1. Reads the regular row (404 if missing)
    /// 2. Inserts an auction listing with the same SKU, name, price and barcode
    /// 3. Deletes the regular row
    ///
    /// Remaining stock is discarded; an auction listing is a single unit.
    pub async fn move_to_auction(&self, sku: &str, reason: &str) -> DbResult<AuctionProduct> {
        let mut tx = begin_write(&self.pool).await?;

        let product = sqlx::query_as::<_, RegularProduct>(&format!(
            "SELECT {REGULAR_COLUMNS} FROM regular_products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", sku))?;

        let listing = AuctionProduct {
            sku: product.sku.clone(),
            name: product.name.clone(),
            price: product.price,
            reason: Some(reason.to_string()),
            barcode_image: product.barcode_image.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO auction_products (sku, name, price, reason, barcode_image, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&listing.sku)
        .bind(&listing.name)
        .bind(listing.price)
        .bind(&listing.reason)
        .bind(&listing.barcode_image)
        .bind(listing.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(sku))?;

        sqlx::query("DELETE FROM regular_products WHERE sku = ?1")
            .bind(sku)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            sku = %sku,
            discarded_stock = product.stock,
            "Product moved to auction"
        );
        Ok(listing)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM regular_products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn require(&self, sku: &str) -> DbResult<RegularProduct> {
        self.get_by_sku(sku)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
