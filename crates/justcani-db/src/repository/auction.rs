//! # Auction Repository
//!
//! Single-unit lelang listings. There is no stock column: a listing is
//! deleted when it sells (see `TransactionRepository::checkout_auction`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::like_pattern;
use crate::error::{DbError, DbResult};
use justcani_core::{AuctionProduct, NewAuctionProduct};

pub(crate) const AUCTION_COLUMNS: &str = "sku, name, price, reason, barcode_image, created_at";

#[derive(Debug, Clone)]
pub struct AuctionRepository {
    pool: SqlitePool,
}

impl AuctionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuctionRepository { pool }
    }

    /// Same matching rules as `ProductRepository::search`.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<AuctionProduct>> {
        let query = query.trim();
        debug!(query = %query, limit, "Searching auction listings");

        let listings = sqlx::query_as::<_, AuctionProduct>(&format!(
            r#"
            SELECT {AUCTION_COLUMNS}
            FROM auction_products
            WHERE name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\'
            ORDER BY name, sku
            LIMIT ?2
            "#
        ))
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<AuctionProduct>> {
        let listing = sqlx::query_as::<_, AuctionProduct>(&format!(
            "SELECT {AUCTION_COLUMNS} FROM auction_products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    /// Lists an item directly, without passing through the regular table.
    pub async fn insert(&self, listing: &NewAuctionProduct) -> DbResult<AuctionProduct> {
        sqlx::query(
            r#"
            INSERT INTO auction_products (sku, name, price, reason, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&listing.sku)
        .bind(&listing.name)
        .bind(listing.price)
        .bind(&listing.reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&listing.sku))?;

        self.get_by_sku(&listing.sku)
            .await?
            .ok_or_else(|| DbError::not_found("Auction listing", listing.sku.as_str()))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auction_products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_search() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.auctions();

        for (sku, name) in [("LLG-001", "Rice Cooker Mini"), ("LLG-002", "Kipas Angin")] {
            repo.insert(&NewAuctionProduct {
                sku: sku.to_string(),
                name: name.to_string(),
                price: 75_000,
                reason: Some("display unit".to_string()),
            })
            .await
            .unwrap();
        }

        let found = repo.search("kipas", 50).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku, "LLG-002");
        assert_eq!(found[0].reason.as_deref(), Some("display unit"));

        assert_eq!(repo.search("llg", 50).await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
