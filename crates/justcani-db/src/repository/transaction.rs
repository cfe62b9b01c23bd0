//! # Transaction Repository
//!
//! Checkouts and the transaction history.
//!
//! ## Checkout Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout_regular([{sku: A, qty: 2}, {sku: B, qty: 1}])                 │
//! │                                                                         │
//! │  normalize_cart           merge duplicates, bounds      (no I/O)        │
//! │  BEGIN IMMEDIATE                                                        │
//! │  ├── SELECT A, B          current rows                                  │
//! │  ├── CheckoutPlan::build  not found / insufficient stock → ROLLBACK     │
//! │  ├── UPDATE A SET stock = stock - 2 WHERE stock >= 2                    │
//! │  ├── UPDATE B SET stock = stock - 1 WHERE stock >= 1                    │
//! │  │       0 rows affected (sold concurrently) → ROLLBACK                 │
//! │  ├── INSERT transaction_history (details = JSON lines)                  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Returning early with `?` drops the sqlx transaction, which rolls back.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::auction::AUCTION_COLUMNS;
use super::begin_write;
use super::product::REGULAR_COLUMNS;
use crate::error::{DbError, DbResult};
use justcani_core::checkout::{normalize_auction_cart, normalize_cart, transaction_code};
use justcani_core::{
    AuctionCheckoutPlan, AuctionProduct, CartLine, CheckoutPlan, CoreError, DateRange, Money,
    ProductKind, RegularProduct, Transaction, TransactionLine, User,
};

/// Draws of the random code suffix before giving up.
const CODE_ATTEMPTS: u32 = 5;

const HISTORY_COLUMNS: &str =
    "id, transaction_code, transaction_type, user_id, username, details, total_amount, created_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    transaction_code: String,
    transaction_type: ProductKind,
    user_id: i64,
    username: String,
    details: String,
    total_amount: i64,
    created_at: DateTime<Utc>,
}

impl HistoryRow {
    /// Converts a stored row, tolerating a malformed item list.
    ///
    /// A row whose `details` cannot be parsed keeps its total but reports
    /// no lines, so it contributes zero units to reports.
    fn into_transaction(self) -> Transaction {
        let lines = match serde_json::from_str::<Vec<TransactionLine>>(&self.details) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(
                    transaction_id = self.id,
                    error = %e,
                    "Unreadable transaction details, treating as empty"
                );
                Vec::new()
            }
        };

        Transaction {
            id: self.id,
            transaction_code: self.transaction_code,
            kind: self.transaction_type,
            user_id: self.user_id,
            username: self.username,
            lines,
            total_amount: Money::from_rupiah(self.total_amount),
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Sells regular products: decrements stock and records the sale.
    ///
    /// ## Arguments
    /// * `cashier` - Acting user, recorded on the history row
    /// * `cart` - Requested lines; duplicates are merged
    /// * `now` - Timestamp for the row and the transaction code
    ///
    /// ## Errors
    /// - `Rejected(EmptyCart | CartTooLarge | Validation)` before touching the database
    /// - `Rejected(ProductNotFound | InsufficientStock)` with nothing written
    pub async fn checkout_regular(
        &self,
        cashier: &User,
        cart: &[CartLine],
        now: DateTime<Utc>,
    ) -> DbResult<Transaction> {
        let cart = normalize_cart(cart)?;
        debug!(lines = cart.len(), user_id = cashier.id, "Starting regular checkout");

        let mut tx = begin_write(&self.pool).await?;

        let mut products: Vec<RegularProduct> = Vec::with_capacity(cart.len());
        for line in &cart {
            let product = sqlx::query_as::<_, RegularProduct>(&format!(
                "SELECT {REGULAR_COLUMNS} FROM regular_products WHERE sku = ?1"
            ))
            .bind(&line.sku)
            .fetch_optional(&mut *tx)
            .await?;
            products.extend(product);
        }

        let plan = CheckoutPlan::build(&cart, &products)?;

        for line in &plan.lines {
            let updated = sqlx::query(
                "UPDATE regular_products SET stock = stock - ?2 WHERE sku = ?1 AND stock >= ?2",
            )
            .bind(&line.sku)
            .bind(line.qty)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                let available = products
                    .iter()
                    .find(|p| p.sku == line.sku)
                    .map_or(0, |p| p.stock);
                return Err(CoreError::InsufficientStock {
                    sku: line.sku.clone(),
                    available,
                    requested: line.qty,
                }
                .into());
            }
        }

        let recorded = record(
            &mut tx,
            ProductKind::Regular,
            cashier,
            plan.lines,
            plan.total,
            now,
        )
        .await?;

        tx.commit().await?;

        info!(
            transaction_id = recorded.id,
            code = %recorded.transaction_code,
            total = recorded.total_amount.rupiah(),
            units = recorded.units_sold(),
            "Regular checkout completed"
        );
        Ok(recorded)
    }

    /// Sells auction listings: each one is deleted and the sale recorded.
    ///
    /// ## Errors
    /// - `Rejected(DuplicateAuctionItem)` when a SKU repeats
    /// - `Rejected(ProductNotFound)` when a listing is gone (already sold)
    pub async fn checkout_auction(
        &self,
        cashier: &User,
        skus: &[String],
        now: DateTime<Utc>,
    ) -> DbResult<Transaction> {
        let skus = normalize_auction_cart(skus)?;
        debug!(lines = skus.len(), user_id = cashier.id, "Starting auction checkout");

        let mut tx = begin_write(&self.pool).await?;

        let mut listings: Vec<AuctionProduct> = Vec::with_capacity(skus.len());
        for sku in &skus {
            let listing = sqlx::query_as::<_, AuctionProduct>(&format!(
                "SELECT {AUCTION_COLUMNS} FROM auction_products WHERE sku = ?1"
            ))
            .bind(sku)
            .fetch_optional(&mut *tx)
            .await?;
            listings.extend(listing);
        }

        let plan = AuctionCheckoutPlan::build(&skus, &listings)?;

        for line in &plan.lines {
            let deleted = sqlx::query("DELETE FROM auction_products WHERE sku = ?1")
                .bind(&line.sku)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if deleted == 0 {
                return Err(CoreError::ProductNotFound(line.sku.clone()).into());
            }
        }

        let recorded = record(
            &mut tx,
            ProductKind::Auction,
            cashier,
            plan.lines,
            plan.total,
            now,
        )
        .await?;

        tx.commit().await?;

        info!(
            transaction_id = recorded.id,
            code = %recorded.transaction_code,
            total = recorded.total_amount.rupiah(),
            "Auction checkout completed"
        );
        Ok(recorded)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM transaction_history WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(HistoryRow::into_transaction))
    }

    /// Transactions with `range.start <= created_at < range.end`, oldest first.
    pub async fn list_between(&self, range: &DateRange) -> DbResult<Vec<Transaction>> {
        debug!(start = %range.start, end = %range.end, "Loading transactions");

        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM transaction_history
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at, id
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HistoryRow::into_transaction).collect())
    }

    /// The latest `limit` transactions, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM transaction_history
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HistoryRow::into_transaction).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transaction_history")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts the history row inside an open transaction.
async fn record(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    kind: ProductKind,
    cashier: &User,
    lines: Vec<TransactionLine>,
    total: Money,
    now: DateTime<Utc>,
) -> DbResult<Transaction> {
    let details = serde_json::to_string(&lines).map_err(|e| DbError::CorruptData {
        table: "transaction_history".to_string(),
        message: e.to_string(),
    })?;
    // Four random characters can repeat within one second; draw again
    let mut attempt = 0;
    let (code, result) = loop {
        attempt += 1;
        let code = transaction_code(now, &Uuid::new_v4().simple().to_string());

        let inserted = sqlx::query(
            r#"
            INSERT INTO transaction_history
                (transaction_code, transaction_type, user_id, username, details, total_amount, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&code)
        .bind(kind)
        .bind(cashier.id)
        .bind(&cashier.username)
        .bind(&details)
        .bind(total.rupiah())
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from);

        match inserted {
            Ok(result) => break (code, result),
            Err(DbError::UniqueViolation { field, .. })
                if field.ends_with("transaction_code") && attempt < CODE_ATTEMPTS =>
            {
                debug!(code = %code, attempt, "Transaction code taken, retrying");
            }
            Err(e) => return Err(e),
        }
    };

    Ok(Transaction {
        id: result.last_insert_rowid(),
        transaction_code: code,
        kind,
        user_id: cashier.id,
        username: cashier.username.clone(),
        lines,
        total_amount: total,
        created_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use justcani_core::{NewAuctionProduct, NewRegularProduct, NewUser, Role};

    async fn setup() -> (Database, User) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cashier = db
            .users()
            .insert(&NewUser {
                username: "kasir".to_string(),
                email: "kasir@toko.id".to_string(),
                whatsapp: None,
                password_hash: "hash".to_string(),
                role: Role::Cashier,
            })
            .await
            .unwrap();

        for (sku, name, price, stock) in [
            ("MIE", "Indomie Goreng", 3_500, 10),
            ("TEH", "Teh Botol", 4_000, 2),
        ] {
            db.products()
                .insert(&NewRegularProduct {
                    sku: sku.to_string(),
                    name: name.to_string(),
                    price,
                    stock,
                    expiry_date: None,
                })
                .await
                .unwrap();
        }

        for (sku, price) in [("LLG-1", 50_000), ("LLG-2", 25_000)] {
            db.auctions()
                .insert(&NewAuctionProduct {
                    sku: sku.to_string(),
                    name: format!("Lelang {sku}"),
                    price,
                    reason: Some("display".to_string()),
                })
                .await
                .unwrap();
        }

        (db, cashier)
    }

    async fn stock(db: &Database, sku: &str) -> i64 {
        db.products().get_by_sku(sku).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_checkout_decrements_and_records() {
        let (db, cashier) = setup().await;
        let cart = vec![CartLine::new("MIE", 3), CartLine::new("TEH", 2)];

        let sale = db
            .transactions()
            .checkout_regular(&cashier, &cart, Utc::now())
            .await
            .unwrap();

        assert_eq!(stock(&db, "MIE").await, 7);
        assert_eq!(stock(&db, "TEH").await, 0);
        assert_eq!(sale.total_amount.rupiah(), 3 * 3_500 + 2 * 4_000);
        assert_eq!(sale.kind, ProductKind::Regular);
        assert!(sale.transaction_code.starts_with("TRX-"));
        assert_eq!(db.transactions().count().await.unwrap(), 1);

        let stored = db.transactions().get_by_id(sale.id).await.unwrap().unwrap();
        assert_eq!(stored.lines, sale.lines);
        assert_eq!(stored.total_amount, sale.total_amount);
        assert_eq!(stored.username, "kasir");
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let (db, cashier) = setup().await;
        let cart = vec![CartLine::new("MIE", 1), CartLine::new("TEH", 3)];

        let err = db
            .transactions()
            .checkout_regular(&cashier, &cart, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientStock { ref sku, available: 2, requested: 3 })
                if sku == "TEH"
        ));
        assert_eq!(stock(&db, "MIE").await, 10);
        assert_eq!(stock(&db, "TEH").await, 2);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_merged_before_stock_check() {
        let (db, cashier) = setup().await;

        let sale = db
            .transactions()
            .checkout_regular(
                &cashier,
                &[CartLine::new("MIE", 4), CartLine::new("MIE", 5)],
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(sale.lines.len(), 1);
        assert_eq!(sale.lines[0].qty, 9);
        assert_eq!(stock(&db, "MIE").await, 1);

        let err = db
            .transactions()
            .checkout_regular(
                &cashier,
                &[CartLine::new("MIE", 1), CartLine::new("MIE", 1)],
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::InsufficientStock { .. })));
        assert_eq!(stock(&db, "MIE").await, 1);
    }

    #[tokio::test]
    async fn test_unknown_sku_and_empty_cart() {
        let (db, cashier) = setup().await;

        let err = db
            .transactions()
            .checkout_regular(&cashier, &[CartLine::new("GHOST", 1)], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::ProductNotFound(_))));

        let err = db
            .transactions()
            .checkout_regular(&cashier, &[], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_auction_checkout_deletes_listings() {
        let (db, cashier) = setup().await;
        let skus = vec!["LLG-1".to_string(), "LLG-2".to_string()];

        let sale = db
            .transactions()
            .checkout_auction(&cashier, &skus, Utc::now())
            .await
            .unwrap();

        assert_eq!(sale.kind, ProductKind::Auction);
        assert_eq!(sale.total_amount.rupiah(), 75_000);
        assert!(sale.lines.iter().all(|l| l.qty == 1));
        assert_eq!(db.auctions().count().await.unwrap(), 0);

        // Sold listings cannot be sold twice
        let err = db
            .transactions()
            .checkout_auction(&cashier, &skus[..1], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_auction_checkout_is_all_or_nothing() {
        let (db, cashier) = setup().await;

        let err = db
            .transactions()
            .checkout_auction(
                &cashier,
                &["LLG-1".to_string(), "GONE".to_string()],
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::ProductNotFound(ref s)) if s == "GONE"));
        assert_eq!(db.auctions().count().await.unwrap(), 2);

        let err = db
            .transactions()
            .checkout_auction(
                &cashier,
                &["LLG-1".to_string(), "LLG-1".to_string()],
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::DuplicateAuctionItem(_))));
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    async fn file_backed(dir: &tempfile::TempDir) -> (Database, User) {
        let db = Database::new(DbConfig::new(dir.path().join("pos.db")).max_connections(8))
            .await
            .unwrap();
        let cashier = db
            .users()
            .insert(&NewUser {
                username: "kasir".to_string(),
                email: "kasir@toko.id".to_string(),
                whatsapp: None,
                password_hash: "hash".to_string(),
                role: Role::Cashier,
            })
            .await
            .unwrap();
        (db, cashier)
    }

    async fn add(db: &Database, sku: &str, stock: i64) {
        db.products()
            .insert(&NewRegularProduct {
                sku: sku.to_string(),
                name: format!("Produk {sku}"),
                price: 1_000,
                stock,
                expiry_date: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_on_separate_skus_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let (db, cashier) = file_backed(&dir).await;
        for i in 0..20 {
            add(&db, &format!("SKU-{i}"), 1_000).await;
        }

        let mut tasks = Vec::new();
        for i in 0..20 {
            let db = db.clone();
            let cashier = cashier.clone();
            tasks.push(tokio::spawn(async move {
                let cart = vec![CartLine::new(format!("SKU-{i}"), 1)];
                for _ in 0..10 {
                    db.transactions()
                        .checkout_regular(&cashier, &cart, Utc::now())
                        .await?;
                }
                Ok::<_, DbError>(())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(db.transactions().count().await.unwrap(), 200);
        for i in 0..20 {
            assert_eq!(stock(&db, &format!("SKU-{i}")).await, 990);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let (db, cashier) = file_backed(&dir).await;
        add(&db, "PROMO", 50).await;

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            let cashier = cashier.clone();
            tasks.push(tokio::spawn(async move {
                let cart = vec![CartLine::new("PROMO", 1)];
                let mut sold = 0;
                for _ in 0..5 {
                    match db
                        .transactions()
                        .checkout_regular(&cashier, &cart, Utc::now())
                        .await
                    {
                        Ok(_) => sold += 1,
                        Err(DbError::Rejected(CoreError::InsufficientStock { .. })) => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(sold)
            }));
        }

        let mut sold = 0;
        for task in tasks {
            sold += task.await.unwrap().unwrap();
        }

        assert_eq!(sold, 50);
        assert_eq!(stock(&db, "PROMO").await, 0);
        assert_eq!(db.transactions().count().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_list_between_is_half_open() {
        let (db, cashier) = setup().await;
        let base = Utc.with_ymd_and_hms(2026, 1, 14, 3, 0, 0).unwrap();

        for hours in [0, 1, 2] {
            db.transactions()
                .checkout_regular(
                    &cashier,
                    &[CartLine::new("MIE", 1)],
                    base + Duration::hours(hours),
                )
                .await
                .unwrap();
        }

        let range = DateRange {
            start: base,
            end: base + Duration::hours(2),
        };
        let found = db.transactions().list_between(&range).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].created_at < found[1].created_at);

        let recent = db.transactions().recent(10).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].created_at, base + Duration::hours(2));
    }

    #[tokio::test]
    async fn test_unreadable_details_yield_no_lines() {
        let (db, cashier) = setup().await;

        sqlx::query(
            r#"
            INSERT INTO transaction_history
                (transaction_code, transaction_type, user_id, username, details, total_amount, created_at)
            VALUES ('TRX-LEGACY-0001', 'regular', ?1, 'kasir', 'not json', 12000, ?2)
            "#,
        )
        .bind(cashier.id)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let recent = db.transactions().recent(1).await.unwrap();
        assert_eq!(recent[0].total_amount.rupiah(), 12_000);
        assert!(recent[0].lines.is_empty());
        assert_eq!(recent[0].units_sold(), 0);
    }
}
