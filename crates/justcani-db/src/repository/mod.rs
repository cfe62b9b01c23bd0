//! # Repository Module
//!
//! One repository per concern, each holding a clone of the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │  state.db.transactions().checkout_regular(&user, &cart, now)    │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                 │
//! │  ├── BEGIN IMMEDIATE                                                   │
//! │  ├── SELECT products ──► CheckoutPlan::build (justcani-core)           │
//! │  ├── UPDATE stock ... WHERE stock >= ?   (per line)                    │
//! │  ├── INSERT transaction_history                                        │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and login lookup
//! - [`ProductRepository`](product::ProductRepository) - Regular products, restock, move to auction
//! - [`AuctionRepository`](auction::AuctionRepository) - Auction listings
//! - [`TransactionRepository`](transaction::TransactionRepository) - Checkouts and history queries
//! - [`BarcodeRepository`](barcode::BarcodeRepository) - Barcode cache across both product tables

pub mod auction;
pub mod barcode;
pub mod product;
pub mod transaction;
pub mod user;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

/// Starts a transaction that holds the write lock from `BEGIN`.
///
/// In WAL mode a deferred transaction that reads first fails its write
/// upgrade with `SQLITE_BUSY`; an immediate one waits on `busy_timeout`.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
