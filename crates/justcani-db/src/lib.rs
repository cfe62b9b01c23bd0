//! # justcani-db: Database Layer for JustCani POS
//!
//! SQLite storage for users, both product tables and the transaction
//! history, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       JustCani POS Data Flow                            │
//! │                                                                         │
//! │  axum handler (POST /api/checkout)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   justcani-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repositories    │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ UserRepository     │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepository  │  │ 001_init   │  │   │
//! │  │   │ WAL, FK on    │    │ AuctionRepository  │  │            │  │   │
//! │  │   │               │    │ TransactionRepo    │  │            │  │   │
//! │  │   │               │    │ BarcodeRepository  │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ./data/justcani.db                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table (plus barcodes across both product tables)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use justcani_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/justcani.db")).await?;
//!
//! let products = db.products().search("indomie", 50).await?;
//! let sale = db.transactions().checkout_regular(&cashier, &cart, Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, TableCounts};

pub use repository::auction::AuctionRepository;
pub use repository::barcode::{BarcodeRecord, BarcodeRepository, BarcodeStatus};
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::user::UserRepository;
