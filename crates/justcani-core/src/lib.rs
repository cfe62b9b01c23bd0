//! # justcani-core: Pure Business Logic for JustCani POS
//!
//! Everything here is deterministic: no database, no network, no clock.
//! The database layer feeds rows in, this crate decides what they mean.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       JustCani POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/server (axum HTTP API)                    │   │
//! │  │   /api/checkout, /api/stats, /api/barcode/{sku}, ...            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ justcani-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  types   │ │  money   │ │ checkout │ │  report  │          │   │
//! │  │   │ Products │ │  Rupiah  │ │ CartPlan │ │ Stats    │          │   │
//! │  │   │ Users    │ │  totals  │ │ lines    │ │ top-5    │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐                                    │   │
//! │  │   │  period  │ │validation│                                    │   │
//! │  │   └──────────┘ └──────────┘                                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 justcani-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (products, users, transactions)
//! - [`money`] - Integer Rupiah amounts
//! - [`checkout`] - Cart validation and line totals
//! - [`report`] - Sales statistics over a set of transactions
//! - [`period`] - Report periods resolved against the store's local day
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use justcani_core::money::Money;
//!
//! let price = Money::from_rupiah(12_500);
//! let line_total = price * 3;
//!
//! assert_eq!(line_total.rupiah(), 37_500);
//! assert_eq!(line_total.to_string(), "Rp37.500");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod period;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{AuctionCheckoutPlan, CheckoutPlan};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use period::{DateRange, ReportPeriod, StoreClock};
pub use report::{DailySummary, MonthlyReport, SalesReport};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single checkout.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Number of products listed in the "top products" table.
pub const TOP_PRODUCTS_LIMIT: usize = 5;

/// Number of rows listed in the "recent transactions" table.
pub const RECENT_TRANSACTIONS_LIMIT: usize = 10;
