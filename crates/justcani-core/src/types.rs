//! # Domain Types
//!
//! Core domain types used throughout JustCani POS.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │ RegularProduct   │  │ AuctionProduct   │  │ Transaction          │  │
//! │  │ ──────────────── │  │ ──────────────── │  │ ──────────────────── │  │
//! │  │ sku (unique)     │  │ sku (unique)     │  │ id / transaction_code│  │
//! │  │ name, price      │  │ name, price      │  │ kind                 │  │
//! │  │ stock            │  │ reason           │  │ username             │  │
//! │  │ expiry_date      │  │ (single unit)    │  │ lines (JSON)         │  │
//! │  │ barcode_image    │  │ barcode_image    │  │ total_amount         │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐                            │
//! │  │ User             │  │ ProductKind      │                            │
//! │  │ role: Role       │  │ Regular│Auction  │                            │
//! │  └──────────────────┘  └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Products are keyed by SKU. Users and transactions use integer ids
//! assigned by SQLite; transactions also carry a printable
//! `transaction_code` for receipts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// What a logged-in user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages inventory, barcodes and reports.
    Admin,
    /// Runs checkouts.
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }
}

// =============================================================================
// Product Kind
// =============================================================================

/// Which product table a SKU lives in, and which kind of sale a
/// transaction recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Stocked item, sold by quantity.
    Regular,
    /// Single-unit listing (lelang), removed once sold.
    Auction,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Regular => "regular",
            ProductKind::Auction => "auction",
        }
    }

    /// Chart label.
    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Regular => "Regular",
            ProductKind::Auction => "Auction",
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A cashier or admin account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,

    pub username: String,

    pub email: String,

    /// WhatsApp number given at registration.
    pub whatsapp: Option<String>,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    pub role: Role,

    /// Public URL of the processed profile picture.
    pub profile_pic: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Fields needed to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub whatsapp: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

// =============================================================================
// Products
// =============================================================================

/// A stocked product sold by quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RegularProduct {
    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub name: String,

    /// Unit price in Rupiah.
    pub price: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    /// Cached Code128 PNG as a `data:image/png;base64,...` URI.
    ///
    /// Omitted from JSON listings; the barcode endpoints expose it.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub barcode_image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl RegularProduct {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_rupiah(self.price)
    }

    /// Checks if `quantity` units can be sold right now.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    #[inline]
    pub fn has_barcode(&self) -> bool {
        self.barcode_image.as_deref().is_some_and(|b| !b.is_empty())
    }
}

/// Fields for adding a regular product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewRegularProduct {
    pub sku: String,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

/// A single-unit auction (lelang) listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuctionProduct {
    pub sku: String,

    pub name: String,

    /// Listing price in Rupiah.
    pub price: i64,

    /// Why the item was moved to auction (damaged packaging, near expiry, ...).
    pub reason: Option<String>,

    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub barcode_image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Fields for listing an auction item directly (seeding, imports).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewAuctionProduct {
    pub sku: String,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AuctionProduct {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_rupiah(self.price)
    }

    #[inline]
    pub fn has_barcode(&self) -> bool {
        self.barcode_image.as_deref().is_some_and(|b| !b.is_empty())
    }
}

/// Either kind of product, reduced to what the barcode screens need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSummary {
    pub sku: String,
    pub name: String,
    pub price: i64,
    pub kind: ProductKind,
    pub has_barcode: bool,
}

// =============================================================================
// Transactions
// =============================================================================

/// One sold line, as stored in the transaction's item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionLine {
    pub sku: String,

    /// Product name at the time of sale.
    #[serde(default)]
    pub name: String,

    pub qty: i64,

    /// Unit price at the time of sale.
    #[serde(default)]
    pub price: Money,

    /// `price × qty`.
    #[serde(default)]
    pub subtotal: Money,
}

/// A recorded checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: i64,

    /// Printable code, e.g. `TRX-20260114093012-3F9A`.
    pub transaction_code: String,

    pub kind: ProductKind,

    pub user_id: i64,

    /// Cashier username at the time of sale.
    pub username: String,

    pub lines: Vec<TransactionLine>,

    pub total_amount: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Total units across all lines.
    pub fn units_sold(&self) -> i64 {
        self.lines.iter().fold(0i64, |acc, l| acc.saturating_add(l.qty))
    }
}

/// One requested checkout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub sku: String,
    pub qty: i64,
}

impl CartLine {
    pub fn new(sku: impl Into<String>, qty: i64) -> Self {
        CartLine {
            sku: sku.into(),
            qty,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> RegularProduct {
        RegularProduct {
            sku: "TEH-BOTOL".to_string(),
            name: "Teh Botol 350ml".to_string(),
            price: 4_000,
            stock,
            expiry_date: None,
            barcode_image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell() {
        let p = product(3);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));
        assert_eq!(p.unit_price().rupiah(), 4_000);
    }

    #[test]
    fn test_has_barcode_ignores_empty_string() {
        let mut p = product(1);
        assert!(!p.has_barcode());
        p.barcode_image = Some(String::new());
        assert!(!p.has_barcode());
        p.barcode_image = Some("data:image/png;base64,AAAA".to_string());
        assert!(p.has_barcode());
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ProductKind::Auction).unwrap(),
            "\"auction\""
        );
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_barcode_and_password_not_serialized() {
        let mut p = product(1);
        p.barcode_image = Some("data:image/png;base64,AAAA".to_string());
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("barcode_image").is_none());

        let user = User {
            id: 1,
            username: "sari".to_string(),
            email: "sari@example.com".to_string(),
            whatsapp: None,
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Cashier,
            profile_pic: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "cashier");
    }

    #[test]
    fn test_line_tolerates_missing_fields() {
        let line: TransactionLine = serde_json::from_str(r#"{"sku":"A1","qty":2}"#).unwrap();
        assert_eq!(line.qty, 2);
        assert!(line.name.is_empty());
        assert!(line.subtotal.is_zero());
    }
}
