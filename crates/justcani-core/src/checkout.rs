//! # Checkout Planning
//!
//! Turns a requested cart into priced transaction lines, or rejects it.
//! No stock is touched here; the database layer applies a plan inside a
//! single SQLite transaction.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Regular Checkout                                   │
//! │                                                                         │
//! │  [{A,2},{B,1},{A,1}]                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize_cart()      merge duplicates → [{A,3},{B,1}]                 │
//! │       │                validate sku / qty / size                        │
//! │       ▼                                                                 │
//! │  (db) load products A, B inside the transaction                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutPlan::build() unknown SKU?       → ProductNotFound             │
//! │       │                stock < qty?       → InsufficientStock           │
//! │       ▼                                                                 │
//! │  lines + total = Σ(qty × price)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{AuctionProduct, CartLine, RegularProduct, TransactionLine};
use crate::validation::{validate_quantity, validate_sku};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Cart Normalization
// =============================================================================

/// Validates a requested cart and merges repeated SKUs.
///
/// Lines keep the order in which each SKU first appeared. Quantities are
/// validated per requested line and again after merging.
///
/// ## Example
/// ```rust
/// use justcani_core::checkout::normalize_cart;
/// use justcani_core::CartLine;
///
/// let cart = vec![CartLine::new("A", 2), CartLine::new("B", 1), CartLine::new("A", 1)];
/// let merged = normalize_cart(&cart).unwrap();
/// assert_eq!(merged, vec![CartLine::new("A", 3), CartLine::new("B", 1)]);
/// ```
pub fn normalize_cart(cart: &[CartLine]) -> CoreResult<Vec<CartLine>> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(cart.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(cart.len());

    for line in cart {
        let sku = line.sku.trim();
        validate_sku(sku)?;
        validate_quantity(line.qty)?;

        match index.get(sku).copied() {
            Some(i) => merged[i].qty += line.qty,
            None => {
                index.insert(sku.to_string(), merged.len());
                merged.push(CartLine::new(sku, line.qty));
            }
        }
    }

    if merged.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    for line in &merged {
        validate_quantity(line.qty)?;
    }

    Ok(merged)
}

// =============================================================================
// Regular Checkout Plan
// =============================================================================

/// A validated regular checkout, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    /// One line per distinct SKU, in cart order.
    pub lines: Vec<TransactionLine>,

    /// Σ subtotal.
    pub total: Money,
}

impl CheckoutPlan {
    /// Prices a cart against the current product rows.
    ///
    /// ## Arguments
    /// * `cart` - Requested lines (normalized again here, so raw input is fine)
    /// * `products` - Current rows for the SKUs in the cart; extra rows are ignored
    ///
    /// ## Errors
    /// - `EmptyCart`, `CartTooLarge`, `Validation` from normalization
    /// - `ProductNotFound` for the first SKU without a row
    /// - `InsufficientStock` for the first line whose stock is short
    /// - `AmountOverflow` when a subtotal or the total overflows
    pub fn build(cart: &[CartLine], products: &[RegularProduct]) -> CoreResult<Self> {
        let cart = normalize_cart(cart)?;
        let by_sku: HashMap<&str, &RegularProduct> =
            products.iter().map(|p| (p.sku.as_str(), p)).collect();

        let mut lines = Vec::with_capacity(cart.len());
        let mut total = Money::zero();

        for requested in &cart {
            let product = by_sku
                .get(requested.sku.as_str())
                .ok_or_else(|| CoreError::ProductNotFound(requested.sku.clone()))?;

            if !product.can_sell(requested.qty) {
                return Err(CoreError::InsufficientStock {
                    sku: product.sku.clone(),
                    available: product.stock,
                    requested: requested.qty,
                });
            }

            let price = product.unit_price();
            let subtotal = price
                .checked_multiply(requested.qty)
                .ok_or(CoreError::AmountOverflow)?;
            total = total.checked_add(subtotal).ok_or(CoreError::AmountOverflow)?;

            lines.push(TransactionLine {
                sku: product.sku.clone(),
                name: product.name.clone(),
                qty: requested.qty,
                price,
                subtotal,
            });
        }

        Ok(CheckoutPlan { lines, total })
    }

    /// Total units across all lines.
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| l.qty).sum()
    }
}

// =============================================================================
// Auction Checkout Plan
// =============================================================================

/// Validates the SKUs of an auction checkout.
///
/// Each listing is a single unit, so a SKU may appear at most once.
pub fn normalize_auction_cart(skus: &[String]) -> CoreResult<Vec<String>> {
    if skus.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if skus.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    let mut seen = HashSet::with_capacity(skus.len());
    let mut out = Vec::with_capacity(skus.len());

    for sku in skus {
        let sku = sku.trim();
        validate_sku(sku)?;
        if !seen.insert(sku.to_string()) {
            return Err(CoreError::DuplicateAuctionItem(sku.to_string()));
        }
        out.push(sku.to_string());
    }

    Ok(out)
}

/// A validated auction checkout. Every line has `qty == 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionCheckoutPlan {
    pub lines: Vec<TransactionLine>,
    pub total: Money,
}

impl AuctionCheckoutPlan {
    /// Prices the listings being sold.
    ///
    /// ## Errors
    /// - `EmptyCart`, `CartTooLarge`, `DuplicateAuctionItem`, `Validation`
    /// - `ProductNotFound` when a listing no longer exists (already sold)
    pub fn build(skus: &[String], listings: &[AuctionProduct]) -> CoreResult<Self> {
        let skus = normalize_auction_cart(skus)?;
        let by_sku: HashMap<&str, &AuctionProduct> =
            listings.iter().map(|p| (p.sku.as_str(), p)).collect();

        let mut lines = Vec::with_capacity(skus.len());
        let mut total = Money::zero();

        for sku in &skus {
            let listing = by_sku
                .get(sku.as_str())
                .ok_or_else(|| CoreError::ProductNotFound(sku.clone()))?;

            let price = listing.unit_price();
            total = total.checked_add(price).ok_or(CoreError::AmountOverflow)?;
            lines.push(TransactionLine {
                sku: listing.sku.clone(),
                name: listing.name.clone(),
                qty: 1,
                price,
                subtotal: price,
            });
        }

        Ok(AuctionCheckoutPlan { lines, total })
    }
}

// =============================================================================
// Transaction Codes
// =============================================================================

/// Formats a printable transaction code: `TRX-YYYYMMDDHHMMSS-XXXX`.
///
/// `suffix` supplies the random part; only its first four alphanumeric
/// characters are used, uppercased.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use justcani_core::checkout::transaction_code;
///
/// let at = Utc.with_ymd_and_hms(2026, 1, 14, 9, 30, 12).unwrap();
/// assert_eq!(transaction_code(at, "3f9a71c2"), "TRX-20260114093012-3F9A");
/// ```
pub fn transaction_code(at: DateTime<Utc>, suffix: &str) -> String {
    let tail: String = suffix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_ascii_uppercase();

    format!("TRX-{}-{}", at.format("%Y%m%d%H%M%S"), tail)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn product(sku: &str, price: i64, stock: i64) -> RegularProduct {
        RegularProduct {
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            price,
            stock,
            expiry_date: None,
            barcode_image: None,
            created_at: Utc::now(),
        }
    }

    fn listing(sku: &str, price: i64) -> AuctionProduct {
        AuctionProduct {
            sku: sku.to_string(),
            name: format!("Listing {}", sku),
            price,
            reason: Some("dented".to_string()),
            barcode_image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_totals() {
        let products = vec![product("MIE", 3_500, 10), product("TEH", 4_000, 5)];
        let cart = vec![CartLine::new("MIE", 3), CartLine::new("TEH", 2)];

        let plan = CheckoutPlan::build(&cart, &products).unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].subtotal.rupiah(), 10_500);
        assert_eq!(plan.lines[1].subtotal.rupiah(), 8_000);
        assert_eq!(plan.total.rupiah(), 18_500);
        assert_eq!(plan.units(), 5);
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        // Rows written before price limits existed can still hold huge prices
        let products = vec![product("EMAS", 10_000_000_000_000_000, 999)];
        let cart = vec![CartLine::new("EMAS", 999)];
        assert!(matches!(
            CheckoutPlan::build(&cart, &products),
            Err(CoreError::AmountOverflow)
        ));

        let products = vec![
            product("A", i64::MAX / 2 + 1, 1),
            product("B", i64::MAX / 2 + 1, 1),
        ];
        let cart = vec![CartLine::new("A", 1), CartLine::new("B", 1)];
        assert!(matches!(
            CheckoutPlan::build(&cart, &products),
            Err(CoreError::AmountOverflow)
        ));

        let listings = vec![listing("L1", i64::MAX), listing("L2", 1)];
        let skus = vec!["L1".to_string(), "L2".to_string()];
        assert!(matches!(
            AuctionCheckoutPlan::build(&skus, &listings),
            Err(CoreError::AmountOverflow)
        ));
    }

    #[test]
    fn test_duplicates_are_merged_before_stock_check() {
        let products = vec![product("MIE", 3_500, 4)];
        let cart = vec![CartLine::new("MIE", 3), CartLine::new("MIE", 2)];

        let err = CheckoutPlan::build(&cart, &products).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 4);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_stock_is_allowed() {
        let products = vec![product("MIE", 3_500, 2)];
        let plan = CheckoutPlan::build(&[CartLine::new("MIE", 2)], &products).unwrap();
        assert_eq!(plan.total.rupiah(), 7_000);
    }

    #[test]
    fn test_unknown_sku() {
        let products = vec![product("MIE", 3_500, 10)];
        let err = CheckoutPlan::build(&[CartLine::new("GHOST", 1)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(sku) if sku == "GHOST"));
    }

    #[test]
    fn test_empty_cart_and_bad_quantity() {
        assert!(matches!(
            CheckoutPlan::build(&[], &[]).unwrap_err(),
            CoreError::EmptyCart
        ));

        let err = normalize_cart(&[CartLine::new("MIE", 0)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));

        // Each line is fine but the merged quantity is not
        let err =
            normalize_cart(&[CartLine::new("MIE", 600), CartLine::new("MIE", 600)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_cart_too_large() {
        let cart: Vec<CartLine> = (0..=MAX_CART_ITEMS)
            .map(|i| CartLine::new(format!("SKU{}", i), 1))
            .collect();
        assert!(matches!(
            normalize_cart(&cart).unwrap_err(),
            CoreError::CartTooLarge { .. }
        ));
    }

    #[test]
    fn test_auction_plan() {
        let listings = vec![listing("LLG-1", 15_000), listing("LLG-2", 5_000)];
        let skus = vec!["LLG-2".to_string(), "LLG-1".to_string()];

        let plan = AuctionCheckoutPlan::build(&skus, &listings).unwrap();
        assert_eq!(plan.total.rupiah(), 20_000);
        assert!(plan.lines.iter().all(|l| l.qty == 1));
        assert_eq!(plan.lines[0].sku, "LLG-2");
    }

    #[test]
    fn test_auction_duplicate_and_missing() {
        let listings = vec![listing("LLG-1", 15_000)];

        let dup = vec!["LLG-1".to_string(), "LLG-1".to_string()];
        assert!(matches!(
            AuctionCheckoutPlan::build(&dup, &listings).unwrap_err(),
            CoreError::DuplicateAuctionItem(_)
        ));

        let sold = vec!["LLG-9".to_string()];
        assert!(matches!(
            AuctionCheckoutPlan::build(&sold, &listings).unwrap_err(),
            CoreError::ProductNotFound(_)
        ));
    }

    #[test]
    fn test_transaction_code_short_suffix() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(transaction_code(at, "-a-"), "TRX-20260301000000-A");
    }
}
