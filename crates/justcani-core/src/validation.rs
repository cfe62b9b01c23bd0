//! # Validation Module
//!
//! Input validation utilities for JustCani POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  ├── JSON deserialization (types, required fields)                     │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── CHECK (stock >= 0), CHECK (price >= 0)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use justcani_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("INDOMIE-GRG").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest accepted price, in Rupiah.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// Largest stock level a product may hold.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Years accepted in report dates.
pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 9999;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Product Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use justcani_core::validation::validate_sku;
///
/// assert!(validate_sku("SUSU-UHT-1L").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1..=200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// Empty is allowed and means "list everything".
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates the reason given when moving a product to auction.
pub fn validate_auction_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.chars().count() > 255 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 255,
        });
    }

    Ok(reason.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a checkout or restock quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in Rupiah (0..=MAX_PRICE). Zero is allowed (giveaways).
pub fn validate_price(price: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE).contains(&price) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }

    Ok(())
}

/// Validates an initial stock level (0..=MAX_STOCK).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates a username: 3..=50 characters, letters, digits, underscore.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    let len = username.chars().count();
    if len < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if len > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Deliberately shallow: one `@`, a non-empty local part, and a domain
/// containing a dot.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a password at registration.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates an optional WhatsApp number: digits with an optional leading `+`.
///
/// Blank input is treated as "not given".
pub fn validate_whatsapp(number: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(number) = number.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    let digits = number.strip_prefix('+').unwrap_or(number);
    if digits.len() < 8 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "whatsapp".to_string(),
            reason: "must be 8-15 digits, optionally starting with +".to_string(),
        });
    }

    Ok(Some(number.to_string()))
}

// =============================================================================
// Date Validators
// =============================================================================

/// Checks a report year against `MIN_YEAR..=MAX_YEAR`.
pub fn validate_year(year: i32) -> ValidationResult<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: MIN_YEAR as i64,
            max: MAX_YEAR as i64,
        });
    }

    Ok(())
}

/// Parses a `YYYY-MM-DD` date with a year in `MIN_YEAR..=MAX_YEAR`.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: MIN_YEAR as i64,
            max: MAX_YEAR as i64,
        });
    }

    Ok(date)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("INDOMIE-GRG").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("kopi_sachet").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
        // Code128 set B only covers ASCII
        assert!(validate_sku("KOPI-É").is_err());
        assert!(validate_sku("茶-01").is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Indomie Goreng 85g").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(12_500).is_ok());
        assert!(validate_price(-100).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());

        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(validate_price(MAX_PRICE + 1).is_err());
        assert!(validate_price(i64::MAX).is_err());
        assert!(validate_stock(MAX_STOCK).is_ok());
        assert!(validate_stock(MAX_STOCK + 1).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("kasir_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("sari@toko.co.id").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("user@.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("rahasia").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_whatsapp() {
        assert_eq!(validate_whatsapp(None).unwrap(), None);
        assert_eq!(validate_whatsapp(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_whatsapp(Some("+6281234567890")).unwrap(),
            Some("+6281234567890".to_string())
        );
        assert!(validate_whatsapp(Some("0812-345")).is_err());
    }

    #[test]
    fn test_validate_auction_reason() {
        assert_eq!(
            validate_auction_reason("  kemasan penyok ").unwrap(),
            "kemasan penyok"
        );
        assert!(validate_auction_reason("   ").is_err());
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("date", "2026-01-14").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());
        assert!(parse_date("date", "14/01/2026").is_err());

        assert!(parse_date("date", "-262144-01-01").is_err());
        assert!(parse_date("date", "+262142-12-31").is_err());
        assert!(parse_date("date", "1969-12-31").is_err());
        assert!(parse_date("date", "9999-12-31").is_ok());
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year(2026).is_ok());
        assert!(validate_year(MIN_YEAR - 1).is_err());
        assert!(validate_year(i32::MAX).is_err());
    }
}
