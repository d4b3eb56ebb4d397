//! Validation rules for the SARA inventory platform

use rust_decimal::Decimal;

/// Longest allowed group name
pub const MAX_GROUP_NAME_LEN: usize = 100;
/// Longest allowed shop name
pub const MAX_SHOP_NAME_LEN: usize = 50;
/// Longest allowed item name
pub const MAX_ITEM_NAME_LEN: usize = 255;
/// Largest price a `NUMERIC(12, 2)` column holds
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);
/// Largest amount basis accepted on an invoice line
pub const MAX_AMOUNT_BASIS: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a display name: non-blank and at most `max_len` characters
pub fn validate_name(name: &str, max_len: usize) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name must not be empty");
    }
    if name.chars().count() > max_len {
        return Err("Name is too long");
    }
    Ok(())
}

/// Validate an item price (non-negative, fits the price column)
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    if price > MAX_PRICE {
        return Err("Price is too large");
    }
    Ok(())
}

/// Validate the initial unit count of an item
pub fn validate_total_units(units: i32) -> Result<(), &'static str> {
    if units < 0 {
        return Err("Total units cannot be negative");
    }
    Ok(())
}

/// Validate a sale quantity (strictly positive)
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate the per-line amount basis of an invoice line
pub fn validate_amount_basis(basis: Decimal) -> Result<(), &'static str> {
    if basis < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if basis > MAX_AMOUNT_BASIS {
        return Err("Amount is too large");
    }
    Ok(())
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
