//! Inventory item models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Prefix of every system-generated item code
pub const ITEM_CODE_PREFIX: &str = "SARA";

/// Width the numeric part of an item code is zero-padded to
pub const ITEM_CODE_DIGITS: usize = 6;

/// A stock-keeping unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub price: Decimal,
    /// Units received when the item was created; never changes
    pub total_units: i32,
    /// Units still available for sale, `0..=total_units`
    pub remaining_units: i32,
    pub group_id: Option<i64>,
    pub photo: Option<String>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive the item code from its identity.
///
/// The id is left-padded with zeros to six digits. Ids that already have six or
/// more digits are used as-is, so the code grows instead of being truncated:
/// `7 -> SARA000007`, `123456 -> SARA123456`, `1234567 -> SARA1234567`.
pub fn item_code(id: i64) -> String {
    format!("{}{:0width$}", ITEM_CODE_PREFIX, id, width = ITEM_CODE_DIGITS)
}
