//! Invoice (sale receipt) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Timestamp layout used in receipt audit entries, e.g. `05/03/2024 1407`
pub const RECEIPT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H%M";

/// Largest line amount a `NUMERIC(14, 2)` column holds
pub const MAX_LINE_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// One sale transaction at a shop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: i64,
    pub shop_id: Option<i64>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// One line of an invoice.
///
/// `item_name` and `item_code` are copied from the item when the line is
/// written so the receipt still reads correctly after the item is renamed or
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub item_id: Option<i64>,
    pub item_name: String,
    pub item_code: String,
    pub quantity: i32,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Value of the line as aggregated by the sales reports
    pub fn total(&self) -> Decimal {
        self.amount * Decimal::from(self.quantity)
    }
}

/// Stored amount of a line: the submitted amount basis times the item's price
/// at the moment of sale.
///
/// `None` when the product overflows or does not fit the line amount column.
pub fn line_amount(amount_basis: Decimal, unit_price: Decimal) -> Option<Decimal> {
    amount_basis
        .checked_mul(unit_price)
        .filter(|amount| amount.abs() <= MAX_LINE_AMOUNT)
}

/// Render an invoice timestamp the way receipt audit entries show it
pub fn format_receipt_timestamp(at: DateTime<Utc>) -> String {
    at.format(RECEIPT_TIMESTAMP_FORMAT).to_string()
}
