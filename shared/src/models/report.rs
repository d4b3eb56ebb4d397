//! Reporting result models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of rows returned by the top sellers report
pub const TOP_SELLERS_LIMIT: i64 = 10;

/// Headline counts for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventorySummaryCounts {
    /// Items with at least one unit remaining
    pub total_inventory: i64,
    pub total_group: i64,
    pub total_shop: i64,
    /// Users that are not superusers
    pub total_users: i64,
}

/// One row of the top sellers report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopSeller {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub price: Decimal,
    pub remaining_units: i32,
    pub group_id: Option<i64>,
    /// Summed line quantity, zero for items never sold
    pub sum_of_items_sold: i64,
}

/// Sales total of one shop, optionally for one calendar month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShopSales {
    pub shop_id: Option<i64>,
    pub name: Option<String>,
    /// First day of the month when grouped by month
    pub month: Option<NaiveDate>,
    pub amount_total: Decimal,
}

/// Totals over all invoice lines in range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseSummary {
    /// `SUM(quantity * amount)`
    pub price: Decimal,
    /// `SUM(quantity)`
    pub count: i64,
}

impl PurchaseSummary {
    /// Build from the raw aggregates, which are NULL when no line matched
    pub fn from_sums(price: Option<Decimal>, count: Option<i64>) -> Self {
        Self {
            price: price.unwrap_or(Decimal::ZERO),
            count: count.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_summary_keeps_computed_sums() {
        let summary = PurchaseSummary::from_sums(Some(Decimal::new(12050, 2)), Some(7));
        assert_eq!(summary.price, Decimal::new(12050, 2));
        assert_eq!(summary.count, 7);
    }

    #[test]
    fn test_purchase_summary_zero_when_absent() {
        let summary = PurchaseSummary::from_sums(None, None);
        assert_eq!(summary.price, Decimal::ZERO);
        assert_eq!(summary.count, 0);
    }
}
