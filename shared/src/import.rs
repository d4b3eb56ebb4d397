//! Bulk item import rows
//!
//! Uploads carry no header row. Columns are positional:
//! `group_id, total_units, name, price[, photo]`.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::validation::{validate_name, validate_price, validate_total_units, MAX_ITEM_NAME_LEN};

/// One item to create from an upload row
#[derive(Debug, Clone, PartialEq)]
pub struct CsvItemRow {
    pub group_id: i64,
    pub total_units: i32,
    pub name: String,
    pub price: Decimal,
    pub photo: Option<String>,
}

/// A row that could not be turned into an item
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct RowError {
    pub field: &'static str,
    pub reason: String,
}

impl RowError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Parse one upload row.
///
/// Returns `Ok(None)` for rows whose first column is empty; those rows are
/// skipped rather than rejected.
pub fn parse_row(columns: &[&str]) -> Result<Option<CsvItemRow>, RowError> {
    let group = column(columns, 0);
    if group.is_empty() {
        return Ok(None);
    }

    let group_id = group
        .parse::<i64>()
        .map_err(|_| RowError::new("group_id", "must be a whole number"))?;

    let total_units = column(columns, 1)
        .parse::<i32>()
        .map_err(|_| RowError::new("total_units", "must be a whole number"))?;
    validate_total_units(total_units).map_err(|e| RowError::new("total_units", e))?;

    let name = column(columns, 2).to_string();
    validate_name(&name, MAX_ITEM_NAME_LEN).map_err(|e| RowError::new("name", e))?;

    let price = Decimal::from_str(column(columns, 3))
        .map_err(|_| RowError::new("price", "must be a decimal number"))?;
    validate_price(price).map_err(|e| RowError::new("price", e))?;

    let photo = Some(column(columns, 4))
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    Ok(Some(CsvItemRow {
        group_id,
        total_units,
        name,
        price,
        photo,
    }))
}

fn column<'a>(columns: &[&'a str], index: usize) -> &'a str {
    columns.get(index).map(|c| c.trim()).unwrap_or("")
}
