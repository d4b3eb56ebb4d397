//! Inventory group models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of inventory items, optionally nested under a parent group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryGroup {
    pub id: i64,
    pub name: String,
    /// Parent group; cleared when the parent is deleted
    pub belongs_to_id: Option<i64>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns true when making `new_parent` the parent of `group_id` would close a
/// loop. `ancestors_of_new_parent` lists the new parent's ancestor chain,
/// nearest first.
pub fn creates_cycle(group_id: i64, new_parent: i64, ancestors_of_new_parent: &[i64]) -> bool {
    new_parent == group_id || ancestors_of_new_parent.contains(&group_id)
}
