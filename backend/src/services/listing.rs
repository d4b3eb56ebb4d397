//! Helpers for paginated, searchable list queries
//!
//! List endpoints build their `WHERE` clause twice, once for the `COUNT(*)`
//! that drives pagination and once for the page itself, so filters are pushed
//! through these helpers onto a [`QueryBuilder`] that starts with `WHERE TRUE`.

use shared::search::{build_search_predicate, like_pattern, SearchPredicate};
use shared::types::Pagination;
use sqlx::{Postgres, QueryBuilder};

/// Append one `AND (col ILIKE $n OR ...)` group per search term
pub fn push_search(builder: &mut QueryBuilder<'_, Postgres>, predicate: &SearchPredicate<&'static str>) {
    for (term, columns) in predicate.groups() {
        let pattern = like_pattern(term);
        builder.push(" AND (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push(*column)
                .push(" ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\'");
        }
        builder.push(")");
    }
}

/// Apply keyword search when the keyword has at least one term
pub fn push_keyword(
    builder: &mut QueryBuilder<'_, Postgres>,
    keyword: Option<&str>,
    columns: &[&'static str],
) {
    if let Some(predicate) = keyword.and_then(|k| build_search_predicate(k, columns)) {
        push_search(builder, &predicate);
    }
}

/// Exact-match filter, skipped when no value was given
pub fn push_eq(builder: &mut QueryBuilder<'_, Postgres>, column: &'static str, value: Option<i64>) {
    if let Some(value) = value {
        builder.push(" AND ").push(column).push(" = ").push_bind(value);
    }
}

pub fn push_page(builder: &mut QueryBuilder<'_, Postgres>, pagination: &Pagination) {
    builder
        .push(" LIMIT ")
        .push_bind(pagination.limit())
        .push(" OFFSET ")
        .push_bind(pagination.offset());
}

/// `COUNT(*)` result as the unsigned total used in pagination metadata
pub fn total_items(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_filter_is_skipped_without_value() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM shops s WHERE TRUE");
        push_eq(&mut builder, "s.created_by_id", None);
        assert_eq!(builder.sql(), "SELECT id FROM shops s WHERE TRUE");

        push_eq(&mut builder, "s.created_by_id", Some(3));
        assert_eq!(builder.sql(), "SELECT id FROM shops s WHERE TRUE AND s.created_by_id = $1");
    }

    #[test]
    fn test_blank_keyword_adds_nothing() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_keyword(&mut builder, Some("   "), &["s.name"]);
        push_keyword(&mut builder, None, &["s.name"]);
        assert_eq!(builder.sql(), "SELECT 1 WHERE TRUE");
    }
}
