//! Reporting service for sales analytics and data export
//! Provides summary counts, top sellers, sales by shop and purchase totals

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use shared::models::{InventorySummaryCounts, PurchaseSummary, ShopSales, TopSeller, TOP_SELLERS_LIMIT};
use shared::types::DateRange;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Report over all time, ignoring the dates
    #[serde(default, deserialize_with = "flag")]
    pub total: bool,
    /// Group sales by calendar month
    #[serde(default, deserialize_with = "flag")]
    pub monthly: bool,
}

impl ReportFilter {
    /// Date range to filter on; the end date defaults to today
    pub fn range(&self) -> AppResult<Option<DateRange>> {
        let range = DateRange::resolve(self.start_date, self.end_date, self.total, Utc::now().date_naive());
        if let Some(range) = range {
            range_bounds(range)?;
        }
        Ok(range)
    }
}

/// Query flag: any non-empty value except `false` or `0` switches it on
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.is_some_and(|v| {
        let v = v.trim();
        !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
    }))
}

fn range_bounds(range: DateRange) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    range
        .bounds()
        .ok_or_else(|| AppError::validation("end_date", "End date is out of range"))
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Headline counts for the dashboard
    pub async fn get_summary(&self) -> AppResult<InventorySummaryCounts> {
        let summary = sqlx::query_as::<_, InventorySummaryCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM inventory_items WHERE remaining_units > 0) AS total_inventory,
                (SELECT COUNT(*) FROM inventory_groups) AS total_group,
                (SELECT COUNT(*) FROM shops) AS total_shop,
                (SELECT COUNT(*) FROM users WHERE is_superuser = FALSE) AS total_users
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }

    /// Items ranked by units sold, best first
    pub async fn get_top_sellers(&self, range: Option<DateRange>) -> AppResult<Vec<TopSeller>> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT i.id, i.code, i.name, i.price, i.remaining_units, i.group_id, \
             COALESCE(SUM(li.quantity), 0)::BIGINT AS sum_of_items_sold \
             FROM inventory_items i \
             LEFT JOIN invoice_items li ON li.item_id = i.id",
        );
        if let Some(range) = range {
            let (start, end) = range_bounds(range)?;
            query
                .push(" AND li.created_at >= ")
                .push_bind(start)
                .push(" AND li.created_at < ")
                .push_bind(end);
        }
        query
            .push(" GROUP BY i.id ORDER BY sum_of_items_sold DESC, i.id LIMIT ")
            .push_bind(TOP_SELLERS_LIMIT);

        let rows = query.build_query_as::<TopSeller>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    /// Sales total per shop, optionally per calendar month, largest first
    pub async fn get_sales_by_shop(&self, range: Option<DateRange>, monthly: bool) -> AppResult<Vec<ShopSales>> {
        let month = if monthly {
            "(DATE_TRUNC('month', v.created_at AT TIME ZONE 'UTC'))::DATE"
        } else {
            "NULL::DATE"
        };

        let mut query = QueryBuilder::<Postgres>::new("SELECT s.id AS shop_id, s.name, ");
        query
            .push(month)
            .push(
                " AS month, COALESCE(SUM(li.quantity * li.amount), 0) AS amount_total \
                 FROM shops s \
                 LEFT JOIN invoices v ON v.shop_id = s.id",
            );
        if let Some(range) = range {
            let (start, end) = range_bounds(range)?;
            query
                .push(" AND v.created_at >= ")
                .push_bind(start)
                .push(" AND v.created_at < ")
                .push_bind(end);
        }
        query.push(" LEFT JOIN invoice_items li ON li.invoice_id = v.id GROUP BY s.id, s.name");
        if monthly {
            query.push(", month");
        }
        query.push(" ORDER BY amount_total DESC, s.name");

        let rows = query.build_query_as::<ShopSales>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    /// Value and unit totals across invoice lines
    pub async fn get_purchase_summary(&self, range: Option<DateRange>) -> AppResult<PurchaseSummary> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT SUM(li.quantity * li.amount) AS price, SUM(li.quantity)::BIGINT AS count \
             FROM invoice_items li",
        );
        if let Some(range) = range {
            let (start, end) = range_bounds(range)?;
            query
                .push(" WHERE li.created_at >= ")
                .push_bind(start)
                .push(" AND li.created_at < ")
                .push_bind(end);
        }

        let (price, count) = query
            .build_query_as::<(Option<Decimal>, Option<i64>)>()
            .fetch_one(&self.db)
            .await?;

        Ok(PurchaseSummary::from_sums(price, count))
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
