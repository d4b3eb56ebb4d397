//! Reporting tests
//!
//! Tests for dashboard reports including:
//! - Date range resolution from query parameters
//! - Purchase totals defaulting to zero
//! - Sales per shop and top sellers ordering

mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use sara_inventory_backend::error::AppError;
use sara_inventory_backend::services::reporting::ReportFilter;
use shared::models::PurchaseSummary;
use shared::types::DateRange;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_no_start_date_means_all_time() {
        let today = date(2024, 5, 10);
        assert_eq!(DateRange::resolve(None, Some(today), false, today), None);
    }

    #[test]
    fn test_end_date_defaults_to_today() {
        let today = date(2024, 5, 10);
        let range = DateRange::resolve(Some(date(2024, 5, 1)), None, false, today).unwrap();
        assert_eq!(range, DateRange::new(date(2024, 5, 1), today));
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let range = DateRange::new(date(2024, 5, 1), date(2024, 5, 31));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 4, 30, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_filter_without_dates_has_no_range() {
        assert!(ReportFilter::default().range().unwrap().is_none());
    }

    #[test]
    fn test_filter_ending_on_last_representable_day_is_rejected() {
        let filter = ReportFilter {
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(NaiveDate::MAX),
            ..Default::default()
        };
        assert!(matches!(
            filter.range(),
            Err(AppError::ValidationFailed { field, .. }) if field == "end_date"
        ));
    }

    #[test]
    fn test_purchase_summary_defaults() {
        assert_eq!(
            PurchaseSummary::from_sums(None, None),
            PurchaseSummary {
                price: Decimal::ZERO,
                count: 0
            }
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| date(2020, 1, 1) + Duration::days(offset))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The total flag always wins over explicit dates
        #[test]
        fn prop_total_ignores_dates(start in date_strategy(), end in date_strategy(), today in date_strategy()) {
            prop_assert_eq!(DateRange::resolve(Some(start), Some(end), true, today), None);
        }

        /// Bounds span whole days: end bound is midnight after the end date
        #[test]
        fn prop_bounds_cover_whole_days(start in date_strategy(), days in 0i64..400) {
            let range = DateRange::new(start, start + Duration::days(days));
            let (from, to) = range.bounds().unwrap();
            prop_assert_eq!(to - from, Duration::days(days + 1));
            prop_assert!(range.contains(from));
            prop_assert!(!range.contains(to));
        }
    }
}

// ============================================================================
// Database Tests
// ============================================================================

#[cfg(test)]
mod database_tests {
    use super::common;
    use super::*;
    use sara_inventory_backend::services::invoice::{CreateInvoiceInput, InvoiceLineInput};
    use sara_inventory_backend::services::{InvoiceService, ReportingService};
    use shared::models::{UserRole, TOP_SELLERS_LIMIT};

    #[tokio::test]
    #[ignore] // Requires database connection
    async fn test_sales_by_shop_sums_quantity_times_amount() {
        let pool = common::test_pool().await;
        let actor = common::create_user(&pool, UserRole::Sale).await;
        let shop = common::create_shop(&pool, &actor).await;
        let item = common::create_item(&pool, &actor, 20, Decimal::new(250, 2)).await;

        InvoiceService::new(pool.clone())
            .record_invoice(
                &actor,
                CreateInvoiceInput {
                    shop_id: shop.id,
                    lines: vec![InvoiceLineInput {
                        item_id: item.id,
                        quantity: 4,
                        amount: Decimal::from(2),
                    }],
                },
            )
            .await
            .unwrap();

        let service = ReportingService::new(pool.clone());

        // 4 units at an amount of 2 x 2.50
        let all_time = service.get_sales_by_shop(None, false).await.unwrap();
        let row = all_time.iter().find(|r| r.shop_id == Some(shop.id)).unwrap();
        assert_eq!(row.amount_total, Decimal::new(2000, 2));

        let long_ago = DateRange::new(date(2000, 1, 1), date(2000, 1, 31));
        let filtered = service.get_sales_by_shop(Some(long_ago), false).await.unwrap();
        let row = filtered.iter().find(|r| r.shop_id == Some(shop.id)).unwrap();
        assert_eq!(row.amount_total, Decimal::ZERO);

        let totals: Vec<Decimal> = all_time.iter().map(|r| r.amount_total).collect();
        assert!(totals.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    #[ignore] // Requires database connection
    async fn test_top_sellers_are_ranked_and_limited() {
        let pool = common::test_pool().await;
        let actor = common::create_user(&pool, UserRole::Sale).await;
        let shop = common::create_shop(&pool, &actor).await;
        let mugs = common::create_item(&pool, &actor, 20, Decimal::ONE).await;
        let lids = common::create_item(&pool, &actor, 20, Decimal::ONE).await;
        let cups = common::create_item(&pool, &actor, 20, Decimal::ONE).await;

        let invoice = InvoiceService::new(pool.clone())
            .record_invoice(
                &actor,
                CreateInvoiceInput {
                    shop_id: shop.id,
                    lines: [(mugs.id, 5), (lids.id, 2), (cups.id, 9)]
                        .into_iter()
                        .map(|(item_id, quantity)| InvoiceLineInput {
                            item_id,
                            quantity,
                            amount: Decimal::ONE,
                        })
                        .collect(),
                },
            )
            .await
            .unwrap();

        // Move the sale to a day no other test writes to
        let day = date(1900, 1, 1) + Duration::days(mugs.id % 20_000);
        let sold_at = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
        sqlx::query("UPDATE invoice_items SET created_at = $1 WHERE invoice_id = $2")
            .bind(sold_at)
            .bind(invoice.invoice.id)
            .execute(&pool)
            .await
            .unwrap();

        let rows = ReportingService::new(pool.clone())
            .get_top_sellers(Some(DateRange::new(day, day)))
            .await
            .unwrap();

        assert!(rows.len() as i64 <= TOP_SELLERS_LIMIT);
        assert!(rows.windows(2).all(|w| w[0].sum_of_items_sold >= w[1].sum_of_items_sold));

        let ranked: Vec<(i64, i64)> = rows.iter().take(3).map(|r| (r.id, r.sum_of_items_sold)).collect();
        assert_eq!(ranked, vec![(cups.id, 9), (mugs.id, 5), (lids.id, 2)]);
        assert!(rows.iter().skip(3).all(|r| r.sum_of_items_sold == 0));
    }

    #[tokio::test]
    #[ignore] // Requires database connection
    async fn test_purchase_summary_is_zero_for_empty_range() {
        let pool = common::test_pool().await;
        let long_ago = DateRange::new(date(2000, 1, 1), date(2000, 1, 2));

        let summary = ReportingService::new(pool.clone())
            .get_purchase_summary(Some(long_ago))
            .await
            .unwrap();

        assert_eq!(summary, PurchaseSummary::from_sums(None, None));
    }
}
