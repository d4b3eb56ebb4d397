//! Sales ledger tests
//!
//! Tests for recording invoices including:
//! - Line amounts priced at the moment of sale
//! - All-or-nothing stock decrements
//! - Concurrent sales never overselling an item

mod common;

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{line_amount, InvoiceItem, MAX_LINE_AMOUNT};
use shared::validation::{validate_amount_basis, validate_quantity, MAX_AMOUNT_BASIS, MAX_PRICE};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn line(quantity: i32, amount: Decimal) -> InvoiceItem {
    InvoiceItem {
        id: 1,
        invoice_id: 1,
        item_id: Some(1),
        item_name: "Latte cups".to_string(),
        item_code: "SARA000001".to_string(),
        quantity,
        amount,
        created_at: chrono::Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_line_amount_is_basis_times_price() {
        assert_eq!(line_amount(dec("2"), dec("12.50")), Some(dec("25.00")));
        assert_eq!(line_amount(dec("1"), dec("3.75")), Some(dec("3.75")));
    }

    #[test]
    fn test_line_amount_too_large_for_column_is_rejected() {
        assert_eq!(line_amount(MAX_AMOUNT_BASIS, MAX_PRICE), None);
        assert_eq!(line_amount(Decimal::MAX, Decimal::MAX), None);
        assert_eq!(line_amount(dec("100"), MAX_PRICE), Some(dec("999999999999.00")));
    }

    #[test]
    fn test_line_total_multiplies_quantity() {
        assert_eq!(line(3, dec("25.00")).total(), dec("75.00"));
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
    }

    #[test]
    fn test_amount_basis_must_not_be_negative() {
        assert!(validate_amount_basis(dec("0")).is_ok());
        assert!(validate_amount_basis(dec("-0.01")).is_err());
        assert!(validate_amount_basis(MAX_AMOUNT_BASIS + Decimal::ONE).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 2)) // 0.00 to 1000.00
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A basis of one stores the unit price unchanged
        #[test]
        fn prop_unit_basis_stores_price(price in price_strategy()) {
            prop_assert_eq!(line_amount(Decimal::ONE, price), Some(price));
        }

        /// Any valid basis and price yields either a storable amount or `None`
        #[test]
        fn prop_line_amount_never_exceeds_column(
            basis in (0i64..=1_000_000i64).prop_map(Decimal::from),
            cents in 0i64..=999_999_999_999i64,
        ) {
            let price = Decimal::new(cents, 2);
            match line_amount(basis, price) {
                Some(amount) => {
                    prop_assert!(amount <= MAX_LINE_AMOUNT);
                    prop_assert_eq!(amount, basis * price);
                }
                None => prop_assert!(basis * price > MAX_LINE_AMOUNT),
            }
        }

        /// Line totals are never negative for valid input
        #[test]
        fn prop_line_total_non_negative(
            quantity in 1i32..1000,
            basis in (0i64..1000i64).prop_map(Decimal::from),
            price in price_strategy(),
        ) {
            let amount = line_amount(basis, price).unwrap();
            let total = line(quantity, amount).total();
            prop_assert!(total >= Decimal::ZERO);
            prop_assert_eq!(total, basis * price * Decimal::from(quantity));
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
    use sara_inventory_backend::error::AppError;
    use sara_inventory_backend::services::invoice::{CreateInvoiceInput, InvoiceLineInput};
    use sara_inventory_backend::services::InvoiceService;
    use shared::models::UserRole;

    fn sale(shop_id: i64, lines: &[(i64, i32)]) -> CreateInvoiceInput {
        CreateInvoiceInput {
            shop_id,
            lines: lines
                .iter()
                .map(|&(item_id, quantity)| InvoiceLineInput {
                    item_id,
                    quantity,
                    amount: Decimal::ONE,
                })
                .collect(),
        }
    }

    #[tokio::test]
    #[ignore] // Requires database connection
    async fn test_invoice_decrements_stock_and_snapshots_item() {
        let pool = common::test_pool().await;
        let actor = common::create_user(&pool, UserRole::Sale).await;
        let shop = common::create_shop(&pool, &actor).await;
        let item = common::create_item(&pool, &actor, 10, dec("4.50")).await;

        let invoice = InvoiceService::new(pool.clone())
            .record_invoice(&actor, sale(shop.id, &[(item.id, 3)]))
            .await
            .unwrap();

        assert_eq!(invoice.invoice.shop_id, Some(shop.id));
        assert_eq!(invoice.invoice_items.len(), 1);
        let recorded = &invoice.invoice_items[0];
        assert_eq!(recorded.item_code, item.code);
        assert_eq!(recorded.item_name, item.name);
        assert_eq!(recorded.amount, dec("4.50"));
        assert_eq!(common::remaining_units(&pool, item.id).await, 7);
    }

    #[tokio::test]
    #[ignore] // Requires database connection
    async fn test_out_of_stock_line_rolls_back_whole_invoice() {
        let pool = common::test_pool().await;
        let actor = common::create_user(&pool, UserRole::Sale).await;
        let shop = common::create_shop(&pool, &actor).await;
        let plenty = common::create_item(&pool, &actor, 10, Decimal::ONE).await;
        let scarce = common::create_item(&pool, &actor, 1, Decimal::ONE).await;

        let result = InvoiceService::new(pool.clone())
            .record_invoice(&actor, sale(shop.id, &[(plenty.id, 4), (scarce.id, 2)]))
            .await;

        assert!(matches!(result, Err(AppError::OutOfStock(code)) if code == scarce.code));
        assert_eq!(common::remaining_units(&pool, plenty.id).await, 10);
        assert_eq!(common::remaining_units(&pool, scarce.id).await, 1);

        let invoices = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices WHERE shop_id = $1")
            .bind(shop.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(invoices, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database connection
    async fn test_oversized_line_amount_is_rejected_without_selling() {
        let pool = common::test_pool().await;
        let actor = common::create_user(&pool, UserRole::Sale).await;
        let shop = common::create_shop(&pool, &actor).await;
        let item = common::create_item(&pool, &actor, 5, MAX_PRICE).await;

        let result = InvoiceService::new(pool.clone())
            .record_invoice(
                &actor,
                CreateInvoiceInput {
                    shop_id: shop.id,
                    lines: vec![InvoiceLineInput {
                        item_id: item.id,
                        quantity: 1,
                        amount: dec("1000"),
                    }],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::ValidationFailed { field, .. }) if field == "lines[0].amount"));
        assert_eq!(common::remaining_units(&pool, item.id).await, 5);
    }

    #[tokio::test]
    #[ignore] // Requires database connection
    async fn test_unknown_shop_is_rejected() {
        let pool = common::test_pool().await;
        let actor = common::create_user(&pool, UserRole::Sale).await;
        let item = common::create_item(&pool, &actor, 5, Decimal::ONE).await;

        let result = InvoiceService::new(pool.clone())
            .record_invoice(&actor, sale(i64::MAX, &[(item.id, 1)]))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(common::remaining_units(&pool, item.id).await, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore] // Requires database connection
    async fn test_concurrent_sales_never_oversell() {
        let pool = common::test_pool().await;
        let actor = common::create_user(&pool, UserRole::Sale).await;
        let shop = common::create_shop(&pool, &actor).await;
        let item = common::create_item(&pool, &actor, 5, Decimal::ONE).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = InvoiceService::new(pool.clone());
            let actor = actor.clone();
            let input = sale(shop.id, &[(item.id, 1)]);
            handles.push(tokio::spawn(async move { service.record_invoice(&actor, input).await }));
        }

        let mut sold = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(AppError::OutOfStock(_)) => rejected += 1,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }

        assert_eq!(sold, 5);
        assert_eq!(rejected, 3);
        assert_eq!(common::remaining_units(&pool, item.id).await, 0);
    }
}
