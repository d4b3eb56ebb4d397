//! Sales ledger service
//!
//! Recording an invoice decrements stock for every line inside one
//! transaction. Each decrement is a single conditional `UPDATE`, so two sales
//! racing for the last units of an item cannot both succeed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{line_amount, AuditEvent, Invoice, InvoiceItem, User};
use shared::types::{PaginatedResponse, Pagination};
use shared::validation::{validate_amount_basis, validate_quantity};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;
use crate::services::listing::{push_eq, push_keyword, push_page, total_items};

/// Columns matched by the invoice keyword search
pub const INVOICE_SEARCH_FIELDS: &[&str] = &["u.fullname", "u.email", "s.name"];

const INVOICE_FROM: &str = " FROM invoices v \
    LEFT JOIN shops s ON s.id = v.shop_id \
    LEFT JOIN users u ON u.id = v.created_by_id \
    WHERE TRUE";

const LINE_COLUMNS: &str = "id, invoice_id, item_id, item_name, item_code, quantity, amount, created_at";

/// One requested sale line
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceLineInput {
    pub item_id: i64,
    pub quantity: i32,
    /// Multiplied by the item's current price to give the stored amount
    pub amount: Decimal,
}

/// Input for recording a sale
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceInput {
    pub shop_id: i64,
    #[serde(alias = "invoice_item_data")]
    pub lines: Vec<InvoiceLineInput>,
}

/// Query parameters for listing invoices
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    pub page: Option<u32>,
    pub keyword: Option<String>,
    pub shop_id: Option<i64>,
    pub created_by_id: Option<i64>,
}

/// An invoice with its lines
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub invoice_items: Vec<InvoiceItem>,
}

/// Invoice as returned by the list endpoint
#[derive(Debug, Serialize)]
pub struct InvoiceListing {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub shop_name: Option<String>,
    pub created_by_email: Option<String>,
    pub created_by_fullname: Option<String>,
    pub invoice_items: Vec<InvoiceItem>,
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    #[sqlx(flatten)]
    invoice: Invoice,
    shop_name: Option<String>,
    created_by_email: Option<String>,
    created_by_fullname: Option<String>,
}

/// Item state captured by a successful stock decrement
#[derive(Debug, sqlx::FromRow)]
struct SoldItem {
    name: String,
    code: String,
    price: Decimal,
}

/// Sales ledger service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    audit: AuditLog,
}

impl InvoiceService {
    pub fn new(db: PgPool) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
        }
    }

    /// Record a sale, decrementing stock for every line.
    ///
    /// If any line cannot be fulfilled nothing is written: the invoice, its
    /// lines and all earlier decrements are rolled back together.
    pub async fn record_invoice(&self, actor: &User, input: CreateInvoiceInput) -> AppResult<InvoiceDetail> {
        validate_lines(&input.lines)?;

        let mut tx = self.db.begin().await?;

        let shop_exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM shops WHERE id = $1)")
            .bind(input.shop_id)
            .fetch_one(&mut *tx)
            .await?;
        if !shop_exists {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (shop_id, created_by_id)
            VALUES ($1, $2)
            RETURNING id, shop_id, created_by_id, created_at
            "#,
        )
        .bind(input.shop_id)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;

        // Decrement in item id order so concurrent invoices lock rows consistently
        let mut order: Vec<usize> = (0..input.lines.len()).collect();
        order.sort_by_key(|&i| input.lines[i].item_id);

        let mut sold: Vec<Option<SoldItem>> = input.lines.iter().map(|_| None).collect();
        for i in order {
            let line = &input.lines[i];
            sold[i] = Some(decrement_stock(&mut *tx, line.item_id, line.quantity).await?);
        }

        let mut invoice_items = Vec::with_capacity(input.lines.len());
        for (i, (line, item)) in input.lines.iter().zip(sold).enumerate() {
            let item = item.ok_or_else(|| AppError::Internal("Invoice line was not processed".to_string()))?;
            let amount = line_amount(line.amount, item.price)
                .ok_or_else(|| AppError::validation(format!("lines[{}].amount", i), "Line amount is too large"))?;
            let row = sqlx::query_as::<_, InvoiceItem>(&format!(
                r#"
                INSERT INTO invoice_items (invoice_id, item_id, item_name, item_code, quantity, amount)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {}
                "#,
                LINE_COLUMNS
            ))
            .bind(invoice.id)
            .bind(line.item_id)
            .bind(&item.name)
            .bind(&item.code)
            .bind(line.quantity)
            .bind(amount)
            .fetch_one(&mut *tx)
            .await?;
            invoice_items.push(row);
        }

        tx.commit().await?;

        tracing::info!(
            invoice_id = invoice.id,
            shop_id = input.shop_id,
            lines = invoice_items.len(),
            "Invoice recorded"
        );
        self.audit
            .record(
                actor,
                AuditEvent::InvoiceRecorded {
                    created_at: invoice.created_at,
                },
            )
            .await;

        Ok(InvoiceDetail {
            invoice,
            invoice_items,
        })
    }

    /// Delete an invoice and its lines. Sold stock is not restored.
    pub async fn delete_invoice(&self, actor: &User, invoice_id: i64) -> AppResult<()> {
        let deleted = sqlx::query_scalar::<_, i64>("DELETE FROM invoices WHERE id = $1 RETURNING id")
            .bind(invoice_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        tracing::info!(invoice_id = deleted, "Invoice deleted");
        self.audit
            .record(
                actor,
                AuditEvent::InvoiceDeleted {
                    actor_email: actor.email.clone(),
                    invoice_id: deleted,
                },
            )
            .await;

        Ok(())
    }

    pub async fn list_invoices(&self, filter: &InvoiceFilter) -> AppResult<PaginatedResponse<InvoiceListing>> {
        let pagination = Pagination::for_page(filter.page);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(INVOICE_FROM);
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT v.id, v.shop_id, v.created_by_id, v.created_at, s.name AS shop_name, \
             u.email AS created_by_email, u.fullname AS created_by_fullname",
        );
        query.push(INVOICE_FROM);
        Self::push_filters(&mut query, filter);
        query.push(" ORDER BY v.created_at DESC, v.id DESC");
        push_page(&mut query, &pagination);

        let rows = query.build_query_as::<InvoiceRow>().fetch_all(&self.db).await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.invoice.id).collect();
        let mut lines = self.lines_for(&ids).await?;

        let invoices = rows
            .into_iter()
            .map(|row| InvoiceListing {
                invoice_items: lines.remove(&row.invoice.id).unwrap_or_default(),
                invoice: row.invoice,
                shop_name: row.shop_name,
                created_by_email: row.created_by_email,
                created_by_fullname: row.created_by_fullname,
            })
            .collect();

        Ok(PaginatedResponse::new(invoices, pagination, total_items(total)))
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &InvoiceFilter) {
        push_eq(builder, "v.shop_id", filter.shop_id);
        push_eq(builder, "v.created_by_id", filter.created_by_id);
        push_keyword(builder, filter.keyword.as_deref(), INVOICE_SEARCH_FIELDS);
    }

    async fn lines_for(&self, invoice_ids: &[i64]) -> AppResult<HashMap<i64, Vec<InvoiceItem>>> {
        if invoice_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {} FROM invoice_items WHERE invoice_id = ANY($1) ORDER BY id",
            LINE_COLUMNS
        ))
        .bind(invoice_ids)
        .fetch_all(&self.db)
        .await?;

        let mut grouped: HashMap<i64, Vec<InvoiceItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.invoice_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

fn validate_lines(lines: &[InvoiceLineInput]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::validation("lines", "An invoice needs at least one line"));
    }
    for (i, line) in lines.iter().enumerate() {
        validate_quantity(line.quantity).map_err(|e| AppError::validation(format!("lines[{}].quantity", i), e))?;
        validate_amount_basis(line.amount).map_err(|e| AppError::validation(format!("lines[{}].amount", i), e))?;
    }
    Ok(())
}

/// Take `quantity` units of an item, failing without side effects when the
/// item is missing or short of stock.
async fn decrement_stock(conn: &mut PgConnection, item_id: i64, quantity: i32) -> AppResult<SoldItem> {
    let sold = sqlx::query_as::<_, SoldItem>(
        r#"
        UPDATE inventory_items
        SET remaining_units = remaining_units - $1, updated_at = NOW()
        WHERE id = $2 AND remaining_units >= $1
        RETURNING name, code, price
        "#,
    )
    .bind(quantity)
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(sold) = sold {
        return Ok(sold);
    }

    let code = sqlx::query_scalar::<_, String>("SELECT code FROM inventory_items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

    match code {
        Some(code) => Err(AppError::OutOfStock(code)),
        None => Err(AppError::NotFound(format!("Item {}", item_id))),
    }
}
