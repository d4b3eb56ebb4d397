//! Inventory item service
//!
//! Item codes derive from the row id, so creation inserts first and assigns
//! the code in the same transaction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::import::CsvItemRow;
use shared::models::{item_code, AuditEvent, InventoryItem, User};
use shared::types::{PaginatedResponse, Pagination};
use shared::validation::{validate_name, validate_price, validate_total_units, MAX_ITEM_NAME_LEN};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;
use crate::services::listing::{push_eq, push_keyword, push_page, total_items};

/// Columns matched by the item keyword search
pub const ITEM_SEARCH_FIELDS: &[&str] = &["i.code", "u.fullname", "u.email", "g.name", "i.name"];

const ITEM_RETURNING: &str =
    "id, code, name, price, total_units, remaining_units, group_id, photo, created_by_id, created_at, updated_at";

const ITEM_FROM: &str = " FROM inventory_items i \
    LEFT JOIN inventory_groups g ON g.id = i.group_id \
    LEFT JOIN users u ON u.id = i.created_by_id \
    WHERE TRUE";

/// Input for creating an item; `remaining_units` starts at `total_units`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub price: Decimal,
    pub total_units: i32,
    pub group_id: Option<i64>,
    pub photo: Option<String>,
}

impl From<CsvItemRow> for CreateItemInput {
    fn from(row: CsvItemRow) -> Self {
        Self {
            name: row.name,
            price: row.price,
            total_units: row.total_units,
            group_id: Some(row.group_id),
            photo: row.photo,
        }
    }
}

/// Editable item fields; stock counts are not editable
#[derive(Debug, Default)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub group_id: Option<Option<i64>>,
    pub photo: Option<Option<String>>,
}

/// Query parameters for listing items
#[derive(Debug, Default, Deserialize)]
pub struct ItemFilter {
    pub page: Option<u32>,
    pub keyword: Option<String>,
    pub group_id: Option<i64>,
    pub created_by_id: Option<i64>,
}

/// Item row as returned by the list endpoint
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ItemListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: InventoryItem,
    pub group_name: Option<String>,
    pub created_by_email: Option<String>,
    pub created_by_fullname: Option<String>,
}

/// Inventory item service
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
    audit: AuditLog,
}

impl ItemService {
    pub fn new(db: PgPool) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
        }
    }

    pub async fn create_item(&self, actor: &User, input: CreateItemInput) -> AppResult<InventoryItem> {
        validate_new_item(&input)?;
        if let Some(group_id) = input.group_id {
            ensure_group_exists(&self.db, group_id).await?;
        }

        let mut tx = self.db.begin().await?;
        let item = insert_item(&mut *tx, actor.id, &input).await?;
        tx.commit().await?;

        tracing::info!(item_id = item.id, code = %item.code, "Item created");
        self.audit
            .record(actor, AuditEvent::ItemAdded { code: item.code.clone() })
            .await;

        Ok(item)
    }

    pub async fn get_item(&self, item_id: i64) -> AppResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {} FROM inventory_items WHERE id = $1",
            ITEM_RETURNING
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Change name, price, group or photo of an item
    pub async fn update_item(
        &self,
        actor: &User,
        item_id: i64,
        input: UpdateItemInput,
    ) -> AppResult<InventoryItem> {
        if let Some(name) = &input.name {
            validate_name(name.trim(), MAX_ITEM_NAME_LEN).map_err(|e| AppError::validation("name", e))?;
        }
        if let Some(price) = input.price {
            validate_price(price).map_err(|e| AppError::validation("price", e))?;
        }
        if let Some(Some(group_id)) = input.group_id {
            ensure_group_exists(&self.db, group_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {} FROM inventory_items WHERE id = $1 FOR UPDATE",
            ITEM_RETURNING
        ))
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            UPDATE inventory_items
            SET name = $1, price = $2, group_id = $3, photo = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            ITEM_RETURNING
        ))
        .bind(input.name.map(|n| n.trim().to_string()).unwrap_or(current.name))
        .bind(input.price.unwrap_or(current.price))
        .bind(input.group_id.unwrap_or(current.group_id))
        .bind(input.photo.unwrap_or(current.photo))
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(item_id, "Item updated");
        self.audit
            .record(actor, AuditEvent::ItemUpdated { code: item.code.clone() })
            .await;

        Ok(item)
    }

    /// Delete an item; invoice lines keep their name and code snapshots
    pub async fn delete_item(&self, actor: &User, item_id: i64) -> AppResult<()> {
        let code = sqlx::query_scalar::<_, String>("DELETE FROM inventory_items WHERE id = $1 RETURNING code")
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        tracing::info!(item_id, "Item deleted");
        self.audit
            .record(
                actor,
                AuditEvent::ItemDeleted {
                    actor_email: actor.email.clone(),
                    code,
                },
            )
            .await;

        Ok(())
    }

    pub async fn list_items(&self, filter: &ItemFilter) -> AppResult<PaginatedResponse<ItemListing>> {
        let pagination = Pagination::for_page(filter.page);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(ITEM_FROM);
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT i.id, i.code, i.name, i.price, i.total_units, i.remaining_units, i.group_id, \
             i.photo, i.created_by_id, i.created_at, i.updated_at, \
             g.name AS group_name, u.email AS created_by_email, u.fullname AS created_by_fullname",
        );
        query.push(ITEM_FROM);
        Self::push_filters(&mut query, filter);
        query.push(" ORDER BY i.created_at DESC, i.id DESC");
        push_page(&mut query, &pagination);

        let items = query.build_query_as::<ItemListing>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse::new(items, pagination, total_items(total)))
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ItemFilter) {
        push_eq(builder, "i.group_id", filter.group_id);
        push_eq(builder, "i.created_by_id", filter.created_by_id);
        push_keyword(builder, filter.keyword.as_deref(), ITEM_SEARCH_FIELDS);
    }
}

fn validate_new_item(input: &CreateItemInput) -> AppResult<()> {
    validate_name(input.name.trim(), MAX_ITEM_NAME_LEN).map_err(|e| AppError::validation("name", e))?;
    validate_price(input.price).map_err(|e| AppError::validation("price", e))?;
    validate_total_units(input.total_units).map_err(|e| AppError::validation("total_units", e))?;
    Ok(())
}

pub(crate) async fn ensure_group_exists(db: &PgPool, group_id: i64) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM inventory_groups WHERE id = $1)")
        .bind(group_id)
        .fetch_one(db)
        .await?;
    if !exists {
        return Err(AppError::NotFound(format!("Group {}", group_id)));
    }
    Ok(())
}

/// Insert an item and assign its code on the caller's transaction
pub(crate) async fn insert_item(
    conn: &mut PgConnection,
    created_by_id: i64,
    input: &CreateItemInput,
) -> AppResult<InventoryItem> {
    let item_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO inventory_items (name, price, total_units, remaining_units, group_id, photo, created_by_id)
        VALUES ($1, $2, $3, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(input.name.trim())
    .bind(input.price)
    .bind(input.total_units)
    .bind(input.group_id)
    .bind(&input.photo)
    .bind(created_by_id)
    .fetch_one(&mut *conn)
    .await?;

    let item = sqlx::query_as::<_, InventoryItem>(&format!(
        "UPDATE inventory_items SET code = $1 WHERE id = $2 RETURNING {}",
        ITEM_RETURNING
    ))
    .bind(item_code(item_id))
    .bind(item_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(item)
}
