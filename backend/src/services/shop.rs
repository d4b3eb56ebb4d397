//! Shop registry service

use serde::{Deserialize, Serialize};
use shared::models::{AuditEvent, Shop, User};
use shared::types::{PaginatedResponse, Pagination};
use shared::validation::{validate_name, MAX_SHOP_NAME_LEN};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;
use crate::services::listing::{push_eq, push_keyword, push_page, total_items};

/// Columns matched by the shop keyword search
pub const SHOP_SEARCH_FIELDS: &[&str] = &["u.fullname", "u.email", "s.name"];

const SHOP_FROM: &str = " FROM shops s LEFT JOIN users u ON u.id = s.created_by_id WHERE TRUE";

#[derive(Debug, Deserialize)]
pub struct CreateShopInput {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShopInput {
    pub name: String,
}

/// Query parameters for listing shops
#[derive(Debug, Default, Deserialize)]
pub struct ShopFilter {
    pub page: Option<u32>,
    pub keyword: Option<String>,
    pub created_by_id: Option<i64>,
}

/// Shop row as returned by the list endpoint
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ShopListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub shop: Shop,
    pub created_by_email: Option<String>,
    pub created_by_fullname: Option<String>,
}

/// Shop service
#[derive(Clone)]
pub struct ShopService {
    db: PgPool,
    audit: AuditLog,
}

impl ShopService {
    pub fn new(db: PgPool) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
        }
    }

    pub async fn create_shop(&self, actor: &User, input: CreateShopInput) -> AppResult<Shop> {
        let name = Self::clean_name(&input.name)?;
        if self.name_taken(&name, None).await? {
            return Err(AppError::DuplicateName("name".to_string()));
        }

        let shop = sqlx::query_as::<_, Shop>(
            r#"
            INSERT INTO shops (name, created_by_id)
            VALUES ($1, $2)
            RETURNING id, name, created_by_id, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(actor.id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(shop_id = shop.id, name = %shop.name, "Shop created");
        self.audit
            .record(actor, AuditEvent::ShopAdded { name: shop.name.clone() })
            .await;

        Ok(shop)
    }

    pub async fn update_shop(&self, actor: &User, shop_id: i64, input: UpdateShopInput) -> AppResult<Shop> {
        let name = Self::clean_name(&input.name)?;
        if self.name_taken(&name, Some(shop_id)).await? {
            return Err(AppError::DuplicateName("name".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let old_name = sqlx::query_scalar::<_, String>("SELECT name FROM shops WHERE id = $1 FOR UPDATE")
            .bind(shop_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Shop".to_string()))?;

        let shop = sqlx::query_as::<_, Shop>(
            r#"
            UPDATE shops SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, created_by_id, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(shop_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(shop_id, "Shop updated");
        self.audit
            .record(
                actor,
                AuditEvent::ShopUpdated {
                    old_name,
                    new_name: shop.name.clone(),
                },
            )
            .await;

        Ok(shop)
    }

    /// Delete a shop; its invoices are kept with a NULL shop
    pub async fn delete_shop(&self, actor: &User, shop_id: i64) -> AppResult<()> {
        let name = sqlx::query_scalar::<_, String>("DELETE FROM shops WHERE id = $1 RETURNING name")
            .bind(shop_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Shop".to_string()))?;

        tracing::info!(shop_id, "Shop deleted");
        self.audit
            .record(
                actor,
                AuditEvent::ShopDeleted {
                    actor_email: actor.email.clone(),
                    name,
                },
            )
            .await;

        Ok(())
    }

    pub async fn list_shops(&self, filter: &ShopFilter) -> AppResult<PaginatedResponse<ShopListing>> {
        let pagination = Pagination::for_page(filter.page);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(SHOP_FROM);
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT s.id, s.name, s.created_by_id, s.created_at, s.updated_at, \
             u.email AS created_by_email, u.fullname AS created_by_fullname",
        );
        query.push(SHOP_FROM);
        Self::push_filters(&mut query, filter);
        query.push(" ORDER BY s.name");
        push_page(&mut query, &pagination);

        let shops = query.build_query_as::<ShopListing>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse::new(shops, pagination, total_items(total)))
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ShopFilter) {
        push_eq(builder, "s.created_by_id", filter.created_by_id);
        push_keyword(builder, filter.keyword.as_deref(), SHOP_SEARCH_FIELDS);
    }

    fn clean_name(name: &str) -> AppResult<String> {
        let name = name.trim().to_string();
        validate_name(&name, MAX_SHOP_NAME_LEN).map_err(|e| AppError::validation("name", e))?;
        Ok(name)
    }

    async fn name_taken(&self, name: &str, except_id: Option<i64>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM shops WHERE name = $1 AND id IS DISTINCT FROM $2)",
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }
}
