//! Inventory group service
//!
//! Groups form a tree through `belongs_to_id`. Deleting a group detaches its
//! child groups and items (their reference becomes NULL).

use serde::{Deserialize, Serialize};
use shared::models::{creates_cycle, AuditEvent, InventoryGroup, User};
use shared::types::{PaginatedResponse, Pagination};
use shared::validation::{validate_name, MAX_GROUP_NAME_LEN};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;
use crate::services::listing::{push_eq, push_keyword, push_page, total_items};

/// Columns matched by the group keyword search
pub const GROUP_SEARCH_FIELDS: &[&str] = &["u.fullname", "u.email", "g.name"];

/// Advisory lock key serializing group re-parenting
const REPARENT_LOCK_KEY: i64 = 0x5341_5241_4752_5000;

const GROUP_COLUMNS: &str = "g.id, g.name, g.belongs_to_id, g.created_by_id, g.created_at, g.updated_at";

const GROUP_FROM: &str = " FROM inventory_groups g \
    LEFT JOIN inventory_groups p ON p.id = g.belongs_to_id \
    LEFT JOIN users u ON u.id = g.created_by_id \
    WHERE TRUE";

/// Input for creating a group
#[derive(Debug, Deserialize)]
pub struct CreateGroupInput {
    pub name: String,
    pub belongs_to_id: Option<i64>,
}

/// Partial update of a group.
///
/// `belongs_to_id: Some(None)` detaches the group from its parent.
#[derive(Debug, Default)]
pub struct UpdateGroupInput {
    pub name: Option<String>,
    pub belongs_to_id: Option<Option<i64>>,
}

/// Query parameters for listing groups
#[derive(Debug, Default, Deserialize)]
pub struct GroupFilter {
    pub page: Option<u32>,
    pub keyword: Option<String>,
    pub belongs_to_id: Option<i64>,
    pub created_by_id: Option<i64>,
}

/// Group row as returned by the list endpoint
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct GroupListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub group: InventoryGroup,
    pub belongs_to_name: Option<String>,
    pub created_by_email: Option<String>,
    pub created_by_fullname: Option<String>,
    /// Number of items in the group
    pub total_items: i64,
}

/// Inventory group service
#[derive(Clone)]
pub struct GroupService {
    db: PgPool,
    audit: AuditLog,
}

impl GroupService {
    pub fn new(db: PgPool) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
        }
    }

    pub async fn create_group(&self, actor: &User, input: CreateGroupInput) -> AppResult<InventoryGroup> {
        let name = input.name.trim().to_string();
        validate_name(&name, MAX_GROUP_NAME_LEN).map_err(|e| AppError::validation("name", e))?;

        let mut conn = self.db.acquire().await?;
        if name_taken(&mut *conn, &name, None).await? {
            return Err(AppError::DuplicateName("name".to_string()));
        }
        if let Some(parent_id) = input.belongs_to_id {
            if !group_exists(&mut *conn, parent_id).await? {
                return Err(AppError::NotFound("Group".to_string()));
            }
        }

        let group = sqlx::query_as::<_, InventoryGroup>(
            r#"
            INSERT INTO inventory_groups (name, belongs_to_id, created_by_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, belongs_to_id, created_by_id, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(input.belongs_to_id)
        .bind(actor.id)
        .fetch_one(&mut *conn)
        .await?;
        drop(conn);

        tracing::info!(group_id = group.id, name = %group.name, "Group created");
        self.audit
            .record(actor, AuditEvent::GroupAdded { name: group.name.clone() })
            .await;

        Ok(group)
    }

    pub async fn get_group(&self, group_id: i64) -> AppResult<InventoryGroup> {
        sqlx::query_as::<_, InventoryGroup>(
            "SELECT id, name, belongs_to_id, created_by_id, created_at, updated_at FROM inventory_groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Group".to_string()))
    }

    /// Rename and/or re-parent a group.
    ///
    /// Re-parenting holds a transaction-scoped advisory lock, taken before any
    /// row lock, so concurrent moves see each other's committed parents.
    pub async fn update_group(
        &self,
        actor: &User,
        group_id: i64,
        input: UpdateGroupInput,
    ) -> AppResult<InventoryGroup> {
        let mut tx = self.db.begin().await?;

        if matches!(input.belongs_to_id, Some(Some(_))) {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(REPARENT_LOCK_KEY)
                .execute(&mut *tx)
                .await?;
        }

        let current = sqlx::query_as::<_, InventoryGroup>(
            "SELECT id, name, belongs_to_id, created_by_id, created_at, updated_at \
             FROM inventory_groups WHERE id = $1 FOR UPDATE",
        )
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Group".to_string()))?;

        let name = match input.name {
            Some(name) => {
                let name = name.trim().to_string();
                validate_name(&name, MAX_GROUP_NAME_LEN).map_err(|e| AppError::validation("name", e))?;
                name
            }
            None => current.name.clone(),
        };
        if name != current.name && name_taken(&mut *tx, &name, Some(group_id)).await? {
            return Err(AppError::DuplicateName("name".to_string()));
        }

        let belongs_to_id = match input.belongs_to_id {
            Some(Some(parent_id)) => {
                if !group_exists(&mut *tx, parent_id).await? {
                    return Err(AppError::NotFound("Group".to_string()));
                }
                let ancestors = ancestors(&mut *tx, parent_id).await?;
                if creates_cycle(group_id, parent_id, &ancestors) {
                    return Err(AppError::validation(
                        "belongs_to_id",
                        "A group cannot be moved under itself or one of its descendants",
                    ));
                }
                Some(parent_id)
            }
            Some(None) => None,
            None => current.belongs_to_id,
        };

        let group = sqlx::query_as::<_, InventoryGroup>(
            r#"
            UPDATE inventory_groups
            SET name = $1, belongs_to_id = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING id, name, belongs_to_id, created_by_id, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(belongs_to_id)
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(group_id, "Group updated");
        self.audit
            .record(
                actor,
                AuditEvent::GroupUpdated {
                    old_name: current.name,
                    new_name: group.name.clone(),
                },
            )
            .await;

        Ok(group)
    }

    /// Delete a group; child groups and items are detached
    pub async fn delete_group(&self, actor: &User, group_id: i64) -> AppResult<()> {
        let name = sqlx::query_scalar::<_, String>("DELETE FROM inventory_groups WHERE id = $1 RETURNING name")
            .bind(group_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Group".to_string()))?;

        tracing::info!(group_id, "Group deleted");
        self.audit
            .record(
                actor,
                AuditEvent::GroupDeleted {
                    actor_email: actor.email.clone(),
                    name,
                },
            )
            .await;

        Ok(())
    }

    pub async fn list_groups(&self, filter: &GroupFilter) -> AppResult<PaginatedResponse<GroupListing>> {
        let pagination = Pagination::for_page(filter.page);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(GROUP_FROM);
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query
            .push(GROUP_COLUMNS)
            .push(
                ", p.name AS belongs_to_name, u.email AS created_by_email, \
                 u.fullname AS created_by_fullname, \
                 (SELECT COUNT(*) FROM inventory_items i WHERE i.group_id = g.id) AS total_items",
            )
            .push(GROUP_FROM);
        Self::push_filters(&mut query, filter);
        query.push(" ORDER BY g.name");
        push_page(&mut query, &pagination);

        let groups = query.build_query_as::<GroupListing>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse::new(groups, pagination, total_items(total)))
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &GroupFilter) {
        push_eq(builder, "g.belongs_to_id", filter.belongs_to_id);
        push_eq(builder, "g.created_by_id", filter.created_by_id);
        push_keyword(builder, filter.keyword.as_deref(), GROUP_SEARCH_FIELDS);
    }
}

/// Ancestor chain of a group, nearest first
async fn ancestors(conn: &mut PgConnection, group_id: i64) -> AppResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        WITH RECURSIVE chain(id, belongs_to_id, depth) AS (
            SELECT id, belongs_to_id, 0 FROM inventory_groups WHERE id = $1
            UNION ALL
            SELECT g.id, g.belongs_to_id, c.depth + 1
            FROM inventory_groups g
            JOIN chain c ON g.id = c.belongs_to_id
            WHERE c.depth < 1000
        )
        SELECT id FROM chain WHERE depth > 0 ORDER BY depth
        "#,
    )
    .bind(group_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

async fn group_exists(conn: &mut PgConnection, group_id: i64) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM inventory_groups WHERE id = $1)")
        .bind(group_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

async fn name_taken(conn: &mut PgConnection, name: &str, except_id: Option<i64>) -> AppResult<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM inventory_groups WHERE name = $1 AND id IS DISTINCT FROM $2)",
    )
    .bind(name)
    .bind(except_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(taken)
}
