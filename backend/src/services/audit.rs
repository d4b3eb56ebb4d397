//! Append-only audit trail of user actions

use serde::Deserialize;
use shared::models::{AuditEvent, User, UserActivity};
use shared::types::{PaginatedResponse, Pagination};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::AppResult;
use crate::services::listing::{push_eq, push_keyword, push_page, total_items};

/// Columns matched by the activity log keyword search
pub const ACTIVITY_SEARCH_FIELDS: &[&str] = &["a.email", "a.fullname", "a.action"];

/// Query parameters for the activity log
#[derive(Debug, Default, Deserialize)]
pub struct ActivityFilter {
    pub page: Option<u32>,
    pub keyword: Option<String>,
    pub user_id: Option<i64>,
}

/// Audit log writer and reader
#[derive(Clone)]
pub struct AuditLog {
    db: PgPool,
}

impl AuditLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an event for `actor` once its mutation has committed.
    ///
    /// A failed write is logged and swallowed: the mutation it describes is
    /// already durable and must not be reported as failed.
    pub async fn record(&self, actor: &User, event: AuditEvent) {
        if let Err(e) = self.append(actor, &event).await {
            tracing::error!(user_id = actor.id, action = %event, "Failed to write audit entry: {:?}", e);
        }
    }

    /// Insert an audit entry, snapshotting the actor's email and full name
    pub async fn append(&self, actor: &User, event: &AuditEvent) -> AppResult<UserActivity> {
        let entry = sqlx::query_as::<_, UserActivity>(
            r#"
            INSERT INTO user_activities (user_id, email, fullname, action)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, email, fullname, action, created_at
            "#,
        )
        .bind(actor.id)
        .bind(&actor.email)
        .bind(&actor.fullname)
        .bind(event.action())
        .fetch_one(&self.db)
        .await?;

        tracing::debug!(user_id = actor.id, action = %entry.action, "Audit entry recorded");
        Ok(entry)
    }

    /// Paginated, searchable audit entries, newest first
    pub async fn list(&self, filter: &ActivityFilter) -> AppResult<PaginatedResponse<UserActivity>> {
        let pagination = Pagination::for_page(filter.page);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM user_activities a WHERE TRUE");
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT a.id, a.user_id, a.email, a.fullname, a.action, a.created_at \
             FROM user_activities a WHERE TRUE",
        );
        Self::push_filters(&mut query, filter);
        query.push(" ORDER BY a.created_at DESC, a.id DESC");
        push_page(&mut query, &pagination);

        let entries = query.build_query_as::<UserActivity>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse::new(entries, pagination, total_items(total)))
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ActivityFilter) {
        push_eq(builder, "a.user_id", filter.user_id);
        push_keyword(builder, filter.keyword.as_deref(), ACTIVITY_SEARCH_FIELDS);
    }
}
