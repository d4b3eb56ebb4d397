//! Bulk item creation from CSV uploads
//!
//! The whole upload is parsed and validated before anything is written, then
//! every item is created in one transaction.

use serde::Serialize;
use shared::import::{parse_row, CsvItemRow};
use shared::models::{AuditEvent, User};
use sqlx::PgPool;
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;
use crate::services::item::{insert_item, CreateItemInput};

/// Result of an import
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub codes: Vec<String>,
}

/// Decode an upload into item rows.
///
/// The file has no header row. Rows whose first column is empty are skipped;
/// an upload with nothing left is rejected as empty.
pub fn parse_upload(bytes: &[u8]) -> AppResult<Vec<CsvItemRow>> {
    let text = std::str::from_utf8(bytes).map_err(|_| AppError::MalformedCsv("file is not valid UTF-8".to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::MalformedCsv(e.to_string()))?;
        let columns: Vec<&str> = record.iter().collect();
        let row = parse_row(&columns)
            .map_err(|e| AppError::validation(format!("row {}: {}", index + 1, e.field), e.reason))?;
        if let Some(row) = row {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(AppError::EmptyUpload);
    }
    Ok(rows)
}

/// CSV import service
#[derive(Clone)]
pub struct CsvImportService {
    db: PgPool,
    audit: AuditLog,
}

impl CsvImportService {
    pub fn new(db: PgPool) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
        }
    }

    /// Create every row of an upload as an item owned by `actor`
    pub async fn import(&self, actor: &User, bytes: &[u8]) -> AppResult<ImportSummary> {
        let rows = parse_upload(bytes)?;
        self.import_rows(actor, rows).await
    }

    pub async fn import_rows(&self, actor: &User, rows: Vec<CsvItemRow>) -> AppResult<ImportSummary> {
        if rows.is_empty() {
            return Err(AppError::EmptyUpload);
        }

        let mut tx = self.db.begin().await?;

        let group_ids: Vec<i64> = rows
            .iter()
            .map(|r| r.group_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM inventory_groups WHERE id = ANY($1)")
            .bind(&group_ids)
            .fetch_all(&mut *tx)
            .await?;
        if let Some(missing) = group_ids.iter().find(|id| !found.contains(*id)) {
            return Err(AppError::NotFound(format!("Group {}", missing)));
        }

        let mut codes = Vec::with_capacity(rows.len());
        for row in rows {
            let item = insert_item(&mut *tx, actor.id, &CreateItemInput::from(row)).await?;
            codes.push(item.code);
        }

        tx.commit().await?;

        tracing::info!(user_id = actor.id, created = codes.len(), "Items imported from CSV");
        for code in &codes {
            self.audit
                .record(actor, AuditEvent::ItemAdded { code: code.clone() })
                .await;
        }

        Ok(ImportSummary {
            created: codes.len(),
            codes,
        })
    }
}
