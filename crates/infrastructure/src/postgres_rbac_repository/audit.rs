use super::*;

use rolegate_application::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository, MAX_LIST_LIMIT,
};

#[derive(Debug, FromRow)]
struct AuditLogRow {
    event_id: Uuid,
    subject: String,
    action: String,
    resource_type: String,
    resource_id: String,
    detail: Option<String>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl AuditRepository for PostgresRbacRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_audit_events (
                subject,
                action,
                resource_type,
                resource_id,
                detail
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.subject)
        .bind(event.action.as_str())
        .bind(event.resource_type)
        .bind(event.resource_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for PostgresRbacRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, MAX_LIST_LIMIT) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id AS event_id,
                subject,
                action,
                resource_type,
                resource_id,
                detail,
                created_at
            FROM rbac_audit_events
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::TEXT IS NULL OR subject = $2)
            ORDER BY created_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.action)
        .bind(query.subject)
        .bind(capped_limit)
        .bind(sql_offset(query.offset)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| AuditLogEntry {
                event_id: row.event_id.to_string(),
                subject: row.subject,
                action: row.action,
                resource_type: row.resource_type,
                resource_id: row.resource_id,
                detail: row.detail,
                created_at: row.created_at,
            })
            .collect())
    }
}
