use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use rolegate_application::RecordListQuery;
use rolegate_core::{AppError, AppResult, SubjectRef};
use rolegate_domain::{GuardName, Permission, PermissionId, Role, RoleId};

mod assignments;
mod audit;
mod authorization;
mod permissions;
mod roles;

/// PostgreSQL-backed repository for permissions, roles, assignments and audit events.
#[derive(Clone)]
pub struct PostgresRbacRepository {
    pool: PgPool,
}

impl PostgresRbacRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    name: String,
    guard_name: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self) -> AppResult<Permission> {
        Permission::new(
            PermissionId::from_uuid(self.id),
            self.name,
            GuardName::new(self.guard_name)?,
            self.display_name,
            self.created_at,
            self.updated_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    guard_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        Role::new(
            RoleId::from_uuid(self.id),
            self.name,
            GuardName::new(self.guard_name)?,
            self.created_at,
            self.updated_at,
        )
    }
}

/// Minimal projection used for guard checks inside write transactions.
#[derive(Debug, FromRow)]
struct GuardedRow {
    id: Uuid,
    name: String,
    guard_name: String,
}

#[derive(Debug, FromRow)]
struct SubjectRow {
    subject_type: String,
    subject_id: String,
}

fn permissions_from_rows(rows: Vec<PermissionRow>) -> AppResult<Vec<Permission>> {
    rows.into_iter().map(PermissionRow::into_permission).collect()
}

fn roles_from_rows(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    rows.into_iter().map(RoleRow::into_role).collect()
}

/// Builds an `ILIKE` pattern that matches the search text literally.
fn search_pattern(query: &RecordListQuery) -> Option<String> {
    query.search.as_deref().map(|search| {
        let escaped = search
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}

/// Converts a pagination offset to the signed value PostgreSQL expects.
fn sql_offset(offset: usize) -> AppResult<i64> {
    i64::try_from(offset)
        .map_err(|_| AppError::Validation(format!("offset {offset} is out of range")))
}

fn map_record_write_error(
    error: sqlx::Error,
    kind: &str,
    name: &str,
    guard: &GuardName,
    operation: &str,
) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::DuplicateName(format!(
                    "{kind} '{name}' already exists in guard '{guard}'"
                ));
            }
            Some("23503") => {
                return AppError::GuardMismatch(format!(
                    "{kind} '{name}' cannot move to guard '{guard}' while it is linked"
                ));
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to {operation} {kind}: {error}"))
}

fn map_link_error(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::GuardMismatch(format!(
            "cannot {operation}: linked records do not share a guard"
        ));
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

/// Locks the role row and returns its guard.
async fn lock_role_guard(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: RoleId,
) -> AppResult<GuardedRow> {
    sqlx::query_as::<_, GuardedRow>(
        r#"
        SELECT id, name, guard_name
        FROM rbac_roles
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(role_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?
    .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
}

/// Ensures every permission exists and shares the role's guard.
async fn ensure_permissions_in_guard(
    transaction: &mut Transaction<'_, Postgres>,
    role: &GuardedRow,
    permission_ids: &[Uuid],
) -> AppResult<()> {
    if permission_ids.is_empty() {
        return Ok(());
    }

    let rows = sqlx::query_as::<_, GuardedRow>(
        r#"
        SELECT id, name, guard_name
        FROM rbac_permissions
        WHERE id = ANY($1)
        FOR SHARE
        "#,
    )
    .bind(permission_ids)
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to resolve permissions: {error}")))?;

    let missing: Vec<String> = permission_ids
        .iter()
        .filter(|permission_id| !rows.iter().any(|row| &row.id == *permission_id))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::NotFound(format!(
            "permission(s) {} do not exist",
            missing.join(", ")
        )));
    }

    if let Some(row) = rows.iter().find(|row| row.guard_name != role.guard_name) {
        return Err(AppError::GuardMismatch(format!(
            "role '{}' uses guard '{}' but permission '{}' uses guard '{}'",
            role.name, role.guard_name, row.name, row.guard_name
        )));
    }

    Ok(())
}

fn uuids_of(permission_ids: &[PermissionId]) -> Vec<Uuid> {
    permission_ids
        .iter()
        .map(PermissionId::as_uuid)
        .collect()
}

fn subject_from_row(row: SubjectRow) -> AppResult<SubjectRef> {
    SubjectRef::new(row.subject_type, row.subject_id)
}

#[cfg(test)]
mod tests;
