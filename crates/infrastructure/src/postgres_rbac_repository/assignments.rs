use super::*;

use rolegate_application::AssignmentRepository;

impl PostgresRbacRepository {
    async fn ensure_record_guard(
        &self,
        transaction: &mut Transaction<'_, Postgres>,
        table: RecordTable,
        id: Uuid,
        guard: &GuardName,
    ) -> AppResult<()> {
        let sql = match table {
            RecordTable::Roles => {
                r#"
                SELECT id, name, guard_name
                FROM rbac_roles
                WHERE id = $1
                FOR SHARE
                "#
            }
            RecordTable::Permissions => {
                r#"
                SELECT id, name, guard_name
                FROM rbac_permissions
                WHERE id = $1
                FOR SHARE
                "#
            }
        };

        let row = sqlx::query_as::<_, GuardedRow>(sql)
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to resolve {}: {error}", table.label()))
            })?
            .ok_or_else(|| AppError::NotFound(format!("{} '{id}' does not exist", table.label())))?;

        if row.guard_name != guard.as_str() {
            return Err(AppError::GuardMismatch(format!(
                "subject uses guard '{guard}' but {} '{}' uses guard '{}'",
                table.label(),
                row.name,
                row.guard_name
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum RecordTable {
    Roles,
    Permissions,
}

impl RecordTable {
    fn label(self) -> &'static str {
        match self {
            Self::Roles => "role",
            Self::Permissions => "permission",
        }
    }
}

#[async_trait]
impl AssignmentRepository for PostgresRbacRepository {
    async fn assign_role(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        role_id: RoleId,
    ) -> AppResult<bool> {
        let mut transaction = self.begin().await?;
        self.ensure_record_guard(&mut transaction, RecordTable::Roles, role_id.as_uuid(), guard)
            .await?;

        let rows_affected = sqlx::query(
            r#"
            INSERT INTO rbac_subject_roles (subject_type, subject_id, role_id, guard_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject_type, subject_id, role_id) DO NOTHING
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .bind(role_id.as_uuid())
        .bind(guard.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_link_error(error, "assign role"))?
        .rows_affected();

        commit(transaction).await?;
        Ok(rows_affected > 0)
    }

    async fn assign_permission(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let mut transaction = self.begin().await?;
        self.ensure_record_guard(
            &mut transaction,
            RecordTable::Permissions,
            permission_id.as_uuid(),
            guard,
        )
        .await?;

        let rows_affected = sqlx::query(
            r#"
            INSERT INTO rbac_subject_permissions (
                subject_type,
                subject_id,
                permission_id,
                guard_name
            )
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject_type, subject_id, permission_id) DO NOTHING
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .bind(permission_id.as_uuid())
        .bind(guard.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_link_error(error, "assign permission"))?
        .rows_affected();

        commit(transaction).await?;
        Ok(rows_affected > 0)
    }

    async fn revoke_role(&self, subject: &SubjectRef, role_id: RoleId) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_subject_roles
            WHERE subject_type = $1 AND subject_id = $2 AND role_id = $3
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke role: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn revoke_permission(
        &self,
        subject: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_subject_permissions
            WHERE subject_type = $1 AND subject_id = $2 AND permission_id = $3
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permission: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn list_subject_roles(&self, subject: &SubjectRef) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id,
                roles.name,
                roles.guard_name,
                roles.created_at,
                roles.updated_at
            FROM rbac_subject_roles AS assignments
            INNER JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.subject_type = $1
                AND assignments.subject_id = $2
            ORDER BY roles.name
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list subject roles: {error}")))?;

        roles_from_rows(rows)
    }

    async fn list_subject_direct_permissions(
        &self,
        subject: &SubjectRef,
    ) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                permissions.id,
                permissions.name,
                permissions.guard_name,
                permissions.display_name,
                permissions.created_at,
                permissions.updated_at
            FROM rbac_subject_permissions AS assignments
            INNER JOIN rbac_permissions AS permissions
                ON permissions.id = assignments.permission_id
            WHERE assignments.subject_type = $1
                AND assignments.subject_id = $2
            ORDER BY permissions.name
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list subject permissions: {error}"))
        })?;

        permissions_from_rows(rows)
    }
}
