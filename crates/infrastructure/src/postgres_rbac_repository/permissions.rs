use super::*;

use rolegate_application::PermissionRepository;

#[async_trait]
impl PermissionRepository for PostgresRbacRepository {
    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_permissions (
                id,
                name,
                guard_name,
                display_name,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(permission.id().as_uuid())
        .bind(permission.name())
        .bind(permission.guard().as_str())
        .bind(permission.display_name())
        .bind(permission.created_at())
        .bind(permission.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_record_write_error(
                error,
                "permission",
                permission.name(),
                permission.guard(),
                "create",
            )
        })?;

        Ok(())
    }

    async fn update_permission(&self, permission: Permission) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        let stored_guard = sqlx::query_scalar::<_, String>(
            r#"
            SELECT guard_name
            FROM rbac_permissions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(permission.id().as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock permission: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!("permission '{}' does not exist", permission.id()))
        })?;

        if stored_guard != permission.guard().as_str() {
            let linked = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM rbac_role_permissions WHERE permission_id = $1
                    UNION ALL
                    SELECT 1 FROM rbac_subject_permissions WHERE permission_id = $1
                )
                "#,
            )
            .bind(permission.id().as_uuid())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to inspect permission links: {error}"))
            })?;

            if linked {
                return Err(AppError::GuardMismatch(format!(
                    "permission '{}' cannot move from guard '{stored_guard}' to '{}' while roles or subjects hold it",
                    permission.name(),
                    permission.guard()
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE rbac_permissions
            SET name = $2,
                guard_name = $3,
                display_name = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(permission.id().as_uuid())
        .bind(permission.name())
        .bind(permission.guard().as_str())
        .bind(permission.display_name())
        .bind(permission.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_record_write_error(
                error,
                "permission",
                permission.name(),
                permission.guard(),
                "update",
            )
        })?;

        commit(transaction).await
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete permission: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn find_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, guard_name, display_name, created_at, updated_at
            FROM rbac_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission: {error}")))?
        .map(PermissionRow::into_permission)
        .transpose()
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, guard_name, display_name, created_at, updated_at
            FROM rbac_permissions
            WHERE guard_name = $1 AND name = $2
            "#,
        )
        .bind(guard.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find permission by name: {error}"))
        })?
        .map(PermissionRow::into_permission)
        .transpose()
    }

    async fn find_permissions(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, guard_name, display_name, created_at, updated_at
            FROM rbac_permissions
            WHERE id = ANY($1)
            ORDER BY name, guard_name
            "#,
        )
        .bind(uuids_of(permission_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permissions: {error}")))?;

        permissions_from_rows(rows)
    }

    async fn list_permissions(&self, query: RecordListQuery) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, guard_name, display_name, created_at, updated_at
            FROM rbac_permissions
            WHERE ($1::TEXT IS NULL OR guard_name = $1)
                AND (
                    $2::TEXT IS NULL
                    OR id::TEXT ILIKE $2
                    OR name ILIKE $2
                    OR guard_name ILIKE $2
                )
            ORDER BY name, guard_name
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.guard.as_ref().map(GuardName::as_str))
        .bind(search_pattern(&query))
        .bind(query.limit as i64)
        .bind(sql_offset(query.offset)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        permissions_from_rows(rows)
    }

    async fn list_roles_with_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id,
                roles.name,
                roles.guard_name,
                roles.created_at,
                roles.updated_at
            FROM rbac_role_permissions AS links
            INNER JOIN rbac_roles AS roles
                ON roles.id = links.role_id
            WHERE links.permission_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list roles with permission: {error}"))
        })?;

        roles_from_rows(rows)
    }

    async fn sync_permission_roles(
        &self,
        permission_id: PermissionId,
        role_ids: &[RoleId],
    ) -> AppResult<()> {
        let role_ids: Vec<Uuid> = role_ids.iter().map(RoleId::as_uuid).collect();
        let mut transaction = self.begin().await?;

        let permission = sqlx::query_as::<_, GuardedRow>(
            r#"
            SELECT id, name, guard_name
            FROM rbac_permissions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock permission: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!("permission '{permission_id}' does not exist"))
        })?;

        let roles = sqlx::query_as::<_, GuardedRow>(
            r#"
            SELECT id, name, guard_name
            FROM rbac_roles
            WHERE id = ANY($1)
            FOR SHARE
            "#,
        )
        .bind(&role_ids)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve roles: {error}")))?;

        let missing: Vec<String> = role_ids
            .iter()
            .filter(|role_id| !roles.iter().any(|row| &row.id == *role_id))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "role(s) {} do not exist",
                missing.join(", ")
            )));
        }

        if let Some(row) = roles
            .iter()
            .find(|row| row.guard_name != permission.guard_name)
        {
            return Err(AppError::GuardMismatch(format!(
                "role '{}' uses guard '{}' but permission '{}' uses guard '{}'",
                row.name, row.guard_name, permission.name, permission.guard_name
            )));
        }

        sqlx::query(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE permission_id = $1 AND role_id <> ALL($2::UUID[])
            "#,
        )
        .bind(permission.id)
        .bind(&role_ids)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to prune permission roles: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO rbac_role_permissions (role_id, permission_id, guard_name)
            SELECT role_id, $1, $3
            FROM UNNEST($2::UUID[]) AS role_id
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(permission.id)
        .bind(&role_ids)
        .bind(permission.guard_name.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_link_error(error, "sync permission roles"))?;

        commit(transaction).await
    }

    async fn list_subjects_with_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Vec<SubjectRef>> {
        let rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT subject_type, subject_id
            FROM rbac_subject_permissions
            WHERE permission_id = $1
            ORDER BY subject_type, subject_id
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission subjects: {error}"))
        })?;

        rows.into_iter().map(subject_from_row).collect()
    }
}
