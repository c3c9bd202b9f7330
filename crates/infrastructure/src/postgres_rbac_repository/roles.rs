use super::*;

use rolegate_application::RoleRepository;

#[async_trait]
impl RoleRepository for PostgresRbacRepository {
    async fn insert_role(&self, role: Role, permission_ids: &[PermissionId]) -> AppResult<()> {
        let permission_ids = uuids_of(permission_ids);
        let mut transaction = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO rbac_roles (id, name, guard_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.guard().as_str())
        .bind(role.created_at())
        .bind(role.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_record_write_error(error, "role", role.name(), role.guard(), "create")
        })?;

        if !permission_ids.is_empty() {
            let guarded = GuardedRow {
                id: role.id().as_uuid(),
                name: role.name().to_owned(),
                guard_name: role.guard().as_str().to_owned(),
            };
            ensure_permissions_in_guard(&mut transaction, &guarded, &permission_ids).await?;

            sqlx::query(
                r#"
                INSERT INTO rbac_role_permissions (role_id, permission_id, guard_name)
                SELECT $1, permission_id, $3
                FROM UNNEST($2::UUID[]) AS permission_id
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(guarded.id)
            .bind(&permission_ids)
            .bind(guarded.guard_name.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_link_error(error, "attach permissions"))?;
        }

        commit(transaction).await
    }

    async fn update_role(&self, role: Role) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        let stored = lock_role_guard(&mut transaction, role.id()).await?;

        if stored.guard_name != role.guard().as_str() {
            let linked = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM rbac_role_permissions WHERE role_id = $1
                    UNION ALL
                    SELECT 1 FROM rbac_subject_roles WHERE role_id = $1
                )
                "#,
            )
            .bind(role.id().as_uuid())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to inspect role links: {error}"))
            })?;

            if linked {
                return Err(AppError::GuardMismatch(format!(
                    "role '{}' cannot move from guard '{}' to '{}' while it has permissions or subjects",
                    role.name(),
                    stored.guard_name,
                    role.guard()
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE rbac_roles
            SET name = $2,
                guard_name = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.guard().as_str())
        .bind(role.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_record_write_error(error, "role", role.name(), role.guard(), "update")
        })?;

        commit(transaction).await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, guard_name, created_at, updated_at
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?
        .map(RoleRow::into_role)
        .transpose()
    }

    async fn find_role_by_name(&self, name: &str, guard: &GuardName) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, guard_name, created_at, updated_at
            FROM rbac_roles
            WHERE guard_name = $1 AND name = $2
            "#,
        )
        .bind(guard.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by name: {error}")))?
        .map(RoleRow::into_role)
        .transpose()
    }

    async fn list_roles(&self, query: RecordListQuery) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, guard_name, created_at, updated_at
            FROM rbac_roles
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
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        roles_from_rows(rows)
    }

    async fn attach_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<usize> {
        let permission_ids = uuids_of(permission_ids);
        let mut transaction = self.begin().await?;
        let role = lock_role_guard(&mut transaction, role_id).await?;
        ensure_permissions_in_guard(&mut transaction, &role, &permission_ids).await?;

        let created = sqlx::query(
            r#"
            INSERT INTO rbac_role_permissions (role_id, permission_id, guard_name)
            SELECT $1, permission_id, $3
            FROM UNNEST($2::UUID[]) AS permission_id
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role.id)
        .bind(&permission_ids)
        .bind(role.guard_name.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_link_error(error, "attach permissions"))?
        .rows_affected();

        commit(transaction).await?;
        Ok(created as usize)
    }

    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE role_id = $1 AND permission_id = $2
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to detach permission: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn sync_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let permission_ids = uuids_of(permission_ids);
        let mut transaction = self.begin().await?;
        let role = lock_role_guard(&mut transaction, role_id).await?;
        ensure_permissions_in_guard(&mut transaction, &role, &permission_ids).await?;

        sqlx::query(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE role_id = $1 AND permission_id <> ALL($2::UUID[])
            "#,
        )
        .bind(role.id)
        .bind(&permission_ids)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to prune role permissions: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO rbac_role_permissions (role_id, permission_id, guard_name)
            SELECT $1, permission_id, $3
            FROM UNNEST($2::UUID[]) AS permission_id
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role.id)
        .bind(&permission_ids)
        .bind(role.guard_name.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_link_error(error, "sync role permissions"))?;

        commit(transaction).await
    }

    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                permissions.id,
                permissions.name,
                permissions.guard_name,
                permissions.display_name,
                permissions.created_at,
                permissions.updated_at
            FROM rbac_role_permissions AS links
            INNER JOIN rbac_permissions AS permissions
                ON permissions.id = links.permission_id
            WHERE links.role_id = $1
            ORDER BY permissions.name
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role permissions: {error}")))?;

        permissions_from_rows(rows)
    }

    async fn list_subjects_with_role(&self, role_id: RoleId) -> AppResult<Vec<SubjectRef>> {
        let rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT subject_type, subject_id
            FROM rbac_subject_roles
            WHERE role_id = $1
            ORDER BY subject_type, subject_id
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role subjects: {error}")))?;

        rows.into_iter().map(subject_from_row).collect()
    }
}
