use super::*;

use rolegate_application::AuthorizationRepository;

#[async_trait]
impl AuthorizationRepository for PostgresRbacRepository {
    async fn subject_has_permission(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        permission_name: &str,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM rbac_subject_permissions AS direct
                INNER JOIN rbac_permissions AS permissions
                    ON permissions.id = direct.permission_id
                WHERE direct.subject_type = $1
                    AND direct.subject_id = $2
                    AND permissions.guard_name = $3
                    AND permissions.name = $4
                UNION ALL
                SELECT 1
                FROM rbac_subject_roles AS assignments
                INNER JOIN rbac_role_permissions AS links
                    ON links.role_id = assignments.role_id
                INNER JOIN rbac_permissions AS permissions
                    ON permissions.id = links.permission_id
                WHERE assignments.subject_type = $1
                    AND assignments.subject_id = $2
                    AND permissions.guard_name = $3
                    AND permissions.name = $4
            )
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .bind(guard.as_str())
        .bind(permission_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check permission: {error}")))
    }

    async fn subject_has_role(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        role_name: &str,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM rbac_subject_roles AS assignments
                INNER JOIN rbac_roles AS roles
                    ON roles.id = assignments.role_id
                WHERE assignments.subject_type = $1
                    AND assignments.subject_id = $2
                    AND roles.guard_name = $3
                    AND roles.name = $4
            )
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .bind(guard.as_str())
        .bind(role_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check role: {error}")))
    }

    async fn list_effective_permissions(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
    ) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, guard_name, display_name, created_at, updated_at
            FROM rbac_permissions
            WHERE guard_name = $3
                AND (
                    id IN (
                        SELECT permission_id
                        FROM rbac_subject_permissions
                        WHERE subject_type = $1 AND subject_id = $2
                    )
                    OR id IN (
                        SELECT links.permission_id
                        FROM rbac_subject_roles AS assignments
                        INNER JOIN rbac_role_permissions AS links
                            ON links.role_id = assignments.role_id
                        WHERE assignments.subject_type = $1
                            AND assignments.subject_id = $2
                    )
                )
            ORDER BY name
            "#,
        )
        .bind(subject.subject_type())
        .bind(subject.subject_id())
        .bind(guard.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list effective permissions: {error}"))
        })?;

        permissions_from_rows(rows)
    }
}
