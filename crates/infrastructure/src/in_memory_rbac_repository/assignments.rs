use super::*;

#[async_trait]
impl AssignmentRepository for InMemoryRbacRepository {
    async fn assign_role(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        role_id: RoleId,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let role = state.role(role_id)?;
        ensure_same_guard(
            format!("subject '{subject}'").as_str(),
            guard,
            format!("role '{}'", role.name()).as_str(),
            role.guard(),
        )?;

        Ok(state.subject_roles.insert((subject.clone(), role_id)))
    }

    async fn assign_permission(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let permission = state.permission(permission_id)?;
        ensure_same_guard(
            format!("subject '{subject}'").as_str(),
            guard,
            format!("permission '{}'", permission.name()).as_str(),
            permission.guard(),
        )?;

        Ok(state
            .subject_permissions
            .insert((subject.clone(), permission_id)))
    }

    async fn revoke_role(&self, subject: &SubjectRef, role_id: RoleId) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .subject_roles
            .remove(&(subject.clone(), role_id)))
    }

    async fn revoke_permission(
        &self,
        subject: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .subject_permissions
            .remove(&(subject.clone(), permission_id)))
    }

    async fn list_subject_roles(&self, subject: &SubjectRef) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(sort_roles(
            state
                .subject_roles
                .iter()
                .filter(|(stored_subject, _)| stored_subject == subject)
                .filter_map(|(_, role_id)| state.roles.get(role_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_subject_direct_permissions(
        &self,
        subject: &SubjectRef,
    ) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(sort_permissions(
            state
                .subject_permissions
                .iter()
                .filter(|(stored_subject, _)| stored_subject == subject)
                .filter_map(|(_, permission_id)| state.permissions.get(permission_id))
                .cloned()
                .collect(),
        ))
    }
}
