use super::*;

impl RbacState {
    fn ensure_unique_role_name(&self, role: &Role) -> AppResult<()> {
        let taken = self.roles.values().any(|stored| {
            stored.id() != role.id()
                && stored.guard() == role.guard()
                && stored.name() == role.name()
        });

        if taken {
            return Err(AppError::DuplicateName(format!(
                "role '{}' already exists in guard '{}'",
                role.name(),
                role.guard()
            )));
        }

        Ok(())
    }

    fn role_is_linked(&self, role_id: RoleId) -> bool {
        self.role_permissions
            .iter()
            .any(|(stored_role_id, _)| stored_role_id == &role_id)
            || self
                .subject_roles
                .iter()
                .any(|(_, stored_role_id)| stored_role_id == &role_id)
    }
}

#[async_trait]
impl RoleRepository for InMemoryRbacRepository {
    async fn insert_role(&self, role: Role, permission_ids: &[PermissionId]) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.roles.contains_key(&role.id()) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.id()
            )));
        }

        state.ensure_unique_role_name(&role)?;
        state.ensure_permissions_in_guard(&role, permission_ids)?;

        let role_id = role.id();
        state.roles.insert(role_id, role);
        state.role_permissions.extend(
            permission_ids
                .iter()
                .map(|permission_id| (role_id, *permission_id)),
        );
        Ok(())
    }

    async fn update_role(&self, role: Role) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state.role(role.id())?;

        if stored.guard() != role.guard() && state.role_is_linked(role.id()) {
            return Err(AppError::GuardMismatch(format!(
                "role '{}' cannot move from guard '{}' to '{}' while it has permissions or subjects",
                role.name(),
                stored.guard(),
                role.guard()
            )));
        }

        state.ensure_unique_role_name(&role)?;
        state.roles.insert(role.id(), role);
        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.roles.remove(&role_id).is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        state
            .role_permissions
            .retain(|(stored_role_id, _)| stored_role_id != &role_id);
        state
            .subject_roles
            .retain(|(_, stored_role_id)| stored_role_id != &role_id);
        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &str, guard: &GuardName) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .values()
            .find(|role| role.guard() == guard && role.name() == name)
            .cloned())
    }

    async fn list_roles(&self, query: RecordListQuery) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        let matching = state
            .roles
            .values()
            .filter(|role| {
                query.guard.as_ref().is_none_or(|guard| role.guard() == guard)
                    && query.matches_search(
                        role.id().to_string().as_str(),
                        role.name(),
                        role.guard().as_str(),
                    )
            })
            .cloned()
            .collect();

        Ok(page(sort_roles(matching), &query))
    }

    async fn attach_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<usize> {
        let mut state = self.state.write().await;
        state.ensure_attachable(role_id, permission_ids)?;

        let mut created = 0;
        for permission_id in permission_ids {
            if state.role_permissions.insert((role_id, *permission_id)) {
                created += 1;
            }
        }

        Ok(created)
    }

    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .role_permissions
            .remove(&(role_id, permission_id)))
    }

    async fn sync_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_attachable(role_id, permission_ids)?;

        state
            .role_permissions
            .retain(|(stored_role_id, _)| stored_role_id != &role_id);
        state.role_permissions.extend(
            permission_ids
                .iter()
                .map(|permission_id| (role_id, *permission_id)),
        );
        Ok(())
    }

    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(sort_permissions(
            state
                .role_permissions
                .iter()
                .filter(|(stored_role_id, _)| stored_role_id == &role_id)
                .filter_map(|(_, permission_id)| state.permissions.get(permission_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_subjects_with_role(&self, role_id: RoleId) -> AppResult<Vec<SubjectRef>> {
        let state = self.state.read().await;
        Ok(state
            .subject_roles
            .iter()
            .filter(|(_, stored_role_id)| stored_role_id == &role_id)
            .map(|(subject, _)| subject.clone())
            .collect())
    }
}
