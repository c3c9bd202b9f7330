use super::*;

impl RbacState {
    fn ensure_unique_permission_name(&self, permission: &Permission) -> AppResult<()> {
        let taken = self.permissions.values().any(|stored| {
            stored.id() != permission.id()
                && stored.guard() == permission.guard()
                && stored.name() == permission.name()
        });

        if taken {
            return Err(AppError::DuplicateName(format!(
                "permission '{}' already exists in guard '{}'",
                permission.name(),
                permission.guard()
            )));
        }

        Ok(())
    }

    fn permission_is_linked(&self, permission_id: PermissionId) -> bool {
        self.role_permissions
            .iter()
            .any(|(_, stored_permission_id)| stored_permission_id == &permission_id)
            || self
                .subject_permissions
                .iter()
                .any(|(_, stored_permission_id)| stored_permission_id == &permission_id)
    }
}

#[async_trait]
impl PermissionRepository for InMemoryRbacRepository {
    async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.permissions.contains_key(&permission.id()) {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                permission.id()
            )));
        }

        state.ensure_unique_permission_name(&permission)?;
        state.permissions.insert(permission.id(), permission);
        Ok(())
    }

    async fn update_permission(&self, permission: Permission) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state.permission(permission.id())?;

        if stored.guard() != permission.guard() && state.permission_is_linked(permission.id()) {
            return Err(AppError::GuardMismatch(format!(
                "permission '{}' cannot move from guard '{}' to '{}' while roles or subjects hold it",
                permission.name(),
                stored.guard(),
                permission.guard()
            )));
        }

        state.ensure_unique_permission_name(&permission)?;
        state.permissions.insert(permission.id(), permission);
        Ok(())
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.permissions.remove(&permission_id).is_none() {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' does not exist"
            )));
        }

        state
            .role_permissions
            .retain(|(_, stored_permission_id)| stored_permission_id != &permission_id);
        state
            .subject_permissions
            .retain(|(_, stored_permission_id)| stored_permission_id != &permission_id);
        Ok(())
    }

    async fn find_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .get(&permission_id)
            .cloned())
    }

    async fn find_permission_by_name(
        &self,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .values()
            .find(|permission| permission.guard() == guard && permission.name() == name)
            .cloned())
    }

    async fn find_permissions(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(sort_permissions(
            permission_ids
                .iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter_map(|permission_id| state.permissions.get(permission_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_permissions(&self, query: RecordListQuery) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;
        let matching = state
            .permissions
            .values()
            .filter(|permission| {
                query
                    .guard
                    .as_ref()
                    .is_none_or(|guard| permission.guard() == guard)
                    && query.matches_search(
                        permission.id().to_string().as_str(),
                        permission.name(),
                        permission.guard().as_str(),
                    )
            })
            .cloned()
            .collect();

        Ok(page(sort_permissions(matching), &query))
    }

    async fn list_roles_with_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(sort_roles(
            state
                .role_permissions
                .iter()
                .filter(|(_, stored_permission_id)| stored_permission_id == &permission_id)
                .filter_map(|(role_id, _)| state.roles.get(role_id))
                .cloned()
                .collect(),
        ))
    }

    async fn sync_permission_roles(
        &self,
        permission_id: PermissionId,
        role_ids: &[RoleId],
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let permission = state.permission(permission_id)?;
        for role_id in role_ids {
            let role = state.role(*role_id)?;
            ensure_same_guard(
                format!("role '{}'", role.name()).as_str(),
                role.guard(),
                format!("permission '{}'", permission.name()).as_str(),
                permission.guard(),
            )?;
        }

        state
            .role_permissions
            .retain(|(_, stored_permission_id)| stored_permission_id != &permission_id);
        state
            .role_permissions
            .extend(role_ids.iter().map(|role_id| (*role_id, permission_id)));
        Ok(())
    }

    async fn list_subjects_with_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Vec<SubjectRef>> {
        let state = self.state.read().await;
        Ok(state
            .subject_permissions
            .iter()
            .filter(|(_, stored_permission_id)| stored_permission_id == &permission_id)
            .map(|(subject, _)| subject.clone())
            .collect())
    }
}
