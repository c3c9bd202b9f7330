use super::*;

use std::collections::HashSet;

use chrono::Utc;
use rolegate_domain::{
    Permission, PermissionChanges, PermissionId, Role, RoleId, ensure_same_guard,
};

use crate::rbac_ports::RecordListQuery;

/// Input payload for creating permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Permission name, unique within the guard.
    pub name: String,
    /// Owning guard; the default guard when absent.
    pub guard: Option<String>,
    /// Optional human-friendly label.
    pub display_name: Option<String>,
}

/// Input payload for partially updating permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePermissionInput {
    /// New name.
    pub name: Option<String>,
    /// New guard.
    pub guard: Option<String>,
    /// New display name; `Some(None)` clears it.
    pub display_name: Option<Option<String>>,
}

impl RbacAdminService {
    /// Lists permissions matching the filter.
    pub async fn list_permissions(
        &self,
        actor: &SubjectRef,
        query: RecordListQuery,
    ) -> AppResult<Vec<Permission>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::collection(ResourceKind::Permission),
        )
        .await?;

        self.repositories
            .permissions
            .list_permissions(query.normalized())
            .await
    }

    /// Returns one permission.
    pub async fn get_permission(
        &self,
        actor: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<Permission> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Permission, permission_id),
        )
        .await?;

        self.load_permission(permission_id).await
    }

    /// Returns a permission by its name within a guard.
    pub async fn find_permission_by_name(
        &self,
        actor: &SubjectRef,
        name: &str,
        guard: &str,
    ) -> AppResult<Permission> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::collection(ResourceKind::Permission),
        )
        .await?;

        let guard = GuardName::new(guard)?;
        let name = name.trim();
        self.repositories
            .permissions
            .find_permission_by_name(name, &guard)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "permission '{name}' does not exist in guard '{guard}'"
                ))
            })
    }

    /// Creates a permission and emits an audit event.
    pub async fn create_permission(
        &self,
        actor: &SubjectRef,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        self.require(
            actor,
            PolicyAction::Create,
            PolicyResource::collection(ResourceKind::Permission),
        )
        .await?;

        let guard = self.resolve_guard(input.guard)?;
        let now = Utc::now();
        let permission = Permission::new(
            PermissionId::new(),
            input.name,
            guard,
            input.display_name,
            now,
            now,
        )?;

        self.repositories
            .permissions
            .insert_permission(permission.clone())
            .await?;

        self.append_audit(
            actor,
            AuditAction::PermissionCreated,
            ResourceKind::Permission,
            permission.id().to_string(),
            format!(
                "created permission '{}' in guard '{}'",
                permission.name(),
                permission.guard()
            ),
        )
        .await?;

        Ok(permission)
    }

    /// Updates a permission and emits an audit event.
    pub async fn update_permission(
        &self,
        actor: &SubjectRef,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission> {
        self.require(
            actor,
            PolicyAction::Update,
            PolicyResource::record(ResourceKind::Permission, permission_id),
        )
        .await?;

        let current = self.load_permission(permission_id).await?;
        let guard = match input.guard {
            Some(guard) => Some(self.resolve_guard(Some(guard))?),
            None => None,
        };

        let updated = current.apply(
            PermissionChanges {
                name: input.name,
                guard,
                display_name: input.display_name,
            },
            Utc::now(),
        )?;

        self.repositories
            .permissions
            .update_permission(updated.clone())
            .await?;

        self.append_audit(
            actor,
            AuditAction::PermissionUpdated,
            ResourceKind::Permission,
            permission_id.to_string(),
            format!(
                "updated permission '{}' in guard '{}'",
                updated.name(),
                updated.guard()
            ),
        )
        .await?;

        Ok(updated)
    }

    /// Deletes a permission with its links and emits an audit event.
    pub async fn delete_permission(
        &self,
        actor: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.require(
            actor,
            PolicyAction::Delete,
            PolicyResource::record(ResourceKind::Permission, permission_id),
        )
        .await?;

        let permission = self.load_permission(permission_id).await?;
        self.repositories
            .permissions
            .delete_permission(permission_id)
            .await?;

        self.append_audit(
            actor,
            AuditAction::PermissionDeleted,
            ResourceKind::Permission,
            permission_id.to_string(),
            format!(
                "deleted permission '{}' from guard '{}'",
                permission.name(),
                permission.guard()
            ),
        )
        .await
    }

    /// Lists roles that own the permission.
    pub async fn list_permission_roles(
        &self,
        actor: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<Vec<Role>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Permission, permission_id),
        )
        .await?;

        self.load_permission(permission_id).await?;
        self.repositories
            .permissions
            .list_roles_with_permission(permission_id)
            .await
    }

    /// Lists subjects holding the permission directly.
    pub async fn list_permission_subjects(
        &self,
        actor: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<Vec<SubjectRef>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Permission, permission_id),
        )
        .await?;

        self.load_permission(permission_id).await?;
        self.repositories
            .permissions
            .list_subjects_with_permission(permission_id)
            .await
    }

    /// Replaces the set of roles owning the permission and returns the new set.
    pub async fn sync_permission_roles(
        &self,
        actor: &SubjectRef,
        permission_id: PermissionId,
        role_ids: Vec<RoleId>,
    ) -> AppResult<Vec<Role>> {
        let resource = PolicyResource::record(ResourceKind::Permission, permission_id);
        self.require(actor, PolicyAction::Attach, resource.clone())
            .await?;
        self.require(actor, PolicyAction::Detach, resource).await?;

        let permission = self.load_permission(permission_id).await?;
        let role_ids = self.linkable_roles(&permission, &role_ids).await?;
        self.repositories
            .permissions
            .sync_permission_roles(permission_id, &role_ids)
            .await?;

        self.append_audit(
            actor,
            AuditAction::PermissionRolesSynced,
            ResourceKind::Permission,
            permission_id.to_string(),
            format!(
                "synced permission '{}' to {} role(s)",
                permission.name(),
                role_ids.len()
            ),
        )
        .await?;

        self.repositories
            .permissions
            .list_roles_with_permission(permission_id)
            .await
    }

    pub(super) async fn load_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Permission> {
        self.repositories
            .permissions
            .find_permission(permission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_id}' does not exist"))
            })
    }

    /// Deduplicates ids and checks that each role exists in the permission's guard.
    async fn linkable_roles(
        &self,
        permission: &Permission,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<RoleId>> {
        let mut seen = HashSet::new();
        let unique: Vec<RoleId> = role_ids
            .iter()
            .copied()
            .filter(|role_id| seen.insert(*role_id))
            .collect();

        for role_id in &unique {
            let role = self.load_role(*role_id).await?;
            ensure_same_guard(
                format!("role '{}'", role.name()).as_str(),
                role.guard(),
                format!("permission '{}'", permission.name()).as_str(),
                permission.guard(),
            )?;
        }

        Ok(unique)
    }
}
