use super::*;

use std::collections::HashSet;

use chrono::Utc;
use rolegate_domain::{Permission, PermissionId, Role, RoleChanges, RoleId, ensure_same_guard};

use crate::rbac_ports::RecordListQuery;

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique within the guard.
    pub name: String,
    /// Owning guard; the default guard when absent.
    pub guard: Option<String>,
    /// Permissions attached right after creation.
    pub permission_ids: Vec<PermissionId>,
}

/// Input payload for partially updating roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New name.
    pub name: Option<String>,
    /// New guard.
    pub guard: Option<String>,
}

impl RbacAdminService {
    /// Lists roles matching the filter.
    pub async fn list_roles(
        &self,
        actor: &SubjectRef,
        query: RecordListQuery,
    ) -> AppResult<Vec<Role>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::collection(ResourceKind::Role),
        )
        .await?;

        self.repositories.roles.list_roles(query.normalized()).await
    }

    /// Returns one role.
    pub async fn get_role(&self, actor: &SubjectRef, role_id: RoleId) -> AppResult<Role> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Role, role_id),
        )
        .await?;

        self.load_role(role_id).await
    }

    /// Returns a role by its name within a guard.
    pub async fn find_role_by_name(
        &self,
        actor: &SubjectRef,
        name: &str,
        guard: &str,
    ) -> AppResult<Role> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::collection(ResourceKind::Role),
        )
        .await?;

        let guard = GuardName::new(guard)?;
        let name = name.trim();
        self.repositories
            .roles
            .find_role_by_name(name, &guard)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("role '{name}' does not exist in guard '{guard}'"))
            })
    }

    /// Creates a role, attaches the requested permissions and emits an audit event.
    pub async fn create_role(&self, actor: &SubjectRef, input: CreateRoleInput) -> AppResult<Role> {
        self.require(
            actor,
            PolicyAction::Create,
            PolicyResource::collection(ResourceKind::Role),
        )
        .await?;

        let guard = self.resolve_guard(input.guard)?;
        let now = Utc::now();
        let role = Role::new(RoleId::new(), input.name, guard, now, now)?;
        let permission_ids = self
            .attachable_permissions(&role, &input.permission_ids)
            .await?;

        self.repositories
            .roles
            .insert_role(role.clone(), &permission_ids)
            .await?;

        self.append_audit(
            actor,
            AuditAction::RoleCreated,
            ResourceKind::Role,
            role.id().to_string(),
            format!(
                "created role '{}' in guard '{}' with {} permission(s)",
                role.name(),
                role.guard(),
                permission_ids.len()
            ),
        )
        .await?;

        Ok(role)
    }

    /// Updates a role and emits an audit event.
    pub async fn update_role(
        &self,
        actor: &SubjectRef,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        self.require(
            actor,
            PolicyAction::Update,
            PolicyResource::record(ResourceKind::Role, role_id),
        )
        .await?;

        let current = self.load_role(role_id).await?;
        let guard = match input.guard {
            Some(guard) => Some(self.resolve_guard(Some(guard))?),
            None => None,
        };

        let updated = current.apply(
            RoleChanges {
                name: input.name,
                guard,
            },
            Utc::now(),
        )?;

        self.repositories.roles.update_role(updated.clone()).await?;

        self.append_audit(
            actor,
            AuditAction::RoleUpdated,
            ResourceKind::Role,
            role_id.to_string(),
            format!(
                "updated role '{}' in guard '{}'",
                updated.name(),
                updated.guard()
            ),
        )
        .await?;

        Ok(updated)
    }

    /// Deletes a role with its links and emits an audit event.
    pub async fn delete_role(&self, actor: &SubjectRef, role_id: RoleId) -> AppResult<()> {
        self.require(
            actor,
            PolicyAction::Delete,
            PolicyResource::record(ResourceKind::Role, role_id),
        )
        .await?;

        let role = self.load_role(role_id).await?;
        self.repositories.roles.delete_role(role_id).await?;

        self.append_audit(
            actor,
            AuditAction::RoleDeleted,
            ResourceKind::Role,
            role_id.to_string(),
            format!("deleted role '{}' from guard '{}'", role.name(), role.guard()),
        )
        .await
    }

    /// Lists permissions owned by the role.
    pub async fn list_role_permissions(
        &self,
        actor: &SubjectRef,
        role_id: RoleId,
    ) -> AppResult<Vec<Permission>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Role, role_id),
        )
        .await?;

        self.load_role(role_id).await?;
        self.repositories.roles.list_role_permissions(role_id).await
    }

    /// Lists subjects directly assigned the role.
    pub async fn list_role_subjects(
        &self,
        actor: &SubjectRef,
        role_id: RoleId,
    ) -> AppResult<Vec<SubjectRef>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Role, role_id),
        )
        .await?;

        self.load_role(role_id).await?;
        self.repositories
            .roles
            .list_subjects_with_role(role_id)
            .await
    }

    /// Links one permission to a role; returns whether a link was created.
    pub async fn attach_permission(
        &self,
        actor: &SubjectRef,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.attach_permissions(actor, role_id, vec![permission_id])
            .await
            .map(|created| created > 0)
    }

    /// Links several permissions to a role; returns how many links were created.
    pub async fn attach_permissions(
        &self,
        actor: &SubjectRef,
        role_id: RoleId,
        permission_ids: Vec<PermissionId>,
    ) -> AppResult<usize> {
        self.require(
            actor,
            PolicyAction::Attach,
            PolicyResource::record(ResourceKind::Role, role_id),
        )
        .await?;

        let role = self.load_role(role_id).await?;
        let permission_ids = self.attachable_permissions(&role, &permission_ids).await?;
        let created = self
            .repositories
            .roles
            .attach_permissions(role_id, &permission_ids)
            .await?;

        if created > 0 {
            self.append_audit(
                actor,
                AuditAction::RolePermissionAttached,
                ResourceKind::Role,
                role_id.to_string(),
                format!(
                    "attached {created} permission(s) to role '{}'",
                    role.name()
                ),
            )
            .await?;
        }

        Ok(created)
    }

    /// Unlinks a permission from a role; returns whether a link was removed.
    pub async fn detach_permission(
        &self,
        actor: &SubjectRef,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.require(
            actor,
            PolicyAction::Detach,
            PolicyResource::record(ResourceKind::Role, role_id),
        )
        .await?;

        let role = self.load_role(role_id).await?;
        let removed = self
            .repositories
            .roles
            .detach_permission(role_id, permission_id)
            .await?;

        if removed {
            self.append_audit(
                actor,
                AuditAction::RolePermissionDetached,
                ResourceKind::Role,
                role_id.to_string(),
                format!(
                    "detached permission '{permission_id}' from role '{}'",
                    role.name()
                ),
            )
            .await?;
        }

        Ok(removed)
    }

    /// Replaces the role's permission set and returns the new set.
    pub async fn sync_role_permissions(
        &self,
        actor: &SubjectRef,
        role_id: RoleId,
        permission_ids: Vec<PermissionId>,
    ) -> AppResult<Vec<Permission>> {
        let resource = PolicyResource::record(ResourceKind::Role, role_id);
        self.require(actor, PolicyAction::Attach, resource.clone())
            .await?;
        self.require(actor, PolicyAction::Detach, resource).await?;

        let role = self.load_role(role_id).await?;
        let permission_ids = self.attachable_permissions(&role, &permission_ids).await?;
        self.repositories
            .roles
            .sync_permissions(role_id, &permission_ids)
            .await?;

        self.append_audit(
            actor,
            AuditAction::RolePermissionsSynced,
            ResourceKind::Role,
            role_id.to_string(),
            format!(
                "synced role '{}' to {} permission(s)",
                role.name(),
                permission_ids.len()
            ),
        )
        .await?;

        self.repositories.roles.list_role_permissions(role_id).await
    }

    pub(super) async fn load_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.repositories
            .roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    /// Deduplicates ids and checks that each permission exists in the role's guard.
    async fn attachable_permissions(
        &self,
        role: &Role,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<PermissionId>> {
        let mut seen = HashSet::new();
        let unique: Vec<PermissionId> = permission_ids
            .iter()
            .copied()
            .filter(|permission_id| seen.insert(*permission_id))
            .collect();

        if unique.is_empty() {
            return Ok(unique);
        }

        let permissions = self
            .repositories
            .permissions
            .find_permissions(&unique)
            .await?;

        let missing: Vec<String> = unique
            .iter()
            .filter(|permission_id| {
                !permissions
                    .iter()
                    .any(|permission| permission.id() == **permission_id)
            })
            .map(ToString::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "permission(s) {} do not exist",
                missing.join(", ")
            )));
        }

        for permission in &permissions {
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
