use super::*;

use rolegate_domain::{Permission, PermissionId, Role, RoleId, ensure_same_guard};

impl RbacAdminService {
    /// Assigns a role to a subject; returns whether the assignment is new.
    pub async fn assign_role(
        &self,
        actor: &SubjectRef,
        subject: &SubjectRef,
        role_id: RoleId,
    ) -> AppResult<bool> {
        self.require(
            actor,
            PolicyAction::Assign,
            PolicyResource::record(ResourceKind::Subject, subject),
        )
        .await?;

        let guard = self.registry.resolve_guard_for(subject.subject_type())?;
        let role = self.load_role(role_id).await?;
        ensure_same_guard(
            format!("subject '{subject}'").as_str(),
            guard,
            format!("role '{}'", role.name()).as_str(),
            role.guard(),
        )?;

        let created = self
            .repositories
            .assignments
            .assign_role(subject, guard, role_id)
            .await?;

        if created {
            self.append_audit(
                actor,
                AuditAction::SubjectRoleAssigned,
                ResourceKind::Subject,
                subject.to_string(),
                format!("assigned role '{}' to '{subject}'", role.name()),
            )
            .await?;
        }

        Ok(created)
    }

    /// Revokes a role from a subject; returns whether an assignment was removed.
    pub async fn revoke_role(
        &self,
        actor: &SubjectRef,
        subject: &SubjectRef,
        role_id: RoleId,
    ) -> AppResult<bool> {
        self.require(
            actor,
            PolicyAction::Revoke,
            PolicyResource::record(ResourceKind::Subject, subject),
        )
        .await?;

        let removed = self
            .repositories
            .assignments
            .revoke_role(subject, role_id)
            .await?;

        if removed {
            self.append_audit(
                actor,
                AuditAction::SubjectRoleRevoked,
                ResourceKind::Subject,
                subject.to_string(),
                format!("revoked role '{role_id}' from '{subject}'"),
            )
            .await?;
        }

        Ok(removed)
    }

    /// Assigns a permission directly to a subject; returns whether the assignment is new.
    pub async fn assign_permission(
        &self,
        actor: &SubjectRef,
        subject: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.require(
            actor,
            PolicyAction::Assign,
            PolicyResource::record(ResourceKind::Subject, subject),
        )
        .await?;

        let guard = self.registry.resolve_guard_for(subject.subject_type())?;
        let permission = self.load_permission(permission_id).await?;
        ensure_same_guard(
            format!("subject '{subject}'").as_str(),
            guard,
            format!("permission '{}'", permission.name()).as_str(),
            permission.guard(),
        )?;

        let created = self
            .repositories
            .assignments
            .assign_permission(subject, guard, permission_id)
            .await?;

        if created {
            self.append_audit(
                actor,
                AuditAction::SubjectPermissionAssigned,
                ResourceKind::Subject,
                subject.to_string(),
                format!(
                    "assigned permission '{}' to '{subject}'",
                    permission.name()
                ),
            )
            .await?;
        }

        Ok(created)
    }

    /// Revokes a direct permission from a subject; returns whether an assignment was removed.
    pub async fn revoke_permission(
        &self,
        actor: &SubjectRef,
        subject: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.require(
            actor,
            PolicyAction::Revoke,
            PolicyResource::record(ResourceKind::Subject, subject),
        )
        .await?;

        let removed = self
            .repositories
            .assignments
            .revoke_permission(subject, permission_id)
            .await?;

        if removed {
            self.append_audit(
                actor,
                AuditAction::SubjectPermissionRevoked,
                ResourceKind::Subject,
                subject.to_string(),
                format!("revoked permission '{permission_id}' from '{subject}'"),
            )
            .await?;
        }

        Ok(removed)
    }

    /// Lists roles directly assigned to a subject.
    pub async fn list_subject_roles(
        &self,
        actor: &SubjectRef,
        subject: &SubjectRef,
    ) -> AppResult<Vec<Role>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Subject, subject),
        )
        .await?;

        self.repositories
            .assignments
            .list_subject_roles(subject)
            .await
    }

    /// Lists permissions directly assigned to a subject.
    pub async fn list_subject_direct_permissions(
        &self,
        actor: &SubjectRef,
        subject: &SubjectRef,
    ) -> AppResult<Vec<Permission>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Subject, subject),
        )
        .await?;

        self.repositories
            .assignments
            .list_subject_direct_permissions(subject)
            .await
    }

    /// Lists direct and role-derived permissions of a subject in its guard.
    pub async fn list_subject_effective_permissions(
        &self,
        actor: &SubjectRef,
        subject: &SubjectRef,
    ) -> AppResult<Vec<Permission>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::record(ResourceKind::Subject, subject),
        )
        .await?;

        self.query_service.effective_permissions(subject).await
    }
}
