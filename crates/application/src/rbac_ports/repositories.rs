use std::sync::Arc;

use async_trait::async_trait;

use rolegate_core::{AppResult, SubjectRef};
use rolegate_domain::{GuardName, Permission, PermissionId, Role, RoleId};

use super::audit::{AuditEvent, AuditLogEntry, AuditLogQuery};
use super::queries::RecordListQuery;

/// Repository port for permission records.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Persists a new permission; fails `DuplicateName` when `(name, guard)` exists.
    async fn insert_permission(&self, permission: Permission) -> AppResult<()>;

    /// Replaces a stored permission.
    ///
    /// Fails `NotFound` for unknown ids, `DuplicateName` on a colliding rename and
    /// `GuardMismatch` when the guard changes while the permission is still linked.
    async fn update_permission(&self, permission: Permission) -> AppResult<()>;

    /// Deletes a permission together with every role link and subject assignment.
    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()>;

    /// Finds a permission by id.
    async fn find_permission(&self, permission_id: PermissionId)
    -> AppResult<Option<Permission>>;

    /// Finds a permission by its unique name within a guard.
    async fn find_permission_by_name(
        &self,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<Option<Permission>>;

    /// Loads every existing permission among the given ids.
    async fn find_permissions(&self, permission_ids: &[PermissionId])
    -> AppResult<Vec<Permission>>;

    /// Lists permissions ordered by name then guard.
    async fn list_permissions(&self, query: RecordListQuery) -> AppResult<Vec<Permission>>;

    /// Lists roles that own the permission.
    async fn list_roles_with_permission(&self, permission_id: PermissionId)
    -> AppResult<Vec<Role>>;

    /// Replaces the set of roles owning the permission in one step.
    ///
    /// Fails `NotFound` for a missing permission or role and `GuardMismatch`
    /// when a role lives in another guard; links are untouched on failure.
    async fn sync_permission_roles(
        &self,
        permission_id: PermissionId,
        role_ids: &[RoleId],
    ) -> AppResult<()>;

    /// Lists subjects holding the permission directly.
    async fn list_subjects_with_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Vec<SubjectRef>>;
}

/// Repository port for role records and role-permission links.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role together with its initial permission links.
    ///
    /// Fails `DuplicateName` when `(name, guard)` exists, `NotFound` for a missing
    /// permission and `GuardMismatch` for one in another guard. Nothing is stored
    /// unless the role and every link are written.
    async fn insert_role(&self, role: Role, permission_ids: &[PermissionId]) -> AppResult<()>;

    /// Replaces a stored role with the same failure modes as permission updates.
    async fn update_role(&self, role: Role) -> AppResult<()>;

    /// Deletes a role together with its permission links and subject assignments.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Finds a role by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by its unique name within a guard.
    async fn find_role_by_name(&self, name: &str, guard: &GuardName) -> AppResult<Option<Role>>;

    /// Lists roles ordered by name then guard.
    async fn list_roles(&self, query: RecordListQuery) -> AppResult<Vec<Role>>;

    /// Links permissions to a role, skipping existing links.
    ///
    /// Returns how many links were created. Fails `GuardMismatch` if any
    /// permission no longer shares the role's guard.
    async fn attach_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<usize>;

    /// Removes one link; returns whether a link existed.
    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool>;

    /// Replaces the role's permission set in one transaction.
    async fn sync_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()>;

    /// Lists permissions owned by the role, ordered by name.
    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;

    /// Lists subjects directly assigned the role.
    async fn list_subjects_with_role(&self, role_id: RoleId) -> AppResult<Vec<SubjectRef>>;
}

/// Repository port for subject assignments.
///
/// Assign operations receive the subject's resolved guard and must refuse to
/// link a target that lives in another guard.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Assigns a role; returns `false` when the assignment already existed.
    async fn assign_role(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        role_id: RoleId,
    ) -> AppResult<bool>;

    /// Assigns a permission directly; returns `false` when it already existed.
    async fn assign_permission(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        permission_id: PermissionId,
    ) -> AppResult<bool>;

    /// Revokes a role; returns whether an assignment was removed.
    async fn revoke_role(&self, subject: &SubjectRef, role_id: RoleId) -> AppResult<bool>;

    /// Revokes a direct permission; returns whether an assignment was removed.
    async fn revoke_permission(
        &self,
        subject: &SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<bool>;

    /// Lists roles directly assigned to the subject.
    async fn list_subject_roles(&self, subject: &SubjectRef) -> AppResult<Vec<Role>>;

    /// Lists permissions directly assigned to the subject.
    async fn list_subject_direct_permissions(
        &self,
        subject: &SubjectRef,
    ) -> AppResult<Vec<Permission>>;
}

/// Repository port for guard-exact authorization lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Returns whether the subject holds the named permission in the guard,
    /// directly or through any assigned role.
    async fn subject_has_permission(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        permission_name: &str,
    ) -> AppResult<bool>;

    /// Returns whether the subject is assigned the named role in the guard.
    async fn subject_has_role(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        role_name: &str,
    ) -> AppResult<bool>;

    /// Lists direct and role-derived permissions in the guard, deduplicated.
    async fn list_effective_permissions(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
    ) -> AppResult<Vec<Permission>>;
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Repository port for reading audit logs.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists most recent audit entries.
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;
}

/// Storage ports required by the administrative service.
#[derive(Clone)]
pub struct RbacRepositories {
    /// Permission store.
    pub permissions: Arc<dyn PermissionRepository>,
    /// Role store.
    pub roles: Arc<dyn RoleRepository>,
    /// Assignment index.
    pub assignments: Arc<dyn AssignmentRepository>,
    /// Audit sink.
    pub audit: Arc<dyn AuditRepository>,
    /// Audit reader.
    pub audit_log: Arc<dyn AuditLogRepository>,
}

impl RbacRepositories {
    /// Uses one backend for every port.
    #[must_use]
    pub fn from_backend<T>(backend: Arc<T>) -> Self
    where
        T: PermissionRepository
            + RoleRepository
            + AssignmentRepository
            + AuditRepository
            + AuditLogRepository
            + 'static,
    {
        Self {
            permissions: backend.clone(),
            roles: backend.clone(),
            assignments: backend.clone(),
            audit: backend.clone(),
            audit_log: backend,
        }
    }
}
