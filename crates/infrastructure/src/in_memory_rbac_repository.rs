use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use rolegate_application::{
    AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, AuthorizationRepository, MAX_LIST_LIMIT, PermissionRepository,
    RecordListQuery, RoleRepository,
};
use rolegate_core::{AppError, AppResult, SubjectRef};
use rolegate_domain::{GuardName, Permission, PermissionId, Role, RoleId, ensure_same_guard};

mod assignments;
mod permissions;
mod roles;

/// In-memory repository implementing every storage port.
///
/// All tables sit behind one lock so that multi-record writes and cascades
/// are observed atomically by concurrent readers.
#[derive(Debug, Default)]
pub struct InMemoryRbacRepository {
    state: RwLock<RbacState>,
}

#[derive(Debug, Default)]
struct RbacState {
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, Role>,
    role_permissions: BTreeSet<(RoleId, PermissionId)>,
    subject_roles: BTreeSet<(SubjectRef, RoleId)>,
    subject_permissions: BTreeSet<(SubjectRef, PermissionId)>,
    audit_entries: Vec<AuditLogEntry>,
}

impl InMemoryRbacRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RbacState {
    fn permission(&self, permission_id: PermissionId) -> AppResult<&Permission> {
        self.permissions.get(&permission_id).ok_or_else(|| {
            AppError::NotFound(format!("permission '{permission_id}' does not exist"))
        })
    }

    fn role(&self, role_id: RoleId) -> AppResult<&Role> {
        self.roles
            .get(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    /// Validates that every permission exists in the stored role's guard.
    fn ensure_attachable(&self, role_id: RoleId, permission_ids: &[PermissionId]) -> AppResult<()> {
        self.ensure_permissions_in_guard(self.role(role_id)?, permission_ids)
    }

    fn ensure_permissions_in_guard(
        &self,
        role: &Role,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        for permission_id in permission_ids {
            let permission = self.permission(*permission_id)?;
            ensure_same_guard(
                format!("role '{}'", role.name()).as_str(),
                role.guard(),
                format!("permission '{}'", permission.name()).as_str(),
                permission.guard(),
            )?;
        }

        Ok(())
    }

    fn subject_permission_ids<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> impl Iterator<Item = PermissionId> + 'a {
        let direct = self
            .subject_permissions
            .iter()
            .filter(move |(stored_subject, _)| stored_subject == subject)
            .map(|(_, permission_id)| *permission_id);

        let via_roles = self
            .subject_roles
            .iter()
            .filter(move |(stored_subject, _)| stored_subject == subject)
            .flat_map(move |(_, role_id)| {
                self.role_permissions
                    .iter()
                    .filter(move |(stored_role_id, _)| stored_role_id == role_id)
                    .map(|(_, permission_id)| *permission_id)
            });

        direct.chain(via_roles)
    }
}

fn sort_permissions(mut permissions: Vec<Permission>) -> Vec<Permission> {
    permissions.sort_by(|left, right| {
        left.name()
            .cmp(right.name())
            .then_with(|| left.guard().cmp(right.guard()))
    });
    permissions
}

fn sort_roles(mut roles: Vec<Role>) -> Vec<Role> {
    roles.sort_by(|left, right| {
        left.name()
            .cmp(right.name())
            .then_with(|| left.guard().cmp(right.guard()))
    });
    roles
}

fn page<T>(values: Vec<T>, query: &RecordListQuery) -> Vec<T> {
    values
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect()
}

#[async_trait]
impl AuthorizationRepository for InMemoryRbacRepository {
    async fn subject_has_permission(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        permission_name: &str,
    ) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .subject_permission_ids(subject)
            .filter_map(|permission_id| state.permissions.get(&permission_id))
            .any(|permission| {
                permission.guard() == guard && permission.name() == permission_name
            }))
    }

    async fn subject_has_role(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        role_name: &str,
    ) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .subject_roles
            .iter()
            .filter(|(stored_subject, _)| stored_subject == subject)
            .filter_map(|(_, role_id)| state.roles.get(role_id))
            .any(|role| role.guard() == guard && role.name() == role_name))
    }

    async fn list_effective_permissions(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
    ) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;
        let permission_ids: BTreeSet<PermissionId> =
            state.subject_permission_ids(subject).collect();

        Ok(sort_permissions(
            permission_ids
                .into_iter()
                .filter_map(|permission_id| state.permissions.get(&permission_id))
                .filter(|permission| permission.guard() == guard)
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl AuditRepository for InMemoryRbacRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.state.write().await.audit_entries.push(AuditLogEntry {
            event_id: Uuid::new_v4().to_string(),
            subject: event.subject,
            action: event.action.as_str().to_owned(),
            resource_type: event.resource_type,
            resource_id: event.resource_id,
            detail: event.detail,
            created_at: Utc::now(),
        });

        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryRbacRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit_entries
            .iter()
            .rev()
            .filter(|entry| {
                query
                    .action
                    .as_deref()
                    .is_none_or(|action| entry.action == action)
                    && query
                        .subject
                        .as_deref()
                        .is_none_or(|subject| entry.subject == subject)
            })
            .skip(query.offset)
            .take(query.limit.clamp(1, MAX_LIST_LIMIT))
            .cloned()
            .collect())
    }
}
