use std::str::FromStr;

use rolegate_core::AppError;
use serde::{Deserialize, Serialize};

/// Administrative actions checked by the policy collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    /// Reads a record or lists a collection.
    View,
    /// Creates a record.
    Create,
    /// Updates a record.
    Update,
    /// Deletes a record.
    Delete,
    /// Links a permission to a role.
    Attach,
    /// Unlinks a permission from a role.
    Detach,
    /// Gives a role or permission to a subject.
    Assign,
    /// Takes a role or permission away from a subject.
    Revoke,
}

impl PolicyAction {
    /// Returns a stable transport value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Attach => "attach",
            Self::Detach => "detach",
            Self::Assign => "assign",
            Self::Revoke => "revoke",
        }
    }
}

impl FromStr for PolicyAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "attach" => Ok(Self::Attach),
            "detach" => Ok(Self::Detach),
            "assign" => Ok(Self::Assign),
            "revoke" => Ok(Self::Revoke),
            _ => Err(AppError::Validation(format!(
                "unknown policy action '{value}'"
            ))),
        }
    }
}

/// Resource families guarded by the policy collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Permission records.
    Permission,
    /// Role records and their permission links.
    Role,
    /// Subject assignments.
    Subject,
    /// Administrative audit trail.
    AuditLog,
}

impl ResourceKind {
    /// Returns the plural collection name used in permission names.
    #[must_use]
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Permission => "permissions",
            Self::Role => "roles",
            Self::Subject => "subjects",
            Self::AuditLog => "audit_log",
        }
    }

    /// Returns the permission name that grants `action` on this resource kind.
    #[must_use]
    pub fn permission_name(&self, action: PolicyAction) -> String {
        format!("{}.{}", self.collection(), action.as_str())
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission is updated.
    PermissionUpdated,
    /// Emitted when a permission is deleted.
    PermissionDeleted,
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is updated.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when permissions are linked to a role.
    RolePermissionAttached,
    /// Emitted when a permission is unlinked from a role.
    RolePermissionDetached,
    /// Emitted when a role's permission set is replaced.
    RolePermissionsSynced,
    /// Emitted when the set of roles owning a permission is replaced.
    PermissionRolesSynced,
    /// Emitted when a role is assigned to a subject.
    SubjectRoleAssigned,
    /// Emitted when a role is revoked from a subject.
    SubjectRoleRevoked,
    /// Emitted when a permission is assigned to a subject.
    SubjectPermissionAssigned,
    /// Emitted when a permission is revoked from a subject.
    SubjectPermissionRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionCreated => "rbac.permission.created",
            Self::PermissionUpdated => "rbac.permission.updated",
            Self::PermissionDeleted => "rbac.permission.deleted",
            Self::RoleCreated => "rbac.role.created",
            Self::RoleUpdated => "rbac.role.updated",
            Self::RoleDeleted => "rbac.role.deleted",
            Self::RolePermissionAttached => "rbac.role.permission_attached",
            Self::RolePermissionDetached => "rbac.role.permission_detached",
            Self::RolePermissionsSynced => "rbac.role.permissions_synced",
            Self::PermissionRolesSynced => "rbac.permission.roles_synced",
            Self::SubjectRoleAssigned => "rbac.subject.role_assigned",
            Self::SubjectRoleRevoked => "rbac.subject.role_revoked",
            Self::SubjectPermissionAssigned => "rbac.subject.permission_assigned",
            Self::SubjectPermissionRevoked => "rbac.subject.permission_revoked",
        }
    }
}
