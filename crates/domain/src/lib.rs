//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod guard;
mod rbac;
mod security;

pub use guard::{GuardDefinition, GuardName, GuardRegistry, NAME_MAX_LENGTH};
pub use rbac::{
    Permission, PermissionChanges, PermissionId, Role, RoleChanges, RoleId, ensure_same_guard,
    normalize_display_name, validate_record_name,
};
pub use security::{AuditAction, PolicyAction, ResourceKind};
