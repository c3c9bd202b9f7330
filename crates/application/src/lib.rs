//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_query_service;
mod rbac_admin_service;
mod rbac_policy_check;
mod rbac_ports;

pub use authorization_query_service::AuthorizationQueryService;
pub use rbac_admin_service::{
    CreatePermissionInput, CreateRoleInput, RbacAdminService, UpdatePermissionInput,
    UpdateRoleInput,
};
pub use rbac_policy_check::RbacPolicyCheck;
pub use rbac_ports::{
    AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, AuthorizationRepository, MAX_LIST_LIMIT, PermissionRepository, PolicyCheck,
    PolicyResource, RbacRepositories, RecordListQuery, RoleRepository,
};
