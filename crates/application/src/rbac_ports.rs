mod audit;
mod policy;
mod queries;
mod repositories;

pub use audit::{AuditEvent, AuditLogEntry, AuditLogQuery};
pub use policy::{PolicyCheck, PolicyResource};
pub use queries::{MAX_LIST_LIMIT, RecordListQuery};
pub use repositories::{
    AssignmentRepository, AuditLogRepository, AuditRepository, AuthorizationRepository,
    PermissionRepository, RbacRepositories, RoleRepository,
};
