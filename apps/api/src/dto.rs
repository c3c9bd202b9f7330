mod audit;
mod common;
mod guards;
mod permissions;
mod roles;
mod subjects;

pub use audit::AuditLogEntryResponse;
pub use common::{AuthorizationCheckResponse, HealthResponse, LinkChangeResponse};
pub use guards::GuardResponse;
pub use permissions::{
    CreatePermissionRequest, PermissionResponse, PermissionRolesRequest, UpdatePermissionRequest,
};
pub use roles::{
    AttachPermissionsResponse, CreateRoleRequest, RolePermissionsRequest, RoleResponse,
    UpdateRoleRequest,
};
pub use subjects::SubjectResponse;
