use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use rolegate_application::{CreateRoleInput, RecordListQuery, UpdateRoleInput};
use rolegate_core::{AppResult, SubjectRef};
use rolegate_domain::{GuardName, PermissionId, RoleId};

use crate::dto::{
    AttachPermissionsResponse, AuditLogEntryResponse, AuthorizationCheckResponse,
    CreatePermissionRequest, CreateRoleRequest, GuardResponse, LinkChangeResponse,
    PermissionResponse, PermissionRolesRequest, RolePermissionsRequest, RoleResponse,
    SubjectResponse, UpdatePermissionRequest, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod audit;
mod guards;
mod permissions;
mod roles;
mod subjects;

pub use audit::list_audit_log_handler;
pub use guards::{
    find_permission_by_name_handler, find_role_by_name_handler, list_guards_handler,
};
pub use permissions::{
    create_permission_handler, delete_permission_handler, get_permission_handler,
    list_permission_roles_handler, list_permission_subjects_handler, list_permissions_handler,
    sync_permission_roles_handler, update_permission_handler,
};
pub use roles::{
    attach_permission_handler, attach_permissions_handler, create_role_handler,
    delete_role_handler, detach_permission_handler, get_role_handler,
    list_role_permissions_handler, list_role_subjects_handler, list_roles_handler,
    sync_role_permissions_handler, update_role_handler,
};
pub use subjects::{
    assign_permission_handler, assign_role_handler, check_permission_handler,
    check_role_handler, list_subject_permissions_handler, list_subject_roles_handler,
    revoke_permission_handler, revoke_role_handler,
};

/// Filter and pagination parameters shared by role and permission listings.
#[derive(Debug, serde::Deserialize)]
pub struct RecordListParams {
    pub guard: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RecordListParams {
    fn into_query(self) -> AppResult<RecordListQuery> {
        let defaults = RecordListQuery::default();

        Ok(RecordListQuery {
            guard: self.guard.map(GuardName::new).transpose()?,
            search: self.search,
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
        })
    }
}

/// Optional guard override for authorization checks.
#[derive(Debug, serde::Deserialize)]
pub struct GuardParams {
    pub guard: Option<String>,
}

fn parse_permission_ids(values: &[String]) -> AppResult<Vec<PermissionId>> {
    values.iter().map(|value| value.parse()).collect()
}

fn parse_role_ids(values: &[String]) -> AppResult<Vec<RoleId>> {
    values.iter().map(|value| value.parse()).collect()
}

fn subject_from_path(subject_type: &str, subject_id: &str) -> AppResult<SubjectRef> {
    SubjectRef::new(subject_type, subject_id)
}
