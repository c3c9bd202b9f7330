use rolegate_domain::Role;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    /// Defaults to the configured default guard.
    pub guard: Option<String>,
    /// Permissions attached right after creation; all must share the role's guard.
    #[serde(default)]
    pub permission_ids: Vec<String>,
}

/// Incoming payload for partial role updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub guard: Option<String>,
}

/// Permission ids for bulk attach and sync.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-permissions-request.ts"
)]
pub struct RolePermissionsRequest {
    pub permission_ids: Vec<String>,
}

/// Result of a bulk attach.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/attach-permissions-response.ts"
)]
pub struct AttachPermissionsResponse {
    /// Links that did not exist before the call.
    pub created: usize,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub guard: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id().to_string(),
            name: role.name().to_owned(),
            guard: role.guard().as_str().to_owned(),
            created_at: role.created_at().to_rfc3339(),
            updated_at: role.updated_at().to_rfc3339(),
        }
    }
}
