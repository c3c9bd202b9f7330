use rolegate_application::{CreatePermissionInput, UpdatePermissionInput};
use rolegate_domain::Permission;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub name: String,
    /// Defaults to the configured default guard.
    pub guard: Option<String>,
    pub display_name: Option<String>,
}

/// Incoming payload for partial permission updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-permission-request.ts"
)]
pub struct UpdatePermissionRequest {
    pub name: Option<String>,
    pub guard: Option<String>,
    /// Omit to keep the display name, send `null` to clear it.
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(optional)]
    pub display_name: Option<Option<String>>,
}

/// Role ids that should own a permission after a sync.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-roles-request.ts"
)]
pub struct PermissionRolesRequest {
    pub role_ids: Vec<String>,
}

/// API representation of a permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub id: String,
    pub name: String,
    pub guard: String,
    pub display_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<CreatePermissionRequest> for CreatePermissionInput {
    fn from(value: CreatePermissionRequest) -> Self {
        Self {
            name: value.name,
            guard: value.guard,
            display_name: value.display_name,
        }
    }
}

impl From<UpdatePermissionRequest> for UpdatePermissionInput {
    fn from(value: UpdatePermissionRequest) -> Self {
        Self {
            name: value.name,
            guard: value.guard,
            display_name: value.display_name,
        }
    }
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id().to_string(),
            name: permission.name().to_owned(),
            guard: permission.guard().as_str().to_owned(),
            display_name: permission.display_name().map(ToOwned::to_owned),
            created_at: permission.created_at().to_rfc3339(),
            updated_at: permission.updated_at().to_rfc3339(),
        }
    }
}
