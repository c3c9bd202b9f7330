use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
    /// Present when the storage check failed.
    pub detail: Option<String>,
}

/// Result of an idempotent link or unlink call.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/link-change-response.ts"
)]
pub struct LinkChangeResponse {
    /// Whether stored state changed.
    pub changed: bool,
}

/// Answer to a `can` or `has-role` query.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/authorization-check-response.ts"
)]
pub struct AuthorizationCheckResponse {
    pub allowed: bool,
}
