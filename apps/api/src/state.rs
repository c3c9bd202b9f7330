use std::sync::Arc;

use rolegate_application::{AuthorizationQueryService, RbacAdminService};
use rolegate_domain::GuardRegistry;
use sqlx::PgPool;

use crate::api_config::StorageBackend;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub admin_service: RbacAdminService,
    pub query_service: AuthorizationQueryService,
    pub guard_registry: Arc<GuardRegistry>,
    pub storage_backend: StorageBackend,
    pub database_pool: Option<PgPool>,
}
