use std::sync::Arc;

use rolegate_application::{AuthorizationQueryService, RbacAdminService};
use rolegate_core::AppError;
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod policy;
mod repositories;

/// Wires repositories, the policy collaborator and services for the configured backend.
pub fn build_app_state(pool: Option<PgPool>, config: &ApiConfig) -> Result<AppState, AppError> {
    let guard_registry = Arc::new(config.guard_registry.clone());
    let repositories = repositories::build_repository_set(config.storage_backend, pool.clone())?;

    let query_service = AuthorizationQueryService::new(
        guard_registry.clone(),
        repositories.authorization_repository.clone(),
    );
    let policy_check = policy::build_policy_check(config, query_service.clone());

    info!(
        storage_backend = config.storage_backend.as_str(),
        policy_mode = config.policy_mode.as_str(),
        guards = guard_registry.guards().len(),
        "application state ready"
    );

    Ok(AppState {
        admin_service: RbacAdminService::new(
            guard_registry.clone(),
            policy_check,
            repositories.rbac_repositories,
            query_service.clone(),
        ),
        query_service,
        guard_registry,
        storage_backend: config.storage_backend,
        database_pool: pool,
    })
}
