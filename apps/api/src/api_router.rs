use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use rolegate_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, rbac};
use crate::middleware;
use crate::state::AppState;

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/guards/{guard}/permissions/{name}",
            get(rbac::find_permission_by_name_handler),
        )
        .route(
            "/api/guards/{guard}/roles/{name}",
            get(rbac::find_role_by_name_handler),
        )
        .route(
            "/api/permissions",
            get(rbac::list_permissions_handler).post(rbac::create_permission_handler),
        )
        .route(
            "/api/permissions/{permission_id}",
            get(rbac::get_permission_handler)
                .patch(rbac::update_permission_handler)
                .delete(rbac::delete_permission_handler),
        )
        .route(
            "/api/permissions/{permission_id}/roles",
            get(rbac::list_permission_roles_handler).put(rbac::sync_permission_roles_handler),
        )
        .route(
            "/api/permissions/{permission_id}/subjects",
            get(rbac::list_permission_subjects_handler),
        )
        .route(
            "/api/roles",
            get(rbac::list_roles_handler).post(rbac::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(rbac::get_role_handler)
                .patch(rbac::update_role_handler)
                .delete(rbac::delete_role_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            get(rbac::list_role_permissions_handler)
                .put(rbac::sync_role_permissions_handler)
                .post(rbac::attach_permissions_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions/{permission_id}",
            post(rbac::attach_permission_handler).delete(rbac::detach_permission_handler),
        )
        .route(
            "/api/roles/{role_id}/subjects",
            get(rbac::list_role_subjects_handler),
        )
        .route(
            "/api/subjects/{subject_type}/{subject_id}/roles",
            get(rbac::list_subject_roles_handler),
        )
        .route(
            "/api/subjects/{subject_type}/{subject_id}/roles/{role_id}",
            post(rbac::assign_role_handler).delete(rbac::revoke_role_handler),
        )
        .route(
            "/api/subjects/{subject_type}/{subject_id}/permissions",
            get(rbac::list_subject_permissions_handler),
        )
        .route(
            "/api/subjects/{subject_type}/{subject_id}/permissions/{permission_id}",
            post(rbac::assign_permission_handler).delete(rbac::revoke_permission_handler),
        )
        .route(
            "/api/subjects/{subject_type}/{subject_id}/can/{permission_name}",
            get(rbac::check_permission_handler),
        )
        .route(
            "/api/subjects/{subject_type}/{subject_id}/has-role/{role_name}",
            get(rbac::check_role_handler),
        )
        .route("/api/audit-log", get(rbac::list_audit_log_handler))
        .route_layer(from_fn(middleware::require_actor));

    Ok(Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/guards", get(rbac::list_guards_handler))
        .merge(protected_routes)
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}

#[cfg(test)]
mod tests;
