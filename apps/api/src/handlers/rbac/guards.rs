use super::*;

pub async fn list_guards_handler(State(state): State<AppState>) -> Json<Vec<GuardResponse>> {
    let default_guard = state.guard_registry.default_guard();
    let guards = state
        .guard_registry
        .guards()
        .iter()
        .map(|definition| GuardResponse::from_definition(definition, default_guard))
        .collect();

    Json(guards)
}

pub async fn find_permission_by_name_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((guard, name)): Path<(String, String)>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission = state
        .admin_service
        .find_permission_by_name(&actor, name.as_str(), guard.as_str())
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn find_role_by_name_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((guard, name)): Path<(String, String)>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .admin_service
        .find_role_by_name(&actor, name.as_str(), guard.as_str())
        .await?;

    Ok(Json(RoleResponse::from(role)))
}
