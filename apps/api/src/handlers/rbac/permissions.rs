use super::*;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Query(params): Query<RecordListParams>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .admin_service
        .list_permissions(&actor, params.into_query()?)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .admin_service
        .create_permission(&actor, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(permission))))
}

pub async fn get_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(permission_id): Path<String>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission = state
        .admin_service
        .get_permission(&actor, permission_id.parse()?)
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn update_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(permission_id): Path<String>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission = state
        .admin_service
        .update_permission(&actor, permission_id.parse()?, payload.into())
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(permission_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .admin_service
        .delete_permission(&actor, permission_id.parse()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_permission_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(permission_id): Path<String>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .admin_service
        .list_permission_roles(&actor, permission_id.parse()?)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn sync_permission_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(permission_id): Path<String>,
    Json(payload): Json<PermissionRolesRequest>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .admin_service
        .sync_permission_roles(
            &actor,
            permission_id.parse()?,
            parse_role_ids(&payload.role_ids)?,
        )
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn list_permission_subjects_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(permission_id): Path<String>,
) -> ApiResult<Json<Vec<SubjectResponse>>> {
    let subjects = state
        .admin_service
        .list_permission_subjects(&actor, permission_id.parse()?)
        .await?
        .into_iter()
        .map(SubjectResponse::from)
        .collect();

    Ok(Json(subjects))
}
