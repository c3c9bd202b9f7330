use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Query(params): Query<RecordListParams>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .admin_service
        .list_roles(&actor, params.into_query()?)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let permission_ids = parse_permission_ids(&payload.permission_ids)?;

    let role = state
        .admin_service
        .create_role(
            &actor,
            CreateRoleInput {
                name: payload.name,
                guard: payload.guard,
                permission_ids,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.admin_service.get_role(&actor, role_id.parse()?).await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .admin_service
        .update_role(
            &actor,
            role_id.parse()?,
            UpdateRoleInput {
                name: payload.name,
                guard: payload.guard,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .admin_service
        .delete_role(&actor, role_id.parse()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .admin_service
        .list_role_permissions(&actor, role_id.parse()?)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn list_role_subjects_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<Vec<SubjectResponse>>> {
    let subjects = state
        .admin_service
        .list_role_subjects(&actor, role_id.parse()?)
        .await?
        .into_iter()
        .map(SubjectResponse::from)
        .collect();

    Ok(Json(subjects))
}

pub async fn attach_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(role_id): Path<String>,
    Json(payload): Json<RolePermissionsRequest>,
) -> ApiResult<Json<AttachPermissionsResponse>> {
    let created = state
        .admin_service
        .attach_permissions(
            &actor,
            role_id.parse()?,
            parse_permission_ids(&payload.permission_ids)?,
        )
        .await?;

    Ok(Json(AttachPermissionsResponse { created }))
}

pub async fn sync_role_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path(role_id): Path<String>,
    Json(payload): Json<RolePermissionsRequest>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .admin_service
        .sync_role_permissions(
            &actor,
            role_id.parse()?,
            parse_permission_ids(&payload.permission_ids)?,
        )
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn attach_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((role_id, permission_id)): Path<(String, String)>,
) -> ApiResult<Json<LinkChangeResponse>> {
    let changed = state
        .admin_service
        .attach_permission(&actor, role_id.parse()?, permission_id.parse()?)
        .await?;

    Ok(Json(LinkChangeResponse { changed }))
}

pub async fn detach_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((role_id, permission_id)): Path<(String, String)>,
) -> ApiResult<Json<LinkChangeResponse>> {
    let changed = state
        .admin_service
        .detach_permission(&actor, role_id.parse()?, permission_id.parse()?)
        .await?;

    Ok(Json(LinkChangeResponse { changed }))
}
