use super::*;

/// Selects which permission set a subject listing returns.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Direct and role-derived permissions in the subject's guard.
    #[default]
    Effective,
    /// Only permissions assigned to the subject itself.
    Direct,
}

#[derive(Debug, serde::Deserialize)]
pub struct SubjectPermissionParams {
    #[serde(default)]
    pub scope: PermissionScope,
}

pub async fn list_subject_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((subject_type, subject_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    let roles = state
        .admin_service
        .list_subject_roles(&actor, &subject)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((subject_type, subject_id, role_id)): Path<(String, String, String)>,
) -> ApiResult<Json<LinkChangeResponse>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    let role_id: RoleId = role_id.parse()?;
    let changed = state
        .admin_service
        .assign_role(&actor, &subject, role_id)
        .await?;

    Ok(Json(LinkChangeResponse { changed }))
}

pub async fn revoke_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((subject_type, subject_id, role_id)): Path<(String, String, String)>,
) -> ApiResult<Json<LinkChangeResponse>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    let role_id: RoleId = role_id.parse()?;
    let changed = state
        .admin_service
        .revoke_role(&actor, &subject, role_id)
        .await?;

    Ok(Json(LinkChangeResponse { changed }))
}

pub async fn list_subject_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((subject_type, subject_id)): Path<(String, String)>,
    Query(params): Query<SubjectPermissionParams>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    let permissions = match params.scope {
        PermissionScope::Effective => {
            state
                .admin_service
                .list_subject_effective_permissions(&actor, &subject)
                .await?
        }
        PermissionScope::Direct => {
            state
                .admin_service
                .list_subject_direct_permissions(&actor, &subject)
                .await?
        }
    };

    Ok(Json(
        permissions
            .into_iter()
            .map(PermissionResponse::from)
            .collect(),
    ))
}

pub async fn assign_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((subject_type, subject_id, permission_id)): Path<(String, String, String)>,
) -> ApiResult<Json<LinkChangeResponse>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    let permission_id: PermissionId = permission_id.parse()?;
    let changed = state
        .admin_service
        .assign_permission(&actor, &subject, permission_id)
        .await?;

    Ok(Json(LinkChangeResponse { changed }))
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Path((subject_type, subject_id, permission_id)): Path<(String, String, String)>,
) -> ApiResult<Json<LinkChangeResponse>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    let permission_id: PermissionId = permission_id.parse()?;
    let changed = state
        .admin_service
        .revoke_permission(&actor, &subject, permission_id)
        .await?;

    Ok(Json(LinkChangeResponse { changed }))
}

/// Answers whether the subject holds a permission; never consults the admin policy.
pub async fn check_permission_handler(
    State(state): State<AppState>,
    Path((subject_type, subject_id, permission_name)): Path<(String, String, String)>,
    Query(params): Query<GuardParams>,
) -> ApiResult<Json<AuthorizationCheckResponse>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    // A guard that cannot be named holds no records.
    let Ok(guard) = params.guard.map(GuardName::new).transpose() else {
        return Ok(Json(AuthorizationCheckResponse { allowed: false }));
    };
    let allowed = state
        .query_service
        .has_permission(&subject, permission_name.as_str(), guard.as_ref())
        .await?;

    Ok(Json(AuthorizationCheckResponse { allowed }))
}

pub async fn check_role_handler(
    State(state): State<AppState>,
    Path((subject_type, subject_id, role_name)): Path<(String, String, String)>,
    Query(params): Query<GuardParams>,
) -> ApiResult<Json<AuthorizationCheckResponse>> {
    let subject = subject_from_path(&subject_type, &subject_id)?;
    // A guard that cannot be named holds no records.
    let Ok(guard) = params.guard.map(GuardName::new).transpose() else {
        return Ok(Json(AuthorizationCheckResponse { allowed: false }));
    };
    let allowed = state
        .query_service
        .has_role(&subject, role_name.as_str(), guard.as_ref())
        .await?;

    Ok(Json(AuthorizationCheckResponse { allowed }))
}
