use super::*;

#[derive(Debug, serde::Deserialize)]
pub struct AuditLogParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub subject: Option<String>,
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<SubjectRef>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let entries = state
        .admin_service
        .list_audit_log(
            &actor,
            rolegate_application::AuditLogQuery {
                limit: params.limit.unwrap_or(50),
                offset: params.offset.unwrap_or(0),
                action: params.action,
                subject: params.subject,
            },
        )
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
