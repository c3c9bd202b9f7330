use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = state.storage_backend.as_str();
    let Some(pool) = state.database_pool else {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                storage,
                detail: None,
            }),
        );
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                storage,
                detail: None,
            }),
        ),
        Err(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "error",
                storage,
                detail: Some(format!("postgres check failed: {error}")),
            }),
        ),
    }
}
