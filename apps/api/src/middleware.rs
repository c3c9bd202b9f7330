use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use rolegate_core::{AppError, SubjectRef};

use crate::error::ApiResult;

pub const SUBJECT_TYPE_HEADER: &str = "x-subject-type";
pub const SUBJECT_ID_HEADER: &str = "x-subject-id";

/// Resolves the calling subject from headers set by the authenticating edge.
pub async fn require_actor(mut request: Request, next: Next) -> ApiResult<Response> {
    let actor = actor_from_headers(request.headers())?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn actor_from_headers(headers: &HeaderMap) -> Result<SubjectRef, AppError> {
    let subject_type = header_value(headers, SUBJECT_TYPE_HEADER)?;
    let subject_id = header_value(headers, SUBJECT_ID_HEADER)?;

    SubjectRef::new(subject_type, subject_id)
        .map_err(|_| AppError::Unauthorized("actor headers must not be blank".to_owned()))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing '{name}' header")))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use rolegate_core::AppError;

    use super::{SUBJECT_ID_HEADER, SUBJECT_TYPE_HEADER, actor_from_headers};

    #[test]
    fn actor_is_built_from_both_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(SUBJECT_TYPE_HEADER, HeaderValue::from_static("user"));
        headers.insert(SUBJECT_ID_HEADER, HeaderValue::from_static("42"));

        assert!(actor_from_headers(&headers).is_ok_and(|actor| actor.to_string() == "user:42"));
    }

    #[test]
    fn missing_or_blank_headers_are_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(SUBJECT_TYPE_HEADER, HeaderValue::from_static("user"));
        assert!(matches!(
            actor_from_headers(&headers),
            Err(AppError::Unauthorized(_))
        ));

        headers.insert(SUBJECT_ID_HEADER, HeaderValue::from_static("  "));
        assert!(matches!(
            actor_from_headers(&headers),
            Err(AppError::Unauthorized(_))
        ));
    }
}
