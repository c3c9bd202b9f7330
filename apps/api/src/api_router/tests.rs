use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api_config::{
    ApiConfig, PolicyMode, StorageBackend, parse_guard_registry, parse_subject_list,
};
use crate::api_services::build_app_state;
use crate::middleware::{SUBJECT_ID_HEADER, SUBJECT_TYPE_HEADER};

use super::build_router;

const ROOT: (&str, &str) = ("user", "root");

fn test_router() -> Router {
    let guard_registry = match parse_guard_registry("web=user;api=service", None) {
        Ok(registry) => registry,
        Err(error) => panic!("invalid guards in test: {error}"),
    };
    let super_subjects = match parse_subject_list("user:root") {
        Ok(subjects) => subjects,
        Err(error) => panic!("invalid super subjects in test: {error}"),
    };

    let config = ApiConfig {
        migrate_only: false,
        storage_backend: StorageBackend::Memory,
        database_url: None,
        database_max_connections: 1,
        frontend_url: "http://localhost:3000".to_owned(),
        api_host: "127.0.0.1".to_owned(),
        api_port: 0,
        guard_registry,
        policy_mode: PolicyMode::Rbac,
        super_subjects,
    };

    let app_state = match build_app_state(None, &config) {
        Ok(app_state) => app_state,
        Err(error) => panic!("failed to build state in test: {error}"),
    };

    match build_router(app_state, config.frontend_url.as_str()) {
        Ok(router) => router,
        Err(error) => panic!("failed to build router in test: {error}"),
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    actor: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((subject_type, subject_id)) = actor {
        builder = builder
            .header(SUBJECT_TYPE_HEADER, subject_type)
            .header(SUBJECT_ID_HEADER, subject_id);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    let request = match request {
        Ok(request) => request,
        Err(error) => panic!("invalid request in test: {error}"),
    };

    let response = match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(error) => panic!("router failed in test: {error}"),
    };

    let status = response.status();
    let bytes = match response.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => panic!("failed to read body in test: {error}"),
    };

    if bytes.is_empty() {
        return (status, Value::Null);
    }

    match serde_json::from_slice(&bytes) {
        Ok(value) => (status, value),
        Err(error) => panic!("response body is not json in test: {error}"),
    }
}

async fn create_permission(router: &Router, name: &str, guard: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/permissions",
        Some(ROOT),
        Some(json!({ "name": name, "guard": guard })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    match body["id"].as_str() {
        Some(id) => id.to_owned(),
        None => panic!("permission response has no id: {body}"),
    }
}

async fn create_role(router: &Router, name: &str, guard: &str, permission_ids: &[&str]) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/roles",
        Some(ROOT),
        Some(json!({ "name": name, "guard": guard, "permission_ids": permission_ids })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    match body["id"].as_str() {
        Some(id) => id.to_owned(),
        None => panic!("role response has no id: {body}"),
    }
}

#[tokio::test]
async fn health_and_guards_do_not_require_an_actor() {
    let router = test_router();

    let (status, body) = send(&router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");

    let (status, body) = send(&router, Method::GET, "/api/guards", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "web");
    assert_eq!(body[0]["is_default"], true);
    assert_eq!(body[1]["subject_types"], json!(["service"]));
}

#[tokio::test]
async fn admin_routes_require_actor_headers() {
    let router = test_router();

    let (status, body) = send(&router, Method::GET, "/api/permissions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().is_some_and(|message| message.contains("x-subject-type")));
}

#[tokio::test]
async fn role_assignment_grants_permission_in_subject_guard_only() {
    let router = test_router();
    let edit = create_permission(&router, "posts.edit", "web").await;
    let editor = create_role(&router, "editor", "web", &[edit.as_str()]).await;

    let assign_uri = format!("/api/subjects/user/alice/roles/{editor}");
    let (status, body) = send(&router, Method::POST, &assign_uri, Some(ROOT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);

    let (status, body) = send(&router, Method::POST, &assign_uri, Some(ROOT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/subjects/user/alice/can/posts.edit",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body["allowed"], true);

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/subjects/user/alice/can/posts.edit?guard=api",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body["allowed"], false);

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/subjects/user/alice/has-role/editor",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body["allowed"], true);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/subjects/user/alice/permissions",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "posts.edit");

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/subjects/user/alice/permissions?scope=direct",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn cross_guard_attach_is_unprocessable() {
    let router = test_router();
    let issue = create_permission(&router, "tokens.issue", "api").await;
    let editor = create_role(&router, "editor", "web", &[]).await;

    let (status, _) = send(
        &router,
        Method::POST,
        format!("/api/roles/{editor}/permissions/{issue}").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/roles",
        Some(ROOT),
        Some(json!({ "name": "issuer", "guard": "web", "permission_ids": [issue] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn duplicate_names_conflict_within_guard_only() {
    let router = test_router();
    create_permission(&router, "posts.edit", "web").await;
    create_permission(&router, "posts.edit", "api").await;

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/permissions",
        Some(ROOT),
        Some(json!({ "name": "posts.edit" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/guards/api/permissions/posts.edit",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["guard"], "api");
}

#[tokio::test]
async fn unknown_subject_type_is_a_bad_request() {
    let router = test_router();
    let editor = create_role(&router, "editor", "web", &[]).await;

    let (status, _) = send(
        &router,
        Method::POST,
        format!("/api/subjects/robot/r2/roles/{editor}").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/subjects/robot/r2/can/posts.edit",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
}

#[tokio::test]
async fn stored_permissions_authorize_administrators() {
    let router = test_router();
    let bob = Some(("user", "bob"));

    let (status, _) = send(&router, Method::GET, "/api/permissions", bob, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let view = create_permission(&router, "permissions.view", "web").await;
    let (status, _) = send(
        &router,
        Method::POST,
        format!("/api/subjects/user/bob/permissions/{view}").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, Method::GET, "/api/permissions", bob, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "permissions.view");

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/permissions",
        bob,
        Some(json!({ "name": "posts.edit" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_a_role_removes_its_assignments_and_is_audited() {
    let router = test_router();
    let edit = create_permission(&router, "posts.edit", "web").await;
    let editor = create_role(&router, "editor", "web", &[edit.as_str()]).await;
    send(
        &router,
        Method::POST,
        format!("/api/subjects/user/alice/roles/{editor}").as_str(),
        Some(ROOT),
        None,
    )
    .await;

    let (status, _) = send(
        &router,
        Method::DELETE,
        format!("/api/roles/{editor}").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/subjects/user/alice/roles",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body, json!([]));

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/subjects/user/alice/can/posts.edit",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body["allowed"], false);

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/audit-log?action=rbac.role.deleted",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["subject"], "user:root");
}

#[tokio::test]
async fn sync_replaces_role_permissions() {
    let router = test_router();
    let edit = create_permission(&router, "posts.edit", "web").await;
    let view = create_permission(&router, "posts.view", "web").await;
    let editor = create_role(&router, "editor", "web", &[edit.as_str()]).await;

    let (status, body) = send(
        &router,
        Method::PUT,
        format!("/api/roles/{editor}/permissions").as_str(),
        Some(ROOT),
        Some(json!({ "permission_ids": [view] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["name"], "posts.view");

    let (status, body) = send(
        &router,
        Method::GET,
        format!("/api/permissions/{edit}/roles").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn unnameable_guard_answers_false_instead_of_failing() {
    let router = test_router();
    let edit = create_permission(&router, "posts.edit", "web").await;
    send(
        &router,
        Method::POST,
        format!("/api/subjects/user/alice/permissions/{edit}").as_str(),
        Some(ROOT),
        None,
    )
    .await;

    let long_guard = "g".repeat(300);
    for uri in [
        "/api/subjects/user/alice/can/posts.edit?guard=%20".to_owned(),
        format!("/api/subjects/user/alice/can/posts.edit?guard={long_guard}"),
        "/api/subjects/user/alice/has-role/editor?guard=%20".to_owned(),
    ] {
        let (status, body) = send(&router, Method::GET, uri.as_str(), Some(ROOT), None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["allowed"], false, "{uri}");
    }
}

#[tokio::test]
async fn overlong_subject_id_is_a_bad_request() {
    let router = test_router();
    let editor = create_role(&router, "editor", "web", &[]).await;
    let subject_id = "x".repeat(256);

    let (status, _) = send(
        &router,
        Method::POST,
        format!("/api/subjects/user/{subject_id}/roles/{editor}").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn permission_roles_are_synced_from_the_permission_side() {
    let router = test_router();
    let edit = create_permission(&router, "posts.edit", "web").await;
    let editor = create_role(&router, "editor", "web", &[edit.as_str()]).await;
    let reviewer = create_role(&router, "reviewer", "web", &[]).await;
    let issuer = create_role(&router, "issuer", "api", &[]).await;
    let roles_uri = format!("/api/permissions/{edit}/roles");

    let (status, body) = send(
        &router,
        Method::PUT,
        roles_uri.as_str(),
        Some(ROOT),
        Some(json!({ "role_ids": [reviewer] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["name"], "reviewer");

    let (status, _) = send(
        &router,
        Method::PUT,
        roles_uri.as_str(),
        Some(ROOT),
        Some(json!({ "role_ids": [editor, issuer] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(
        &router,
        Method::GET,
        format!("/api/roles/{editor}/permissions").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body, json!([]));

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/audit-log?action=rbac.permission.roles_synced",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn permission_subjects_list_direct_holders() {
    let router = test_router();
    let edit = create_permission(&router, "posts.edit", "web").await;
    send(
        &router,
        Method::POST,
        format!("/api/subjects/user/bob/permissions/{edit}").as_str(),
        Some(ROOT),
        None,
    )
    .await;

    let (status, body) = send(
        &router,
        Method::GET,
        format!("/api/permissions/{edit}/subjects").as_str(),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "subject_type": "user", "subject_id": "bob" }]));
}
