use chrono::Utc;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use rolegate_application::{
    AssignmentRepository, AuthorizationRepository, PermissionRepository, RecordListQuery,
    RoleRepository,
};
use rolegate_core::{AppError, SubjectRef};
use rolegate_domain::{GuardName, Permission, PermissionId, Role, RoleChanges, RoleId};

use super::{PostgresRbacRepository, sql_offset};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres rbac tests: {error}");
    }

    Some(pool)
}

fn guard(name: &str) -> GuardName {
    match GuardName::new(name) {
        Ok(guard) => guard,
        Err(error) => panic!("invalid guard in test: {error}"),
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}.{}", Uuid::new_v4().simple())
}

fn permission(name: &str, guard_name: &str) -> Permission {
    let now = Utc::now();
    match Permission::new(PermissionId::new(), name, guard(guard_name), None, now, now) {
        Ok(permission) => permission,
        Err(error) => panic!("invalid permission in test: {error}"),
    }
}

fn role(name: &str, guard_name: &str) -> Role {
    let now = Utc::now();
    match Role::new(RoleId::new(), name, guard(guard_name), now, now) {
        Ok(role) => role,
        Err(error) => panic!("invalid role in test: {error}"),
    }
}

fn subject(subject_type: &str) -> SubjectRef {
    match SubjectRef::new(subject_type, Uuid::new_v4().to_string()) {
        Ok(subject) => subject,
        Err(error) => panic!("invalid subject in test: {error}"),
    }
}

#[tokio::test]
async fn duplicate_names_conflict_only_within_a_guard() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);
    let name = unique("posts.edit");

    assert!(repository.insert_permission(permission(&name, "web")).await.is_ok());
    assert!(repository.insert_permission(permission(&name, "api")).await.is_ok());

    let duplicate = repository.insert_permission(permission(&name, "web")).await;
    assert!(matches!(duplicate, Err(AppError::DuplicateName(_))));
}

#[tokio::test]
async fn linked_role_cannot_change_guard() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);
    let editor = role(&unique("editor"), "web");
    let edit = permission(&unique("posts.edit"), "web");

    assert!(repository.insert_role(editor.clone(), &[]).await.is_ok());
    assert!(repository.insert_permission(edit.clone()).await.is_ok());
    assert!(
        repository
            .attach_permissions(editor.id(), &[edit.id()])
            .await
            .is_ok_and(|created| created == 1)
    );

    let moved = match editor.apply(
        RoleChanges {
            name: None,
            guard: Some(guard("api")),
        },
        Utc::now(),
    ) {
        Ok(moved) => moved,
        Err(error) => panic!("invalid role update in test: {error}"),
    };

    let result = repository.update_role(moved).await;
    assert!(matches!(result, Err(AppError::GuardMismatch(_))));
}

#[tokio::test]
async fn attaching_cross_guard_permission_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);
    let editor = role(&unique("editor"), "web");
    let token = permission(&unique("tokens.issue"), "api");

    assert!(repository.insert_role(editor.clone(), &[]).await.is_ok());
    assert!(repository.insert_permission(token.clone()).await.is_ok());

    let result = repository.attach_permissions(editor.id(), &[token.id()]).await;
    assert!(matches!(result, Err(AppError::GuardMismatch(_))));
}

#[tokio::test]
async fn role_permissions_flow_to_subject_checks_and_cascade_on_delete() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);
    let editor = role(&unique("editor"), "web");
    let edit = permission(&unique("posts.edit"), "web");
    let alice = subject("user");
    let web = guard("web");

    assert!(repository.insert_role(editor.clone(), &[]).await.is_ok());
    assert!(repository.insert_permission(edit.clone()).await.is_ok());
    assert!(repository.attach_permissions(editor.id(), &[edit.id()]).await.is_ok());
    assert!(
        repository
            .assign_role(&alice, &web, editor.id())
            .await
            .is_ok_and(|created| created)
    );
    assert!(
        repository
            .assign_role(&alice, &web, editor.id())
            .await
            .is_ok_and(|created| !created)
    );

    assert!(
        repository
            .subject_has_permission(&alice, &web, edit.name())
            .await
            .is_ok_and(|allowed| allowed)
    );
    assert!(
        repository
            .subject_has_permission(&alice, &guard("api"), edit.name())
            .await
            .is_ok_and(|allowed| !allowed)
    );

    assert!(repository.delete_role(editor.id()).await.is_ok());
    assert!(
        repository
            .subject_has_permission(&alice, &web, edit.name())
            .await
            .is_ok_and(|allowed| !allowed)
    );
    assert!(
        repository
            .list_subject_roles(&alice)
            .await
            .is_ok_and(|roles| roles.is_empty())
    );
}

#[tokio::test]
async fn sync_replaces_links_in_one_step() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);
    let editor = role(&unique("editor"), "web");
    let edit = permission(&unique("posts.edit"), "web");
    let view = permission(&unique("posts.view"), "web");

    assert!(repository.insert_role(editor.clone(), &[]).await.is_ok());
    assert!(repository.insert_permission(edit.clone()).await.is_ok());
    assert!(repository.insert_permission(view.clone()).await.is_ok());
    assert!(repository.attach_permissions(editor.id(), &[edit.id()]).await.is_ok());

    assert!(repository.sync_permissions(editor.id(), &[view.id()]).await.is_ok());

    let listed = repository.list_role_permissions(editor.id()).await;
    assert!(listed.is_ok_and(|permissions| {
        permissions.len() == 1 && permissions[0].id() == view.id()
    }));
}

#[tokio::test]
async fn role_with_missing_permission_is_not_stored() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);
    let editor = role(&unique("editor"), "web");

    let result = repository
        .insert_role(editor.clone(), &[PermissionId::new()])
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(
        repository
            .find_role(editor.id())
            .await
            .is_ok_and(|found| found.is_none())
    );
}

#[test]
fn offsets_beyond_bigint_are_rejected_as_validation() {
    assert!(sql_offset(40).is_ok_and(|offset| offset == 40));
    assert!(matches!(sql_offset(usize::MAX), Err(AppError::Validation(_))));
}

#[tokio::test]
async fn huge_list_offset_is_a_validation_error() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);

    let result = repository
        .list_roles(RecordListQuery {
            offset: usize::MAX,
            ..RecordListQuery::default()
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn permission_side_sync_checks_every_role_guard() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRbacRepository::new(pool);
    let edit = permission(&unique("posts.edit"), "web");
    let editor = role(&unique("editor"), "web");
    let reviewer = role(&unique("reviewer"), "web");
    let issuer = role(&unique("issuer"), "api");
    let bob = subject("user");

    assert!(repository.insert_permission(edit.clone()).await.is_ok());
    for stored in [&editor, &reviewer, &issuer] {
        assert!(repository.insert_role(stored.clone(), &[]).await.is_ok());
    }
    assert!(repository.attach_permissions(editor.id(), &[edit.id()]).await.is_ok());

    assert!(
        repository
            .sync_permission_roles(edit.id(), &[reviewer.id()])
            .await
            .is_ok()
    );
    let rejected = repository
        .sync_permission_roles(edit.id(), &[editor.id(), issuer.id()])
        .await;
    assert!(matches!(rejected, Err(AppError::GuardMismatch(_))));
    assert!(
        repository
            .list_roles_with_permission(edit.id())
            .await
            .is_ok_and(|roles| roles.len() == 1 && roles[0].id() == reviewer.id())
    );

    assert!(
        repository
            .assign_permission(&bob, &guard("web"), edit.id())
            .await
            .is_ok()
    );
    assert!(
        repository
            .list_subjects_with_permission(edit.id())
            .await
            .is_ok_and(|subjects| subjects == vec![bob])
    );
}
