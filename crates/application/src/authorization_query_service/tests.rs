use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use rolegate_core::{AppResult, SubjectRef};
use rolegate_domain::{GuardDefinition, GuardName, GuardRegistry, Permission};

use crate::AuthorizationRepository;

use super::AuthorizationQueryService;

#[derive(Default)]
struct FakeAuthorizationRepository {
    permissions: HashSet<(SubjectRef, GuardName, String)>,
    roles: HashSet<(SubjectRef, GuardName, String)>,
    lookups: Mutex<usize>,
}

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn subject_has_permission(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        permission_name: &str,
    ) -> AppResult<bool> {
        *self.lookups.lock().await += 1;
        Ok(self.permissions.contains(&(
            subject.clone(),
            guard.clone(),
            permission_name.to_owned(),
        )))
    }

    async fn subject_has_role(
        &self,
        subject: &SubjectRef,
        guard: &GuardName,
        role_name: &str,
    ) -> AppResult<bool> {
        *self.lookups.lock().await += 1;
        Ok(self
            .roles
            .contains(&(subject.clone(), guard.clone(), role_name.to_owned())))
    }

    async fn list_effective_permissions(
        &self,
        _subject: &SubjectRef,
        _guard: &GuardName,
    ) -> AppResult<Vec<Permission>> {
        *self.lookups.lock().await += 1;
        Ok(Vec::new())
    }
}

fn guard(name: &str) -> GuardName {
    match GuardName::new(name) {
        Ok(guard) => guard,
        Err(error) => panic!("invalid guard in test: {error}"),
    }
}

fn subject(subject_type: &str, subject_id: &str) -> SubjectRef {
    match SubjectRef::new(subject_type, subject_id) {
        Ok(subject) => subject,
        Err(error) => panic!("invalid subject in test: {error}"),
    }
}

fn registry() -> Arc<GuardRegistry> {
    let registry = GuardRegistry::new(
        guard("web"),
        vec![
            GuardDefinition {
                name: guard("web"),
                subject_types: vec!["user".to_owned()],
            },
            GuardDefinition {
                name: guard("api"),
                subject_types: vec!["service_account".to_owned()],
            },
        ],
    );

    match registry {
        Ok(registry) => Arc::new(registry),
        Err(error) => panic!("invalid registry in test: {error}"),
    }
}

fn service(repository: Arc<FakeAuthorizationRepository>) -> AuthorizationQueryService {
    AuthorizationQueryService::new(registry(), repository)
}

#[tokio::test]
async fn has_permission_uses_subject_guard_by_default() {
    let alice = subject("user", "1");
    let mut repository = FakeAuthorizationRepository::default();
    repository
        .permissions
        .insert((alice.clone(), guard("web"), "posts.edit".to_owned()));
    let service = service(Arc::new(repository));

    assert!(
        service
            .has_permission(&alice, "posts.edit", None)
            .await
            .is_ok_and(|allowed| allowed)
    );
    assert!(
        service
            .has_permission(&alice, "posts.delete", None)
            .await
            .is_ok_and(|allowed| !allowed)
    );
}

#[tokio::test]
async fn explicit_guard_mismatch_fails_closed_without_lookup() {
    let alice = subject("user", "1");
    let mut repository = FakeAuthorizationRepository::default();
    repository
        .roles
        .insert((alice.clone(), guard("web"), "editor".to_owned()));
    let repository = Arc::new(repository);
    let service = service(repository.clone());

    let result = service.has_role(&alice, "editor", Some(&guard("api"))).await;

    assert!(result.is_ok_and(|allowed| !allowed));
    assert_eq!(*repository.lookups.lock().await, 0);
}

#[tokio::test]
async fn unknown_subject_type_fails_closed() {
    let repository = Arc::new(FakeAuthorizationRepository::default());
    let service = service(repository.clone());

    let result = service
        .has_permission(&subject("robot", "7"), "posts.edit", None)
        .await;

    assert!(result.is_ok_and(|allowed| !allowed));
    assert_eq!(*repository.lookups.lock().await, 0);
}

#[tokio::test]
async fn identical_names_in_other_guard_do_not_satisfy_check() {
    let bot = subject("service_account", "svc");
    let mut repository = FakeAuthorizationRepository::default();
    repository
        .permissions
        .insert((bot.clone(), guard("web"), "posts.edit".to_owned()));
    let service = service(Arc::new(repository));

    assert!(
        service
            .has_permission(&bot, "posts.edit", None)
            .await
            .is_ok_and(|allowed| !allowed)
    );
}

#[tokio::test]
async fn effective_permissions_reject_unknown_subject_type() {
    let service = service(Arc::new(FakeAuthorizationRepository::default()));

    let result = service.effective_permissions(&subject("robot", "1")).await;

    assert!(matches!(
        result,
        Err(rolegate_core::AppError::UnknownSubjectType(_))
    ));
}
