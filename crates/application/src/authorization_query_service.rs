use std::sync::Arc;

use rolegate_core::{AppResult, SubjectRef};
use rolegate_domain::{GuardName, GuardRegistry, Permission};

use crate::rbac_ports::AuthorizationRepository;

/// Answers guard-exact authorization questions about subjects.
///
/// Checks fail closed: a subject type with no configured guard, or an explicit
/// guard that differs from the subject's own, yields `false` without touching storage.
#[derive(Clone)]
pub struct AuthorizationQueryService {
    registry: Arc<GuardRegistry>,
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationQueryService {
    /// Creates a query service.
    #[must_use]
    pub fn new(registry: Arc<GuardRegistry>, repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self {
            registry,
            repository,
        }
    }

    /// Returns whether the subject holds the named permission, directly or via a role.
    pub async fn has_permission(
        &self,
        subject: &SubjectRef,
        permission_name: &str,
        guard: Option<&GuardName>,
    ) -> AppResult<bool> {
        let Some(guard) = self.effective_guard(subject, guard) else {
            return Ok(false);
        };

        self.repository
            .subject_has_permission(subject, guard, permission_name.trim())
            .await
    }

    /// Returns whether the subject is assigned the named role.
    pub async fn has_role(
        &self,
        subject: &SubjectRef,
        role_name: &str,
        guard: Option<&GuardName>,
    ) -> AppResult<bool> {
        let Some(guard) = self.effective_guard(subject, guard) else {
            return Ok(false);
        };

        self.repository
            .subject_has_role(subject, guard, role_name.trim())
            .await
    }

    /// Lists direct and role-derived permissions in the subject's guard.
    pub async fn effective_permissions(&self, subject: &SubjectRef) -> AppResult<Vec<Permission>> {
        let guard = self.registry.resolve_guard_for(subject.subject_type())?;
        self.repository
            .list_effective_permissions(subject, guard)
            .await
    }

    fn effective_guard<'a>(
        &'a self,
        subject: &SubjectRef,
        requested: Option<&GuardName>,
    ) -> Option<&'a GuardName> {
        let guard = self
            .registry
            .resolve_guard_for(subject.subject_type())
            .ok()?;

        match requested {
            Some(requested) if requested != guard => None,
            _ => Some(guard),
        }
    }
}

#[cfg(test)]
mod tests;
