use std::sync::Arc;

use rolegate_core::{AppError, AppResult, SubjectRef};
use rolegate_domain::{AuditAction, GuardName, GuardRegistry, PolicyAction, ResourceKind};

use crate::AuthorizationQueryService;
use crate::rbac_ports::{AuditEvent, PolicyCheck, PolicyResource, RbacRepositories};

mod assignments;
mod audit;
mod permissions;
mod roles;

pub use permissions::{CreatePermissionInput, UpdatePermissionInput};
pub use roles::{CreateRoleInput, UpdateRoleInput};

/// Application service for role and permission administration.
///
/// Every operation consults the policy collaborator first and records an
/// audit event after each mutation that changed stored state.
#[derive(Clone)]
pub struct RbacAdminService {
    registry: Arc<GuardRegistry>,
    policy: Arc<dyn PolicyCheck>,
    repositories: RbacRepositories,
    query_service: AuthorizationQueryService,
}

impl RbacAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        registry: Arc<GuardRegistry>,
        policy: Arc<dyn PolicyCheck>,
        repositories: RbacRepositories,
        query_service: AuthorizationQueryService,
    ) -> Self {
        Self {
            registry,
            policy,
            repositories,
            query_service,
        }
    }

    /// Returns the guard registry the service validates against.
    #[must_use]
    pub fn registry(&self) -> &GuardRegistry {
        self.registry.as_ref()
    }

    async fn require(
        &self,
        actor: &SubjectRef,
        action: PolicyAction,
        resource: PolicyResource,
    ) -> AppResult<()> {
        if self.policy.can(actor, action, &resource).await? {
            return Ok(());
        }

        let target = match resource.id.as_deref() {
            Some(id) => format!("{} '{id}'", resource.kind.collection()),
            None => resource.kind.collection().to_owned(),
        };

        Err(AppError::Forbidden(format!(
            "subject '{actor}' may not {} {target}",
            action.as_str()
        )))
    }

    fn resolve_guard(&self, guard: Option<String>) -> AppResult<GuardName> {
        let guard = match guard {
            Some(guard) => GuardName::new(guard)?,
            None => self.registry.default_guard().clone(),
        };

        self.registry.require_guard(&guard)?;
        Ok(guard)
    }

    async fn append_audit(
        &self,
        actor: &SubjectRef,
        action: AuditAction,
        resource: ResourceKind,
        resource_id: String,
        detail: String,
    ) -> AppResult<()> {
        self.repositories
            .audit
            .append_event(AuditEvent {
                subject: actor.to_string(),
                action,
                resource_type: format!("rbac_{}", resource.collection()),
                resource_id,
                detail: Some(detail),
            })
            .await
    }
}
