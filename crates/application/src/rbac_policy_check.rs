use std::collections::BTreeSet;

use async_trait::async_trait;

use rolegate_core::{AppResult, SubjectRef};
use rolegate_domain::PolicyAction;

use crate::AuthorizationQueryService;
use crate::rbac_ports::{PolicyCheck, PolicyResource};

/// Policy that authorizes administrators through the store itself.
///
/// An actor may perform `action` on a resource kind when it holds the
/// permission `"{collection}.{action}"` in its own guard. Configured super
/// subjects bypass the lookup so an empty store can be bootstrapped.
#[derive(Clone)]
pub struct RbacPolicyCheck {
    query_service: AuthorizationQueryService,
    super_subjects: BTreeSet<SubjectRef>,
}

impl RbacPolicyCheck {
    /// Creates a store-backed policy.
    #[must_use]
    pub fn new(
        query_service: AuthorizationQueryService,
        super_subjects: impl IntoIterator<Item = SubjectRef>,
    ) -> Self {
        Self {
            query_service,
            super_subjects: super_subjects.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PolicyCheck for RbacPolicyCheck {
    async fn can(
        &self,
        actor: &SubjectRef,
        action: PolicyAction,
        resource: &PolicyResource,
    ) -> AppResult<bool> {
        if self.super_subjects.contains(actor) {
            return Ok(true);
        }

        let permission_name = resource.kind.permission_name(action);
        self.query_service
            .has_permission(actor, permission_name.as_str(), None)
            .await
    }
}
