use async_trait::async_trait;
use tracing::warn;

use rolegate_application::{PolicyCheck, PolicyResource};
use rolegate_core::{AppResult, SubjectRef};
use rolegate_domain::PolicyAction;

/// Policy that allows every administrative action.
///
/// Intended for local development and for deployments where an upstream
/// gateway already authorizes administrators.
#[derive(Debug, Clone, Copy)]
pub struct PermissivePolicyCheck;

impl PermissivePolicyCheck {
    /// Creates the policy and warns that administrative actions are unchecked.
    #[must_use]
    pub fn new() -> Self {
        warn!("permissive policy enabled: every administrative action is allowed");
        Self
    }
}

impl Default for PermissivePolicyCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyCheck for PermissivePolicyCheck {
    async fn can(
        &self,
        _actor: &SubjectRef,
        _action: PolicyAction,
        _resource: &PolicyResource,
    ) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use rolegate_application::{PolicyCheck, PolicyResource};
    use rolegate_core::SubjectRef;
    use rolegate_domain::{PolicyAction, ResourceKind};

    use super::PermissivePolicyCheck;

    #[tokio::test]
    async fn allows_any_actor_and_action() {
        let actor = match SubjectRef::new("robot", "1") {
            Ok(actor) => actor,
            Err(error) => panic!("invalid subject in test: {error}"),
        };

        let allowed = PermissivePolicyCheck::new()
            .can(
                &actor,
                PolicyAction::Delete,
                &PolicyResource::collection(ResourceKind::Role),
            )
            .await;

        assert!(allowed.is_ok_and(|allowed| allowed));
    }
}
