use std::sync::Arc;

use rolegate_application::{AuthorizationQueryService, PolicyCheck, RbacPolicyCheck};
use rolegate_infrastructure::PermissivePolicyCheck;
use tracing::info;

use crate::api_config::{ApiConfig, PolicyMode};

pub(super) fn build_policy_check(
    config: &ApiConfig,
    query_service: AuthorizationQueryService,
) -> Arc<dyn PolicyCheck> {
    match config.policy_mode {
        PolicyMode::Rbac => {
            info!(
                super_subjects = config.super_subjects.len(),
                "administrative actions authorized through stored permissions"
            );
            Arc::new(RbacPolicyCheck::new(
                query_service,
                config.super_subjects.iter().cloned(),
            ))
        }
        PolicyMode::Permissive => Arc::new(PermissivePolicyCheck::new()),
    }
}
