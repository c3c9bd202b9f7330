use super::*;

use crate::rbac_ports::{AuditLogEntry, AuditLogQuery};

impl RbacAdminService {
    /// Returns recent audit entries for administrative users.
    pub async fn list_audit_log(
        &self,
        actor: &SubjectRef,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.require(
            actor,
            PolicyAction::View,
            PolicyResource::collection(ResourceKind::AuditLog),
        )
        .await?;

        self.repositories.audit_log.list_recent_entries(query).await
    }
}
