use async_trait::async_trait;
use rolegate_core::{AppResult, SubjectRef};
use rolegate_domain::{PolicyAction, ResourceKind};

/// Resource targeted by an administrative action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyResource {
    /// Resource family.
    pub kind: ResourceKind,
    /// Concrete record, absent for collection-level actions such as create or list.
    pub id: Option<String>,
}

impl PolicyResource {
    /// Targets a whole collection.
    #[must_use]
    pub fn collection(kind: ResourceKind) -> Self {
        Self { kind, id: None }
    }

    /// Targets one record.
    #[must_use]
    pub fn record(kind: ResourceKind, id: impl ToString) -> Self {
        Self {
            kind,
            id: Some(id.to_string()),
        }
    }
}

/// External policy collaborator consulted before every administrative action.
#[async_trait]
pub trait PolicyCheck: Send + Sync {
    /// Returns whether the actor may perform the action on the resource.
    async fn can(
        &self,
        actor: &SubjectRef,
        action: PolicyAction,
        resource: &PolicyResource,
    ) -> AppResult<bool>;
}
