use rolegate_domain::{GuardDefinition, GuardName};
use serde::Serialize;
use ts_rs::TS;

/// API representation of a configured guard.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/guard-response.ts"
)]
pub struct GuardResponse {
    pub name: String,
    pub subject_types: Vec<String>,
    pub is_default: bool,
}

impl GuardResponse {
    pub fn from_definition(definition: &GuardDefinition, default_guard: &GuardName) -> Self {
        Self {
            name: definition.name.as_str().to_owned(),
            subject_types: definition.subject_types.clone(),
            is_default: &definition.name == default_guard,
        }
    }
}
