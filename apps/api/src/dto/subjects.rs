use rolegate_core::SubjectRef;
use serde::Serialize;
use ts_rs::TS;

/// API representation of an authorizable subject.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/subject-response.ts"
)]
pub struct SubjectResponse {
    pub subject_type: String,
    pub subject_id: String,
}

impl From<SubjectRef> for SubjectResponse {
    fn from(subject: SubjectRef) -> Self {
        Self {
            subject_type: subject.subject_type().to_owned(),
            subject_id: subject.subject_id().to_owned(),
        }
    }
}
