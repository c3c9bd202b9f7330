use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Longest subject type or id the assignment tables can store.
const PART_MAX_LENGTH: usize = 255;

/// Polymorphic reference to any entity that can hold roles or permissions.
///
/// A subject is identified by its type tag (for example `user` or
/// `service_account`) and an identifier that is unique within that type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectRef {
    subject_type: String,
    subject_id: String,
}

impl SubjectRef {
    /// Creates a validated subject reference.
    pub fn new(subject_type: impl Into<String>, subject_id: impl Into<String>) -> AppResult<Self> {
        let subject_type = subject_type.into().trim().to_owned();
        let subject_id = subject_id.into().trim().to_owned();

        if subject_type.is_empty() {
            return Err(AppError::Validation(
                "subject type must not be empty".to_owned(),
            ));
        }

        if subject_type.contains(':') {
            return Err(AppError::Validation(format!(
                "subject type '{subject_type}' must not contain ':'"
            )));
        }

        if subject_id.is_empty() {
            return Err(AppError::Validation(
                "subject id must not be empty".to_owned(),
            ));
        }

        for (label, value) in [("type", &subject_type), ("id", &subject_id)] {
            if value.chars().count() > PART_MAX_LENGTH {
                return Err(AppError::Validation(format!(
                    "subject {label} must not exceed {PART_MAX_LENGTH} characters"
                )));
            }
        }

        Ok(Self {
            subject_type,
            subject_id,
        })
    }

    /// Returns the subject type tag.
    #[must_use]
    pub fn subject_type(&self) -> &str {
        self.subject_type.as_str()
    }

    /// Returns the identifier within the subject type.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        self.subject_id.as_str()
    }
}

impl Display for SubjectRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.subject_type, self.subject_id)
    }
}

impl FromStr for SubjectRef {
    type Err = AppError;

    /// Parses the `type:id` transport form.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (subject_type, subject_id) = value.split_once(':').ok_or_else(|| {
            AppError::Validation(format!("subject '{value}' must use the 'type:id' form"))
        })?;

        Self::new(subject_type, subject_id)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::AppError;

    use super::{PART_MAX_LENGTH, SubjectRef};

    #[test]
    fn subject_ref_parses_transport_form() {
        let subject = match SubjectRef::from_str("user:42") {
            Ok(subject) => subject,
            Err(error) => panic!("failed to parse subject: {error}"),
        };
        assert_eq!(subject.subject_type(), "user");
        assert_eq!(subject.subject_id(), "42");
        assert_eq!(subject.to_string(), "user:42");
    }

    #[test]
    fn subject_id_may_contain_separator() {
        let subject = SubjectRef::from_str("device:ab:cd");
        assert!(subject.is_ok_and(|subject| subject.subject_id() == "ab:cd"));
    }

    #[test]
    fn subject_ref_rejects_blank_parts() {
        assert!(SubjectRef::new(" ", "1").is_err());
        assert!(SubjectRef::new("user", "  ").is_err());
        assert!(SubjectRef::from_str("user").is_err());
    }

    #[test]
    fn subject_parts_are_bounded_to_column_width() {
        let longest = "x".repeat(PART_MAX_LENGTH);
        let too_long = "x".repeat(PART_MAX_LENGTH + 1);

        assert!(SubjectRef::new("user", longest.as_str()).is_ok());
        assert!(matches!(
            SubjectRef::new("user", too_long.as_str()),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            SubjectRef::new(too_long.as_str(), "1"),
            Err(AppError::Validation(_))
        ));
    }
}
