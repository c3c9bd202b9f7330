use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use rolegate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Maximum length accepted for guard names, role names and permission names.
pub const NAME_MAX_LENGTH: usize = 255;

/// Authentication context that partitions roles and permissions.
///
/// Identical role or permission names may coexist in different guards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuardName(String);

impl GuardName {
    /// Creates a validated guard name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(AppError::Validation(
                "guard name must not be empty".to_owned(),
            ));
        }

        if value.chars().count() > NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "guard name must not exceed {NAME_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the guard name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for GuardName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<GuardName> for String {
    fn from(value: GuardName) -> Self {
        value.0
    }
}

/// Configured guard and the subject types it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDefinition {
    /// Guard name.
    pub name: GuardName,
    /// Subject types resolved to this guard.
    pub subject_types: Vec<String>,
}

/// Immutable lookup from subject types to the guard that authenticates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRegistry {
    default_guard: GuardName,
    guards: Vec<GuardDefinition>,
    by_subject_type: BTreeMap<String, GuardName>,
}

impl GuardRegistry {
    /// Builds a registry from configured guards.
    ///
    /// Every subject type must belong to exactly one guard so that a
    /// subject's guard is always derivable from its type.
    pub fn new(default_guard: GuardName, guards: Vec<GuardDefinition>) -> AppResult<Self> {
        let mut by_subject_type = BTreeMap::new();
        let mut seen_guards = Vec::with_capacity(guards.len());

        for guard in &guards {
            if seen_guards.contains(&&guard.name) {
                return Err(AppError::Validation(format!(
                    "guard '{}' is configured more than once",
                    guard.name
                )));
            }
            seen_guards.push(&guard.name);

            for subject_type in &guard.subject_types {
                let subject_type = subject_type.trim();
                if subject_type.is_empty() {
                    return Err(AppError::Validation(format!(
                        "guard '{}' lists an empty subject type",
                        guard.name
                    )));
                }

                if let Some(existing) =
                    by_subject_type.insert(subject_type.to_owned(), guard.name.clone())
                {
                    return Err(AppError::Validation(format!(
                        "subject type '{subject_type}' is claimed by guards '{existing}' and '{}'",
                        guard.name
                    )));
                }
            }
        }

        if !seen_guards.contains(&&default_guard) {
            return Err(AppError::Validation(format!(
                "default guard '{default_guard}' is not configured"
            )));
        }

        Ok(Self {
            default_guard,
            guards,
            by_subject_type,
        })
    }

    /// Resolves the guard that authenticates the given subject type.
    pub fn resolve_guard_for(&self, subject_type: &str) -> AppResult<&GuardName> {
        self.by_subject_type.get(subject_type).ok_or_else(|| {
            AppError::UnknownSubjectType(format!(
                "subject type '{subject_type}' is not mapped to any guard"
            ))
        })
    }

    /// Returns the guard used when callers do not name one.
    #[must_use]
    pub fn default_guard(&self) -> &GuardName {
        &self.default_guard
    }

    /// Returns whether the guard is configured.
    #[must_use]
    pub fn contains(&self, guard: &GuardName) -> bool {
        self.guards.iter().any(|definition| &definition.name == guard)
    }

    /// Ensures the guard is configured.
    pub fn require_guard(&self, guard: &GuardName) -> AppResult<()> {
        if self.contains(guard) {
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "guard '{guard}' is not configured"
        )))
    }

    /// Returns configured guards in declaration order.
    #[must_use]
    pub fn guards(&self) -> &[GuardDefinition] {
        self.guards.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rolegate_core::AppError;

    use super::{GuardDefinition, GuardName, GuardRegistry, NAME_MAX_LENGTH};

    fn guard(name: &str) -> GuardName {
        match GuardName::new(name) {
            Ok(guard) => guard,
            Err(error) => panic!("invalid guard in test: {error}"),
        }
    }

    fn registry() -> GuardRegistry {
        let registry = GuardRegistry::new(
            guard("web"),
            vec![
                GuardDefinition {
                    name: guard("web"),
                    subject_types: vec!["user".to_owned()],
                },
                GuardDefinition {
                    name: guard("api"),
                    subject_types: vec!["service_account".to_owned(), "device".to_owned()],
                },
            ],
        );

        match registry {
            Ok(registry) => registry,
            Err(error) => panic!("invalid registry in test: {error}"),
        }
    }

    #[test]
    fn resolves_subject_types_to_their_guard() {
        let registry = registry();

        assert!(matches!(
            registry.resolve_guard_for("device"),
            Ok(guard) if guard.as_str() == "api"
        ));
        assert!(matches!(
            registry.resolve_guard_for("user"),
            Ok(guard) if guard.as_str() == "web"
        ));
    }

    #[test]
    fn unmapped_subject_type_is_rejected() {
        let registry = registry();

        assert!(matches!(
            registry.resolve_guard_for("robot"),
            Err(AppError::UnknownSubjectType(_))
        ));
    }

    #[test]
    fn subject_type_cannot_belong_to_two_guards() {
        let result = GuardRegistry::new(
            guard("web"),
            vec![
                GuardDefinition {
                    name: guard("web"),
                    subject_types: vec!["user".to_owned()],
                },
                GuardDefinition {
                    name: guard("api"),
                    subject_types: vec!["user".to_owned()],
                },
            ],
        );

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn default_guard_must_be_configured() {
        let result = GuardRegistry::new(
            guard("admin"),
            vec![GuardDefinition {
                name: guard("web"),
                subject_types: vec!["user".to_owned()],
            }],
        );

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_guard_fails_requirement() {
        let registry = registry();

        assert!(registry.require_guard(&guard("api")).is_ok());
        assert!(registry.require_guard(&guard("sanctum")).is_err());
    }

    proptest! {
        #[test]
        fn guard_names_are_trimmed(name in "[a-z]{1,16}", padding in " {0,4}") {
            let padded = format!("{padding}{name}{padding}");
            let parsed = GuardName::new(padded);
            prop_assert!(parsed.is_ok_and(|guard| guard.as_str() == name));
        }

        #[test]
        fn overlong_guard_names_are_rejected(
            length in (NAME_MAX_LENGTH + 1)..(NAME_MAX_LENGTH + 64)
        ) {
            prop_assert!(GuardName::new("g".repeat(length)).is_err());
        }
    }
}
