use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rolegate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::{GuardName, NAME_MAX_LENGTH};

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|error| {
                        AppError::Validation(format!("invalid {} '{value}': {error}", $label))
                    })
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a permission record.
    PermissionId,
    "permission id"
);

uuid_identifier!(
    /// Unique identifier for a role record.
    RoleId,
    "role id"
);

fn bounded_name(value: impl Into<String>, label: &str) -> AppResult<NonEmptyString> {
    let value = value.into().trim().to_owned();
    if value.chars().count() > NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "{label} must not exceed {NAME_MAX_LENGTH} characters"
        )));
    }

    NonEmptyString::new(value)
        .map_err(|_| AppError::Validation(format!("{label} must not be empty")))
}

/// Normalizes and validates a role or permission name.
pub fn validate_record_name(value: impl Into<String>) -> AppResult<NonEmptyString> {
    bounded_name(value, "name")
}

/// Normalizes an optional permission display name; blank values clear it.
pub fn normalize_display_name(value: Option<String>) -> AppResult<Option<NonEmptyString>> {
    match value {
        Some(value) if !value.trim().is_empty() => {
            bounded_name(value, "display name").map(Some)
        }
        _ => Ok(None),
    }
}

/// Named capability scoped to exactly one guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    name: NonEmptyString,
    guard: GuardName,
    display_name: Option<NonEmptyString>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a permission with validated fields.
    pub fn new(
        id: PermissionId,
        name: impl Into<String>,
        guard: GuardName,
        display_name: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: validate_record_name(name)?,
            guard,
            display_name: normalize_display_name(display_name)?,
            created_at,
            updated_at,
        })
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the permission name, unique within its guard.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the owning guard.
    #[must_use]
    pub fn guard(&self) -> &GuardName {
        &self.guard
    }

    /// Returns the optional human-friendly label.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies an update, refreshing `updated_at`.
    pub fn apply(&self, changes: PermissionChanges, now: DateTime<Utc>) -> AppResult<Self> {
        Ok(Self {
            id: self.id,
            name: match changes.name {
                Some(name) => validate_record_name(name)?,
                None => self.name.clone(),
            },
            guard: changes.guard.unwrap_or_else(|| self.guard.clone()),
            display_name: match changes.display_name {
                Some(display_name) => normalize_display_name(display_name)?,
                None => self.display_name.clone(),
            },
            created_at: self.created_at,
            updated_at: now,
        })
    }
}

/// Partial update for a permission. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionChanges {
    /// New name.
    pub name: Option<String>,
    /// New guard.
    pub guard: Option<GuardName>,
    /// New display name; `Some(None)` clears it.
    pub display_name: Option<Option<String>>,
}

/// Named bundle of permissions scoped to exactly one guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    guard: GuardName,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a role with validated fields.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        guard: GuardName,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: validate_record_name(name)?,
            guard,
            created_at,
            updated_at,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name, unique within its guard.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the owning guard.
    #[must_use]
    pub fn guard(&self) -> &GuardName {
        &self.guard
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies an update, refreshing `updated_at`.
    pub fn apply(&self, changes: RoleChanges, now: DateTime<Utc>) -> AppResult<Self> {
        Ok(Self {
            id: self.id,
            name: match changes.name {
                Some(name) => validate_record_name(name)?,
                None => self.name.clone(),
            },
            guard: changes.guard.unwrap_or_else(|| self.guard.clone()),
            created_at: self.created_at,
            updated_at: now,
        })
    }
}

/// Partial update for a role. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChanges {
    /// New name.
    pub name: Option<String>,
    /// New guard.
    pub guard: Option<GuardName>,
}

/// Ensures two guard-scoped records share a guard before they are linked.
pub fn ensure_same_guard(
    left_label: &str,
    left: &GuardName,
    right_label: &str,
    right: &GuardName,
) -> AppResult<()> {
    if left == right {
        return Ok(());
    }

    Err(AppError::GuardMismatch(format!(
        "{left_label} uses guard '{left}' but {right_label} uses guard '{right}'"
    )))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;
    use proptest::prelude::*;
    use rolegate_core::AppError;

    use super::{
        Permission, PermissionChanges, PermissionId, Role, RoleChanges, RoleId, ensure_same_guard,
    };
    use crate::GuardName;

    fn guard(name: &str) -> GuardName {
        match GuardName::new(name) {
            Ok(guard) => guard,
            Err(error) => panic!("invalid guard in test: {error}"),
        }
    }

    #[test]
    fn permission_trims_name_and_drops_blank_display_name() {
        let now = Utc::now();
        let permission = Permission::new(
            PermissionId::new(),
            "  posts.edit ",
            guard("web"),
            Some("   ".to_owned()),
            now,
            now,
        );

        assert!(permission.is_ok_and(|permission| {
            permission.name() == "posts.edit" && permission.display_name().is_none()
        }));
    }

    #[test]
    fn permission_update_can_clear_display_name() {
        let now = Utc::now();
        let permission = match Permission::new(
            PermissionId::new(),
            "posts.edit",
            guard("web"),
            Some("Edit posts".to_owned()),
            now,
            now,
        ) {
            Ok(permission) => permission,
            Err(error) => panic!("invalid permission in test: {error}"),
        };

        let updated = permission.apply(
            PermissionChanges {
                display_name: Some(None),
                ..PermissionChanges::default()
            },
            Utc::now(),
        );

        assert!(updated.is_ok_and(|updated| {
            updated.display_name().is_none() && updated.name() == "posts.edit"
        }));
    }

    #[test]
    fn role_update_rejects_blank_name() {
        let now = Utc::now();
        let role = match Role::new(RoleId::new(), "editor", guard("web"), now, now) {
            Ok(role) => role,
            Err(error) => panic!("invalid role in test: {error}"),
        };

        let updated = role.apply(
            RoleChanges {
                name: Some(" ".to_owned()),
                guard: None,
            },
            now,
        );

        assert!(matches!(updated, Err(AppError::Validation(_))));
    }

    #[test]
    fn guard_mismatch_is_reported() {
        let result = ensure_same_guard(
            "role 'editor'",
            &guard("web"),
            "permission 'edit'",
            &guard("api"),
        );
        assert!(matches!(result, Err(AppError::GuardMismatch(_))));
        assert!(ensure_same_guard("a", &guard("web"), "b", &guard("web")).is_ok());
    }

    #[test]
    fn identifiers_parse_from_transport() {
        let role_id = RoleId::new();
        assert!(
            RoleId::from_str(role_id.to_string().as_str()).is_ok_and(|parsed| parsed == role_id)
        );
        assert!(PermissionId::from_str("not-a-uuid").is_err());
    }

    proptest! {
        #[test]
        fn role_names_within_bound_are_accepted(name in "[a-z][a-z._-]{0,120}") {
            let now = Utc::now();
            let role = Role::new(RoleId::new(), name.clone(), guard("web"), now, now);
            prop_assert!(role.is_ok_and(|role| role.name() == name));
        }

        #[test]
        fn overlong_permission_names_are_rejected(extra in 1usize..32) {
            let now = Utc::now();
            let name = "p".repeat(super::NAME_MAX_LENGTH + extra);
            let permission =
                Permission::new(PermissionId::new(), name, guard("web"), None, now, now);
            prop_assert!(matches!(permission, Err(AppError::Validation(_))));
        }
    }
}
