use rolegate_core::AppError;

use super::{parse_guard_registry, parse_subject_list};

#[test]
fn guard_list_maps_subject_types_and_defaults_to_first_guard() {
    let registry = match parse_guard_registry("web=user, admin ; api=service", None) {
        Ok(registry) => registry,
        Err(error) => panic!("failed to parse guards: {error}"),
    };

    assert_eq!(registry.default_guard().as_str(), "web");
    assert!(
        registry
            .resolve_guard_for("admin")
            .is_ok_and(|guard| guard.as_str() == "web")
    );
    assert!(
        registry
            .resolve_guard_for("service")
            .is_ok_and(|guard| guard.as_str() == "api")
    );
    assert_eq!(registry.guards().len(), 2);
}

#[test]
fn explicit_default_guard_must_be_listed() {
    assert!(
        parse_guard_registry("web=user;api=service", Some("api"))
            .is_ok_and(|registry| registry.default_guard().as_str() == "api")
    );
    assert!(matches!(
        parse_guard_registry("web=user", Some("admin")),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn malformed_guard_lists_are_rejected() {
    assert!(parse_guard_registry("", None).is_err());
    assert!(parse_guard_registry("web", None).is_err());
    assert!(parse_guard_registry("web=user;api=user", None).is_err());
}

#[test]
fn subject_list_parses_type_and_id_pairs() {
    let subjects = match parse_subject_list(" user:root , service:deployer ,") {
        Ok(subjects) => subjects,
        Err(error) => panic!("failed to parse subjects: {error}"),
    };

    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0].to_string(), "user:root");
    assert_eq!(subjects[1].subject_type(), "service");
    assert!(parse_subject_list("").is_ok_and(|subjects| subjects.is_empty()));
    assert!(parse_subject_list("root").is_err());
}
