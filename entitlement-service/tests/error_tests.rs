use entitlement_service::{ErrorKind, ServiceError};

#[test]
fn failures_are_prefixed_by_operation() {
    let err = ServiceError::failed(ErrorKind::ActivationFailed, "network error: timed out");
    assert_eq!(err.to_string(), "Activation failed: network error: timed out");
    assert_eq!(err.code(), "activation_failed");
}

#[test]
fn every_kind_has_a_stable_code() {
    let codes = [
        (ErrorKind::ActivationFailed, "activation_failed"),
        (ErrorKind::DeactivationFailed, "deactivation_failed"),
        (ErrorKind::ValidationFailed, "validation_failed"),
        (ErrorKind::RefreshFailed, "refresh_failed"),
        (ErrorKind::RevocationFailed, "revocation_failed"),
        (ErrorKind::LicenseNotRegistered, "license_not_registered"),
        (ErrorKind::LicenseNotActivated, "license_not_activated"),
    ];
    for (kind, code) in codes {
        assert_eq!(kind.code(), code);
        assert_eq!(kind.to_string(), code);
    }
}

#[test]
fn precondition_errors_have_fixed_messages() {
    assert_eq!(ServiceError::not_registered().to_string(), "License not registered.");
    assert_eq!(ServiceError::not_activated().to_string(), "License not activated.");
}
