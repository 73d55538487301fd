//! Tests for secret masking and restoration.

use super::*;
use crate::testing::{org, stored_webhook, FailingLookup, FixedLookup};

fn payload_with_secrets(password: Option<&str>, header: Option<&str>) -> WebhookPayload {
    WebhookPayload {
        password: password.map(SecretInput::from),
        authorization_header: header.map(SecretInput::from),
        ..Default::default()
    }
}

fn exposed(input: Option<&SecretInput>) -> Option<&str> {
    match input {
        Some(SecretInput::Value(v)) => Some(v.expose_secret()),
        Some(SecretInput::Unchanged) => Some(FIELD_PLACEHOLDER),
        None => None,
    }
}

#[test]
fn test_secret_value_debug_is_redacted() {
    let value = SecretValue::from_string("hunter2".to_string());
    let debug = format!("{:?}", value);

    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("[REDACTED]"));
    assert_eq!(value.len(), 7);
}

#[test]
fn test_placeholder_deserializes_as_unchanged() {
    let input: SecretInput = serde_json::from_str(&format!("\"{}\"", FIELD_PLACEHOLDER)).unwrap();
    assert_eq!(input, SecretInput::Unchanged);

    let input: SecretInput = serde_json::from_str("\"new-secret\"").unwrap();
    assert_eq!(
        input,
        SecretInput::Value(SecretValue::from_string("new-secret".to_string()))
    );
}

#[test]
fn test_mask_replaces_non_empty_secrets() {
    let config = stored_webhook("WH1", "O1");
    let masked = SecretRedactor::mask(&config);

    assert_eq!(masked.password.as_deref(), Some(FIELD_PLACEHOLDER));
    assert_eq!(masked.authorization_header.as_deref(), Some(FIELD_PLACEHOLDER));
    assert_eq!(masked.username.as_deref(), Some("bot"));
}

#[test]
fn test_mask_leaves_empty_secrets_empty() {
    let mut config = stored_webhook("WH1", "O1");
    config.password = Some(SecretValue::from_string(String::new()));
    config.authorization_header = None;

    let masked = SecretRedactor::mask(&config);

    assert_eq!(masked.password, None);
    assert_eq!(masked.authorization_header, None);
}

#[test]
fn test_mask_never_exposes_the_real_value() {
    for secret in ["a", "secret1", FIELD_PLACEHOLDER, "  spaced  "] {
        let mut config = stored_webhook("WH1", "O1");
        config.password = Some(SecretValue::from_string(secret.to_string()));

        let masked = SecretRedactor::mask(&config);
        assert_eq!(masked.password.as_deref(), Some(FIELD_PLACEHOLDER));
    }
}

#[test]
fn test_restore_round_trips_masked_secrets() {
    let stored = stored_webhook("WH1", "O1");
    let masked = SecretRedactor::mask(&stored);
    let payload = payload_with_secrets(
        masked.password.as_deref(),
        masked.authorization_header.as_deref(),
    );

    let restored =
        SecretRedactor::restore(payload, Some(&stored), &org("O1"), &FixedLookup(vec![])).unwrap();

    assert_eq!(exposed(restored.password.as_ref()), Some("secret1"));
    assert_eq!(
        exposed(restored.authorization_header.as_ref()),
        Some("Bearer abc")
    );
}

#[test]
fn test_restore_passes_explicit_values_through() {
    let stored = stored_webhook("WH1", "O1");
    let payload = payload_with_secrets(Some("rotated"), None);

    let restored =
        SecretRedactor::restore(payload, Some(&stored), &org("O1"), &FixedLookup(vec![])).unwrap();

    assert_eq!(exposed(restored.password.as_ref()), Some("rotated"));
    assert_eq!(restored.authorization_header, None);
}

#[test]
fn test_restore_looks_up_copy_source() {
    let source = stored_webhook("abc", "O1");
    let mut payload = payload_with_secrets(Some(FIELD_PLACEHOLDER), None);
    payload.id = Some("abc".to_string());

    let restored =
        SecretRedactor::restore(payload, None, &org("O1"), &FixedLookup(vec![source])).unwrap();

    assert_eq!(exposed(restored.password.as_ref()), Some("secret1"));
}

#[test]
fn test_restore_copy_source_is_scoped_to_organization() {
    let source = stored_webhook("abc", "O2");
    let mut payload = payload_with_secrets(Some(FIELD_PLACEHOLDER), None);
    payload.id = Some("abc".to_string());

    let err = SecretRedactor::restore(payload, None, &org("O1"), &FixedLookup(vec![source]))
        .unwrap_err();

    assert_eq!(
        err,
        RedactionError::NotFound {
            id: "abc".to_string()
        }
    );
}

#[test]
fn test_restore_prefers_bound_webhook_over_payload_id() {
    let bound = stored_webhook("WH1", "O1");
    let mut other = stored_webhook("WH2", "O1");
    other.password = Some(SecretValue::from_string("other".to_string()));

    let mut payload = payload_with_secrets(Some(FIELD_PLACEHOLDER), None);
    payload.id = Some("WH2".to_string());

    let restored =
        SecretRedactor::restore(payload, Some(&bound), &org("O1"), &FixedLookup(vec![other]))
            .unwrap();

    assert_eq!(exposed(restored.password.as_ref()), Some("secret1"));
}

#[test]
fn test_restore_placeholder_without_source_fails() {
    let payload = payload_with_secrets(None, Some(FIELD_PLACEHOLDER));

    let err =
        SecretRedactor::restore(payload, None, &org("O1"), &FixedLookup(vec![])).unwrap_err();

    assert_eq!(
        err,
        RedactionError::PlaceholderWithoutSource {
            field: SecretField::AuthorizationHeader
        }
    );
}

#[test]
fn test_restore_surfaces_backend_failures() {
    let mut payload = payload_with_secrets(Some(FIELD_PLACEHOLDER), None);
    payload.id = Some("abc".to_string());

    let err = SecretRedactor::restore(payload, None, &org("O1"), &FailingLookup).unwrap_err();

    assert!(matches!(err, RedactionError::Lookup { .. }));
}

#[test]
fn test_restore_secret_normalizes_empty_to_none() {
    let restored =
        SecretRedactor::restore_secret(SecretField::Password, Some(SecretInput::from("")), None)
            .unwrap();
    assert_eq!(restored, None);
}

#[test]
fn test_restore_secret_keeps_absent_stored_value_absent() {
    let mut source = stored_webhook("WH1", "O1");
    source.authorization_header = None;

    let restored = SecretRedactor::restore_secret(
        SecretField::AuthorizationHeader,
        Some(SecretInput::Unchanged),
        Some(&source),
    )
    .unwrap();
    assert_eq!(restored, None);
}

#[test]
fn test_restore_malformed_copy_source_is_not_found() {
    let too_long = "x".repeat(65);
    for raw in ["has space", too_long.as_str()] {
        let mut payload = payload_with_secrets(Some(FIELD_PLACEHOLDER), None);
        payload.id = Some(raw.to_string());

        let err = SecretRedactor::restore(payload, None, &org("O1"), &FixedLookup(vec![]))
            .unwrap_err();

        assert_eq!(err, RedactionError::NotFound { id: raw.to_string() });
    }
}

#[test]
fn test_blank_copy_source_counts_as_none() {
    let mut payload = payload_with_secrets(Some("fresh"), None);
    payload.id = Some("  ".to_string());

    let restored =
        SecretRedactor::restore(payload, None, &org("O1"), &FailingLookup).unwrap();

    assert_eq!(exposed(restored.password.as_ref()), Some("fresh"));
}

#[test]
fn test_restore_active_skips_inactive_fields_and_collects_failures() {
    let mut payload = payload_with_secrets(Some(FIELD_PLACEHOLDER), Some(FIELD_PLACEHOLDER));

    let failures = SecretRedactor::restore_active(&mut payload, None, |field| {
        field == SecretField::AuthorizationHeader
    });

    assert_eq!(payload.password, None);
    assert_eq!(payload.authorization_header, None);
    assert_eq!(
        failures,
        vec![(
            SecretField::AuthorizationHeader,
            RedactionError::PlaceholderWithoutSource {
                field: SecretField::AuthorizationHeader
            }
        )]
    );
}

#[test]
fn test_restore_active_keeps_every_stored_secret() {
    let stored = stored_webhook("WH1", "O1");
    let mut payload = payload_with_secrets(Some(FIELD_PLACEHOLDER), Some(FIELD_PLACEHOLDER));

    let failures = SecretRedactor::restore_active(&mut payload, Some(&stored), |_| true);

    assert!(failures.is_empty());
    assert_eq!(exposed(payload.password.as_ref()), Some("secret1"));
    assert_eq!(exposed(payload.authorization_header.as_ref()), Some("Bearer abc"));
}
