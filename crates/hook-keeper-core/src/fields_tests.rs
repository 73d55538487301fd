//! Tests for the webhook field enumeration.

use super::*;

#[test]
fn test_field_names_parse_back() {
    for field in WebhookField::ALL {
        assert_eq!(WebhookField::from_str(field.as_str()).unwrap(), field);
    }
}

#[test]
fn test_unknown_field_name() {
    let err = WebhookField::from_str("webhook_url").unwrap_err();
    assert_eq!(
        err,
        FieldError::UnknownField {
            name: "webhook_url".to_string()
        }
    );
}

#[test]
fn test_serde_name_matches_wire_name() {
    let json = serde_json::to_string(&WebhookField::AuthorizationHeader).unwrap();
    assert_eq!(json, "\"authorization_header\"");

    let field: WebhookField = serde_json::from_str("\"http_method\"").unwrap();
    assert_eq!(field, WebhookField::HttpMethod);
}

#[test]
fn test_gated_fields() {
    let gated: Vec<_> = WebhookField::ALL
        .iter()
        .filter(|f| f.is_preset_gated())
        .collect();
    assert_eq!(
        gated,
        vec![
            &WebhookField::Url,
            &WebhookField::HttpMethod,
            &WebhookField::TriggerType
        ]
    );
}

#[test]
fn test_identity_fields_are_not_preset_controllable() {
    assert!(!WebhookField::Id.is_preset_controllable());
    assert!(!WebhookField::Name.is_preset_controllable());
    assert!(!WebhookField::Team.is_preset_controllable());
    assert!(!WebhookField::Preset.is_preset_controllable());
    assert!(WebhookField::Password.is_preset_controllable());
    assert!(WebhookField::Url.is_preset_controllable());
}

#[test]
fn test_secret_fields_map_to_payload_fields() {
    assert_eq!(SecretField::Password.field(), WebhookField::Password);
    assert_eq!(
        SecretField::AuthorizationHeader.field(),
        WebhookField::AuthorizationHeader
    );
    assert_eq!(SecretField::AuthorizationHeader.to_string(), "authorization_header");
}
