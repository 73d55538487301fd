//! Tests for field policy resolution.

use super::*;
use crate::presets::{PresetId, PresetPolicy};

fn table() -> PresetTable {
    PresetTable::from_policies(vec![PresetPolicy {
        id: PresetId::new("p1").unwrap(),
        name: "P1".to_string(),
        description: None,
        ignored_fields: [WebhookField::HttpMethod, WebhookField::Headers]
            .into_iter()
            .collect(),
    }])
    .unwrap()
}

#[test]
fn test_preset_ignores_listed_fields_only() {
    let presets = table();
    let resolver = FieldPolicyResolver::new(&presets, UnsetPresetPolicy::default());

    assert!(resolver
        .is_ignored(WebhookField::HttpMethod, Some("p1"))
        .unwrap());
    assert!(resolver.is_ignored(WebhookField::Headers, Some("p1")).unwrap());
    assert!(!resolver.is_ignored(WebhookField::Url, Some("p1")).unwrap());
    assert!(!resolver
        .is_ignored(WebhookField::TriggerType, Some("p1"))
        .unwrap());
}

#[test]
fn test_no_preset_ignores_gated_fields() {
    let presets = table();
    let resolver = FieldPolicyResolver::new(&presets, UnsetPresetPolicy::default());

    for preset in [None, Some("")] {
        assert!(resolver.is_ignored(WebhookField::Url, preset).unwrap());
        assert!(resolver.is_ignored(WebhookField::HttpMethod, preset).unwrap());
        assert!(resolver.is_ignored(WebhookField::TriggerType, preset).unwrap());
        assert!(!resolver.is_ignored(WebhookField::Headers, preset).unwrap());
        assert!(!resolver.is_ignored(WebhookField::Password, preset).unwrap());
    }
}

#[test]
fn test_unknown_preset_propagates() {
    let presets = table();
    let resolver = FieldPolicyResolver::new(&presets, UnsetPresetPolicy::default());

    let err = resolver
        .is_ignored(WebhookField::Url, Some("nope"))
        .unwrap_err();
    assert!(matches!(err, PresetError::UnknownPreset { .. }));
}

#[test]
fn test_is_ignored_is_deterministic() {
    let presets = table();
    let resolver = FieldPolicyResolver::new(&presets, UnsetPresetPolicy::default());

    for field in WebhookField::ALL {
        for preset in [None, Some("p1")] {
            let first = resolver.is_ignored(field, preset).unwrap();
            let second = resolver.is_ignored(field, preset).unwrap();
            assert_eq!(first, second, "field {} preset {:?}", field, preset);
        }
    }
}

#[test]
fn test_honor_supplied_activates_supplied_gated_fields() {
    let presets = table();
    let resolver = FieldPolicyResolver::new(&presets, UnsetPresetPolicy::HonorSupplied);

    assert!(resolver.is_active(WebhookField::Url, None, true).unwrap());
    assert!(!resolver.is_active(WebhookField::Url, None, false).unwrap());
    assert!(resolver.is_active(WebhookField::Headers, None, false).unwrap());
}

#[test]
fn test_honor_supplied_never_overrides_a_preset() {
    let presets = table();
    let resolver = FieldPolicyResolver::new(&presets, UnsetPresetPolicy::HonorSupplied);

    assert!(!resolver
        .is_active(WebhookField::HttpMethod, Some("p1"), true)
        .unwrap());
}

#[test]
fn test_ignore_gated_suppresses_supplied_fields() {
    let presets = table();
    let resolver = FieldPolicyResolver::new(&presets, UnsetPresetPolicy::IgnoreGated);

    assert!(!resolver.is_active(WebhookField::Url, None, true).unwrap());
    assert!(!resolver
        .is_active(WebhookField::TriggerType, None, true)
        .unwrap());
    assert!(resolver.is_active(WebhookField::Data, None, true).unwrap());
}
