//! Tests for the preset policy table.

use super::*;
use std::io::Write;

fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_preset_id_validation() {
    assert!(PresetId::new("simple_webhook").is_ok());
    assert!(PresetId::new("chat-2").is_ok());
    assert!(matches!(
        PresetId::new(""),
        Err(PresetError::InvalidPresetId { .. })
    ));
    assert!(matches!(
        PresetId::new("Simple Webhook"),
        Err(PresetError::InvalidPresetId { .. })
    ));
}

#[test]
fn test_builtin_presets() {
    let table = PresetTable::builtin();
    assert_eq!(table.len(), 2);

    let advanced = table.lookup("advanced_webhook").unwrap();
    assert!(advanced.ignored_fields.is_empty());

    let simple = table.lookup("simple_webhook").unwrap();
    assert!(simple.ignored_fields.contains(&WebhookField::HttpMethod));
    assert!(simple.ignored_fields.contains(&WebhookField::Password));
    assert!(!simple.ignored_fields.contains(&WebhookField::Url));
    assert!(!simple.ignored_fields.contains(&WebhookField::TriggerType));
}

#[test]
fn test_unknown_preset_lookup() {
    let table = PresetTable::builtin();
    let err = table.ignored_fields(Some("missing")).unwrap_err();
    assert_eq!(
        err,
        PresetError::UnknownPreset {
            preset: "missing".to_string()
        }
    );
}

#[test]
fn test_no_preset_ignores_nothing_in_table() {
    let table = PresetTable::builtin();
    assert!(table.ignored_fields(None).unwrap().is_empty());
}

#[test]
fn test_duplicate_and_uncontrollable_fields_are_reported_together() {
    let policy = PresetPolicy {
        id: PresetId::new("p1").unwrap(),
        name: "P1".to_string(),
        description: None,
        ignored_fields: [WebhookField::Name].into_iter().collect(),
    };

    let err = PresetTable::from_policies(vec![policy.clone(), policy]).unwrap_err();
    match err {
        PresetError::ValidationError { errors } => {
            assert_eq!(errors.len(), 3);
            assert!(errors.iter().any(|e| e.contains("Duplicate preset id: p1")));
            assert!(errors.iter().any(|e| e.contains("'name' cannot be ignored")));
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_load_from_yaml_file() {
    let file = write_file(
        ".yaml",
        r#"
presets:
  - id: chat_notifier
    name: Chat notifier
    ignored_fields: [http_method, headers]
  - id: open
    name: Open
"#,
    );

    let table = PresetTable::load_from_file(file.path()).unwrap();
    assert_eq!(table.len(), 2);

    let chat = table.lookup("chat_notifier").unwrap();
    assert!(chat.ignored_fields.contains(&WebhookField::HttpMethod));
    assert!(chat.ignored_fields.contains(&WebhookField::Headers));
    assert!(table.lookup("open").unwrap().ignored_fields.is_empty());
}

#[test]
fn test_load_from_json_file() {
    let file = write_file(
        ".json",
        r#"{"presets": [{"id": "p1", "name": "P1", "ignored_fields": ["trigger_type"]}]}"#,
    );

    let table = PresetTable::load_from_file(file.path()).unwrap();
    let policy = table.lookup("p1").unwrap();
    assert!(policy.ignored_fields.contains(&WebhookField::TriggerType));
}

#[test]
fn test_load_rejects_unknown_field_names() {
    let file = write_file(
        ".yaml",
        "presets:\n  - id: p1\n    name: P1\n    ignored_fields: [webhook_url]\n",
    );

    let err = PresetTable::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, PresetError::ParseError { .. }));
}

#[test]
fn test_load_missing_file() {
    let err = PresetTable::load_from_file(Path::new("/nonexistent/presets.yaml")).unwrap_err();
    assert!(matches!(err, PresetError::FileNotFound { .. }));
}
