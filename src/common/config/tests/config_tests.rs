//! Unit tests for common-config crate

use common_config::{
    BrowseNamePolicy, DEFAULT_NODE_ID_SEPARATOR, InstantiationConfig, LimitsConfig, ModelConfig,
    NamingConfig,
};

#[test]
fn test_model_config_default() {
    let config = ModelConfig::default();

    assert_eq!(config.naming.duplicate_browse_names, BrowseNamePolicy::Warn);
    assert_eq!(config.limits.max_type_depth, 64);
    assert_eq!(config.limits.max_instantiation_depth, 32);
    assert!(!config.instantiation.separator.is_empty());
}

#[test]
fn test_naming_config_default() {
    let config = NamingConfig::default();
    assert_eq!(config.duplicate_browse_names, BrowseNamePolicy::Warn);
}

#[test]
fn test_browse_name_policy_equality() {
    assert_eq!(BrowseNamePolicy::Warn, BrowseNamePolicy::default());
    assert_ne!(BrowseNamePolicy::Warn, BrowseNamePolicy::Reject);
}

#[test]
fn test_builder_setters() {
    let config = ModelConfig::default()
        .with_separator("/")
        .with_browse_name_policy(BrowseNamePolicy::Reject)
        .with_limits(LimitsConfig {
            max_type_depth: 8,
            max_instantiation_depth: 4,
        });

    assert_eq!(config.instantiation.separator, "/");
    assert_eq!(config.naming.duplicate_browse_names, BrowseNamePolicy::Reject);
    assert_eq!(config.limits.max_type_depth, 8);
    assert_eq!(config.limits.max_instantiation_depth, 4);
}

#[test]
fn test_model_config_serialization() {
    let config = ModelConfig::default()
        .with_separator("::")
        .with_browse_name_policy(BrowseNamePolicy::Reject);

    let json = config.to_json().unwrap();
    let deserialized = ModelConfig::from_json(&json).unwrap();

    assert_eq!(deserialized, config);
}

#[test]
fn test_partial_json_takes_defaults() {
    let config =
        ModelConfig::from_json(r#"{"instantiation": {"separator": "."}}"#).unwrap();

    assert_eq!(config.instantiation.separator, ".");
    assert_eq!(config.limits, LimitsConfig::default());
    assert_eq!(config.naming, NamingConfig::default());
}

#[test]
fn test_instantiation_config_snapshots_default_separator() {
    // Other tests in this binary never touch the process-wide value.
    assert_eq!(
        InstantiationConfig::default().separator,
        DEFAULT_NODE_ID_SEPARATOR
    );
}
