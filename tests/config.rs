use std::path::PathBuf;

use fincontext_core::config::{Config, ConfigError};
use fincontext_core::document::SectionKind;
use tempfile::tempdir;

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert!(config.cache.enabled);
    assert_eq!(config.cache.ttl_hours, 24);
    assert_eq!(config.cache.dir, PathBuf::from("./cache"));
    assert!(config.cache.reuse_entity_results);
    assert_eq!(config.reduction.max_years, 5);
    assert_eq!(config.reduction.max_quarters, 8);
    assert!(!config.reduction.aggressive);
    assert_eq!(config.reduction.sections, None);
    assert_eq!(config.budget.context_ceiling, 4096);
    assert_eq!(config.budget.markup_chars_per_unit, 2.5);
    assert_eq!(config.budget.prose_chars_per_unit, 4.0);
}

#[test]
fn toml_overrides_only_given_fields() {
    let config = Config::from_toml_str(
        r#"
        [cache]
        ttl_hours = 6
        reuse_entity_results = false

        [reduction]
        max_quarters = 4
        sections = ["ratios", "profit-loss"]

        [budget]
        context_ceiling = 8192
        "#,
    )
    .unwrap();

    assert_eq!(config.cache.ttl_hours, 6);
    assert!(config.cache.enabled);
    assert!(!config.cache.reuse_entity_results);
    assert_eq!(config.reduction.max_quarters, 4);
    assert_eq!(config.reduction.max_years, 5);
    assert_eq!(config.budget.context_ceiling, 8192);

    let params = config.reduction.params();
    assert_eq!(
        params.include_sections,
        Some(vec![SectionKind::Ratios, SectionKind::ProfitLoss])
    );
    assert_eq!(config.budget.estimator().ceiling(), 8192);
}

#[test]
fn unknown_section_in_toml_is_rejected() {
    let result = Config::from_toml_str("[reduction]\nsections = [\"income\"]\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn invalid_values_are_rejected() {
    let result = Config::from_toml_str("[cache]\nttl_hours = 0\n");
    assert!(matches!(
        result,
        Err(ConfigError::Invalid { field: "cache.ttl_hours", .. })
    ));

    let result = Config::from_toml_str("[budget]\nmarkup_chars_per_unit = 0.0\n");
    assert!(matches!(
        result,
        Err(ConfigError::Invalid { field: "budget.markup_chars_per_unit", .. })
    ));
}

#[test]
fn env_overrides_apply_explicitly() {
    let mut config = Config::default();
    config.apply_env([
        ("ENABLE_CACHE", "off"),
        ("CACHE_DIR", "/var/cache/fin"),
        ("CACHE_TTL_HOURS", "12"),
        ("UNRELATED", "1"),
    ]);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.dir, PathBuf::from("/var/cache/fin"));
    assert_eq!(config.cache.ttl_hours, 12);

    config.apply_env([("ENABLE_CACHE", "Yes"), ("CACHE_TTL_HOURS", "soon")]);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.ttl_hours, 12, "unparsable values keep the current setting");
}

#[test]
fn load_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn load_reads_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fincontext.toml");
    std::fs::write(&path, "[reduction]\naggressive = true\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert!(config.reduction.aggressive);
}
