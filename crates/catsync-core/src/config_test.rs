use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("SHOPIFY_STORE_URL", "outdoor-test.myshopify.com");
    m.insert("SHOPIFY_API_KEY", "shpat_test");
    m
}

#[test]
fn build_app_config_fails_without_store_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHOPIFY_STORE_URL"),
        "expected MissingEnvVar(SHOPIFY_STORE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_api_key() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SHOPIFY_STORE_URL", "outdoor-test.myshopify.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHOPIFY_API_KEY"),
        "expected MissingEnvVar(SHOPIFY_API_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_api_key_as_missing() {
    let mut map = full_env();
    map.insert("SHOPIFY_API_KEY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHOPIFY_API_KEY"));
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("expected Ok");
    assert_eq!(cfg.store_domain, "outdoor-test.myshopify.com");
    assert_eq!(cfg.api_version, "2023-04");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.suppliers_path.to_str(),
        Some("./config/suppliers.yaml")
    );
    assert_eq!(cfg.state_dir.to_str(), Some("./state"));
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.inter_call_delay_ms, 600);
    assert_eq!(cfg.max_retries, 4);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.retry_backoff_max_ms, 30_000);
    assert!(cfg.location_id.is_none());
    assert_eq!(cfg.image_max_bytes, 20 * 1024 * 1024);
    assert_eq!(cfg.image_max_pixels, 5000);
}

#[test]
fn store_url_scheme_and_trailing_slash_are_stripped() {
    let mut map = full_env();
    map.insert("SHOPIFY_STORE_URL", "https://outdoor-test.myshopify.com/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.store_domain, "outdoor-test.myshopify.com");
    assert_eq!(
        cfg.admin_base_url(),
        "https://outdoor-test.myshopify.com/admin/api/2023-04"
    );
}

#[test]
fn inter_call_delay_override() {
    let mut map = full_env();
    map.insert("CATSYNC_INTER_CALL_DELAY_MS", "1000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.inter_call_delay_ms, 1000);
}

#[test]
fn inter_call_delay_invalid() {
    let mut map = full_env();
    map.insert("CATSYNC_INTER_CALL_DELAY_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_INTER_CALL_DELAY_MS"),
        "expected InvalidEnvVar(CATSYNC_INTER_CALL_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn max_retries_invalid() {
    let mut map = full_env();
    map.insert("CATSYNC_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_MAX_RETRIES")
    );
}

#[test]
fn backoff_cap_below_base_is_rejected() {
    let mut map = full_env();
    map.insert("CATSYNC_RETRY_BACKOFF_BASE_MS", "5000");
    map.insert("CATSYNC_RETRY_BACKOFF_MAX_MS", "1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_RETRY_BACKOFF_MAX_MS")
    );
}

#[test]
fn location_id_parsed_when_present() {
    let mut map = full_env();
    map.insert("CATSYNC_LOCATION_ID", "65432198");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.location_id, Some(65_432_198));
}

#[test]
fn location_id_invalid() {
    let mut map = full_env();
    map.insert("CATSYNC_LOCATION_ID", "warehouse");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_LOCATION_ID")
    );
}

#[test]
fn debug_output_redacts_access_token() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("shpat_test"));
    assert!(debug.contains("[redacted]"));
}
