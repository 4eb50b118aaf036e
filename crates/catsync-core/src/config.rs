use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let store_domain = normalize_store_domain(&require("SHOPIFY_STORE_URL")?);
    let access_token = require("SHOPIFY_API_KEY")?;

    let api_version = or_default("CATSYNC_API_VERSION", "2023-04");
    let log_level = or_default("CATSYNC_LOG_LEVEL", "info");
    let suppliers_path = PathBuf::from(or_default(
        "CATSYNC_SUPPLIERS_PATH",
        "./config/suppliers.yaml",
    ));
    let state_dir = PathBuf::from(or_default("CATSYNC_STATE_DIR", "./state"));

    let request_timeout_secs = parse_u64("CATSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let inter_call_delay_ms = parse_u64("CATSYNC_INTER_CALL_DELAY_MS", "600")?;
    let max_retries = parse_u32("CATSYNC_MAX_RETRIES", "4")?;
    let retry_backoff_base_ms = parse_u64("CATSYNC_RETRY_BACKOFF_BASE_MS", "1000")?;
    let retry_backoff_max_ms = parse_u64("CATSYNC_RETRY_BACKOFF_MAX_MS", "30000")?;
    if retry_backoff_max_ms < retry_backoff_base_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "CATSYNC_RETRY_BACKOFF_MAX_MS".to_string(),
            reason: format!(
                "{retry_backoff_max_ms} is below CATSYNC_RETRY_BACKOFF_BASE_MS ({retry_backoff_base_ms})"
            ),
        });
    }

    let location_id = match lookup("CATSYNC_LOCATION_ID") {
        Ok(raw) if !raw.trim().is_empty() => {
            Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidEnvVar {
                        var: "CATSYNC_LOCATION_ID".to_string(),
                        reason: e.to_string(),
                    })?,
            )
        }
        _ => None,
    };

    let image_max_bytes = parse_u64("CATSYNC_IMAGE_MAX_BYTES", "20971520")?;
    let image_max_pixels = parse_u32("CATSYNC_IMAGE_MAX_PIXELS", "5000")?;

    Ok(AppConfig {
        store_domain,
        access_token,
        api_version,
        log_level,
        suppliers_path,
        state_dir,
        request_timeout_secs,
        inter_call_delay_ms,
        max_retries,
        retry_backoff_base_ms,
        retry_backoff_max_ms,
        location_id,
        image_max_bytes,
        image_max_pixels,
    })
}

/// Reduces `"https://shop.example.com/"` to `"shop.example.com"`.
fn normalize_store_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
