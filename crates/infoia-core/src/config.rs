use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default; only malformed values are errors. Empty
/// strings count as unset for the optional settings.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_usize(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let database_url = or_default("INFOIA_DATABASE_URL", "sqlite://data/infoia.db");
    let log_level = or_default("INFOIA_LOG_LEVEL", "info");
    let sources_path = optional("INFOIA_SOURCES_PATH").map(PathBuf::from);
    let user_agent = or_default("INFOIA_USER_AGENT", "infoia/0.1 (news-digest)");

    let fetch_timeout_secs = positive_u64("INFOIA_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_max_concurrent = positive_usize("INFOIA_FETCH_MAX_CONCURRENT", "8")?;
    let fetch_max_body_bytes = positive_usize("INFOIA_FETCH_MAX_BODY_BYTES", "10485760")?;
    let lookback_hours = parse_u64("INFOIA_LOOKBACK_HOURS", "24")?;
    let max_items_per_source = positive_usize("INFOIA_MAX_ITEMS_PER_SOURCE", "10")?;

    let llm_api_key = optional("INFOIA_LLM_API_KEY");
    let llm_base_url = or_default("INFOIA_LLM_BASE_URL", "https://api.deepseek.com");
    if !(llm_base_url.starts_with("http://") || llm_base_url.starts_with("https://")) {
        return Err(invalid(
            "INFOIA_LLM_BASE_URL",
            format!("'{llm_base_url}' is not an http(s) URL"),
        ));
    }
    let llm_model = or_default("INFOIA_LLM_MODEL", "deepseek-chat");
    let llm_batch_size = positive_usize("INFOIA_LLM_BATCH_SIZE", "5")?;
    let llm_max_attempts = parse_u32("INFOIA_LLM_MAX_ATTEMPTS", "3")?;
    if llm_max_attempts == 0 {
        return Err(invalid(
            "INFOIA_LLM_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let llm_backoff_base_ms = parse_u64("INFOIA_LLM_BACKOFF_BASE_MS", "1000")?;
    let llm_timeout_secs = positive_u64("INFOIA_LLM_TIMEOUT_SECS", "60")?;
    let llm_max_concurrent = positive_usize("INFOIA_LLM_MAX_CONCURRENT", "2")?;
    let summary_max_words = positive_usize("INFOIA_SUMMARY_MAX_WORDS", "50")?;
    let export_dir = optional("INFOIA_EXPORT_DIR").map(PathBuf::from);

    Ok(AppConfig {
        database_url,
        log_level,
        sources_path,
        user_agent,
        fetch_timeout_secs,
        fetch_max_concurrent,
        fetch_max_body_bytes,
        lookback_hours,
        max_items_per_source,
        llm_api_key,
        llm_base_url,
        llm_model,
        llm_batch_size,
        llm_max_attempts,
        llm_backoff_base_ms,
        llm_timeout_secs,
        llm_max_concurrent,
        summary_max_words,
        export_dir,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
