use crate::app_config::AppConfig;
use crate::schema::{DestinationSchema, DEFAULT_FALLBACK_COLUMNS};
use crate::ConfigError;

const DEFAULT_SERVER_URL: &str = "https://api-sg.aliexpress.com/sync";
const DEFAULT_USER_AGENT: &str = "affsync/0.1 (affiliate-collector)";

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
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let app_key = require("AFFSYNC_APP_KEY")?;
    let app_secret = require("AFFSYNC_APP_SECRET")?;
    let supabase_url = require("SUPABASE_URL")?;
    let supabase_key = require("SUPABASE_KEY")?;
    let supabase_table = require("SUPABASE_TABLE")?;

    let server_url = or_default("AFFSYNC_SERVER_URL", DEFAULT_SERVER_URL);
    let log_level = or_default("AFFSYNC_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("AFFSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("AFFSYNC_USER_AGENT", DEFAULT_USER_AGENT);
    let page_delay_ms = parse_u64("AFFSYNC_PAGE_DELAY_MS", "500")?;
    let batch_delay_ms = parse_u64("AFFSYNC_BATCH_DELAY_MS", "500")?;

    let fallback_schema = match lookup("AFFSYNC_FALLBACK_COLUMNS") {
        Ok(raw) => parse_column_list(&raw)?,
        Err(_) => DestinationSchema::from_columns(DEFAULT_FALLBACK_COLUMNS.iter().copied()),
    };

    Ok(AppConfig {
        app_key,
        app_secret,
        server_url,
        supabase_url,
        supabase_key,
        supabase_table,
        log_level,
        request_timeout_secs,
        user_agent,
        page_delay_ms,
        batch_delay_ms,
        fallback_schema,
    })
}

/// Parse a comma-separated column list. Blank entries are skipped; a list with
/// no columns at all is rejected.
fn parse_column_list(raw: &str) -> Result<DestinationSchema, ConfigError> {
    let schema = DestinationSchema::from_columns(
        raw.split(',').map(str::trim).filter(|c| !c.is_empty()),
    );
    if schema.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "AFFSYNC_FALLBACK_COLUMNS".to_string(),
            reason: "no column names given".to_string(),
        });
    }
    Ok(schema)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
