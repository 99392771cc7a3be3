use crate::app_config::{AppConfig, Environment};
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
/// Decoupled from the process environment so tests can drive it with a map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates can leave keys blank.
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

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("LEADBOT_ENV", "development"))?;

    let bind_addr = parse_addr("LEADBOT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LEADBOT_LOG_LEVEL", "info");
    let knowledge_path = PathBuf::from(or_default(
        "LEADBOT_KNOWLEDGE_PATH",
        "./config/knowledge.yaml",
    ));

    let db_max_connections = parse_u32("LEADBOT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("LEADBOT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("LEADBOT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let primary_model = or_default("LEADBOT_PRIMARY_MODEL", "claude-3-5-haiku-latest");
    let openai_api_key = optional("OPENAI_API_KEY");
    let fallback_model = or_default("LEADBOT_FALLBACK_MODEL", "gpt-4o-mini");
    let llm_timeout_secs = parse_u64("LEADBOT_LLM_TIMEOUT_SECS", "20")?;
    let llm_max_tokens = parse_u32("LEADBOT_LLM_MAX_TOKENS", "600")?;

    let resend_api_key = optional("RESEND_API_KEY");
    let mail_from = or_default("LEADBOT_MAIL_FROM", "Leadbot <noreply@example.com>");
    let sales_email = optional("LEADBOT_SALES_EMAIL");

    let chat_rate_limit = parse_usize("LEADBOT_CHAT_RATE_LIMIT", "20")?;
    if chat_rate_limit == 0 {
        return Err(invalid(
            "LEADBOT_CHAT_RATE_LIMIT",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        knowledge_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        anthropic_api_key,
        primary_model,
        openai_api_key,
        fallback_model,
        llm_timeout_secs,
        llm_max_tokens,
        resend_api_key,
        mail_from,
        sales_email,
        chat_rate_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LEADBOT_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
