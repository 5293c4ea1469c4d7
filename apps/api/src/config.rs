use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Only malformed values fail startup; every variable has a default or is optional.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent key puts the service in deterministic mode (no LLM calls).
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub llm_timeout_secs: u64,
    pub encryption_enabled: bool,
    pub encryption_key: Option<String>,
    pub snapshot_dir: String,
    pub exit_redirect_url: Option<String>,
    /// Sessions idle longer than this are dropped from memory.
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "1800".to_string())
            .parse::<u64>()
            .context("SESSION_TTL_SECS must be a whole number of seconds")?;
        anyhow::ensure!(session_ttl_secs > 0, "SESSION_TTL_SECS must be greater than zero");

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            encryption_enabled: parse_flag(
                &std::env::var("ENABLE_ENCRYPTION").unwrap_or_default(),
            ),
            encryption_key: optional_env("ENCRYPTION_KEY"),
            snapshot_dir: std::env::var("SNAPSHOT_DIR").unwrap_or_else(|_| "data".to_string()),
            exit_redirect_url: optional_env("EXIT_REDIRECT_URL"),
            session_ttl_secs,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Defaults with no LLM key and encryption off, for unit tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            llm_timeout_secs: 30,
            encryption_enabled: false,
            encryption_key: None,
            snapshot_dir: "data".to_string(),
            exit_redirect_url: None,
            session_ttl_secs: 1800,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

/// Treats unset and blank variables the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_accepts_common_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("yes"));
    }

    #[test]
    fn test_parse_flag_defaults_to_false() {
        assert!(!parse_flag(""));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("enabled-ish"));
    }
}
