//! Global configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`GlobalConfig`]. Falls back to defaults when the file is missing or
//! malformed. Also resolves the gateway API key from the environment.

use std::path::Path;

use parley_types::config::GlobalConfig;
use secrecy::SecretString;

/// Consulted when the configured variable is unset.
pub const FALLBACK_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`GlobalConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - `history_limit` is floored at 1.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(mut config) => {
            config.history_limit = config.history_limit.max(1);
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the gateway API key: the configured variable first, then
/// [`FALLBACK_API_KEY_ENV`]. Empty values count as unset.
pub fn resolve_api_key(config: &GlobalConfig) -> Option<SecretString> {
    resolve_api_key_with(config, |name| std::env::var(name).ok())
}

fn resolve_api_key_with(
    config: &GlobalConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    [config.gateway.api_key_env.as_str(), FALLBACK_API_KEY_ENV]
        .into_iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.gateway.model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
history_limit = 8

[gateway]
model = "gemini-2.0-flash"
timeout_secs = 0

[server]
port = 8080
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.history_limit, 8);
        assert_eq!(config.gateway.model, "gemini-2.0-flash");
        assert_eq!(config.gateway.timeout_secs, 0);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn load_global_config_floors_history_limit() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "history_limit = 0\n")
            .await
            .unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.history_limit, 1);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is [[ not toml")
            .await
            .unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.history_limit, 20);
    }

    #[test]
    fn api_key_prefers_configured_variable() {
        let config = GlobalConfig::default();
        let key = resolve_api_key_with(&config, |name| match name {
            "GOOGLE_GENERATIVE_AI_API_KEY" => Some("primary".to_string()),
            "GEMINI_API_KEY" => Some("fallback".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "primary");
    }

    #[test]
    fn api_key_falls_back_and_ignores_blank() {
        let config = GlobalConfig::default();
        let key = resolve_api_key_with(&config, |name| match name {
            "GOOGLE_GENERATIVE_AI_API_KEY" => Some("  ".to_string()),
            "GEMINI_API_KEY" => Some("fallback".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "fallback");

        assert!(resolve_api_key_with(&config, |_| None).is_none());
    }
}
