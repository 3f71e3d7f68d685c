//! Global configuration types for Parley.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! history window sent to the gateway, gateway settings, and the HTTP
//! listener. All fields have sensible defaults.

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Maximum number of messages (ending at the target message) sent to the
    /// gateway as context.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_history_limit() -> u32 {
    20
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            gateway: GatewayConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Generative provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on a single gateway call. `0` disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Environment variable holding the provider API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "GOOGLE_GENERATIVE_AI_API_KEY".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// HTTP listener settings for `parley serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
