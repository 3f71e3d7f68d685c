//! Generative provider implementations of the `AiGateway` port.

pub mod gemini;

use parley_core::gateway::box_gateway::BoxAiGateway;
use parley_types::config::GatewayConfig;
use parley_types::gateway::GatewayError;
use secrecy::SecretString;

use self::gemini::GeminiGateway;

/// Build the configured gateway.
///
/// A missing key does not fail here: the gateway is created and every call
/// reports `MissingCredentials`, so read-only commands keep working.
pub fn create_gateway(
    config: &GatewayConfig,
    api_key: Option<SecretString>,
) -> Result<BoxAiGateway, GatewayError> {
    if api_key.is_none() {
        tracing::warn!(
            env = %config.api_key_env,
            "No gateway API key found; reply generation will fail until it is set"
        );
    }
    Ok(BoxAiGateway::new(GeminiGateway::from_config(config, api_key)?))
}
