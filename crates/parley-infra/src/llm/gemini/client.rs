//! GeminiGateway -- concrete [`AiGateway`] for the Gemini API.
//!
//! The API key is wrapped in [`SecretString`] and only exposed when building
//! the request header. It never appears in Debug output or logs.

use std::time::Duration;

use parley_core::gateway::provider::AiGateway;
use parley_observe::genai_attrs::{OP_CHAT, PROVIDER_GEMINI, span_name};
use parley_types::config::GatewayConfig;
use parley_types::gateway::{GatewayError, Speaker, Turn};
use secrecy::{ExposeSecret, SecretString};
use tracing::{Instrument, debug, info_span};

use super::types::{Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    /// Reported in `MissingCredentials` so the user knows what to set.
    api_key_env: String,
    base_url: String,
    model: String,
}

impl GeminiGateway {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    /// Create a gateway for `model` with the default endpoint.
    pub fn new(api_key: Option<SecretString>, model: String) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            api_key_env: GatewayConfig::default().api_key_env,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    pub fn from_config(
        config: &GatewayConfig,
        api_key: Option<SecretString>,
    ) -> Result<Self, GatewayError> {
        let mut gateway = Self::new(api_key, config.model.clone())?.with_base_url(config.base_url.clone());
        gateway.api_key_env = config.api_key_env.clone();
        Ok(gateway)
    }

    /// Override the base URL (proxies, local emulators).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Prior turns in order, then the prompt as the final user turn.
    fn to_request(prior_turns: &[Turn], prompt: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = prior_turns
            .iter()
            .map(|turn| {
                let role = match turn.speaker {
                    Speaker::User => "user",
                    Speaker::Model => "model",
                };
                Content::text(role, &turn.text)
            })
            .collect();
        contents.push(Content::text("user", prompt));
        GenerateContentRequest { contents }
    }

    async fn send(&self, api_key: &SecretString, body: &GenerateContentRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status.as_u16(), &error_body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Deserialization(format!("failed to parse response: {e}")))?;

        extract_text(&parsed)
    }
}

/// Map a non-2xx response onto a gateway error.
fn map_error_status(status: u16, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 | 403 => GatewayError::AuthenticationFailed,
        // Gemini reports a bad key as 400 INVALID_ARGUMENT.
        400 if detail.contains("API key") => GatewayError::AuthenticationFailed,
        429 => GatewayError::RateLimited,
        _ => GatewayError::Provider {
            message: format!("HTTP {status}: {detail}"),
        },
    }
}

fn extract_text(response: &GenerateContentResponse) -> Result<String, GatewayError> {
    match response.text() {
        Some(text) if !text.trim().is_empty() => {
            debug!(finish_reason = ?response.finish_reason(), chars = text.len(), "Gemini reply received");
            Ok(text)
        }
        _ => match response.block_reason() {
            Some(reason) => Err(GatewayError::Provider {
                message: format!("prompt blocked: {reason}"),
            }),
            None => Err(GatewayError::EmptyResponse),
        },
    }
}

// No Debug derive: the manual impl below omits the key entirely.
impl std::fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("has_key", &self.api_key.is_some())
            .finish()
    }
}

impl AiGateway for GeminiGateway {
    fn name(&self) -> &str {
        PROVIDER_GEMINI
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prior_turns: &[Turn], prompt: &str) -> Result<String, GatewayError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| GatewayError::MissingCredentials(self.api_key_env.clone()))?;

        let body = Self::to_request(prior_turns, prompt);
        let span = info_span!(
            "gen_ai.chat",
            otel.name = %span_name(OP_CHAT, &self.model),
            gen_ai.operation.name = OP_CHAT,
            gen_ai.provider.name = PROVIDER_GEMINI,
            gen_ai.request.model = %self.model,
            parley.context.turns = prior_turns.len(),
        );

        self.send(api_key, &body).instrument(span).await
    }
}
