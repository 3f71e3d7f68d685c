//! AiGateway trait definition.
//!
//! The single seam between the conversation core and a generative-text
//! provider. Implementations live in parley-infra (e.g., `GeminiGateway`);
//! tests substitute scripted fakes.

use parley_types::gateway::{GatewayError, Turn};

/// Trait for generative-text backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait AiGateway: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generate a full-text reply.
    ///
    /// `prior_turns` is the ordered conversation context, oldest first, and
    /// never contains `prompt` itself.
    fn generate(
        &self,
        prior_turns: &[Turn],
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;
}
