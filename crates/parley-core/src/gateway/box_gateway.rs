//! BoxAiGateway -- object-safe dynamic dispatch wrapper for AiGateway.
//!
//! 1. Define an object-safe `AiGatewayDyn` trait with boxed futures
//! 2. Blanket-impl `AiGatewayDyn` for all `T: AiGateway`
//! 3. `BoxAiGateway` wraps `Box<dyn AiGatewayDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use parley_types::gateway::{GatewayError, Turn};

use super::provider::AiGateway;

/// Object-safe version of [`AiGateway`] with boxed futures.
pub trait AiGatewayDyn: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn generate_boxed<'a>(
        &'a self,
        prior_turns: &'a [Turn],
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>>;
}

impl<T: AiGateway> AiGatewayDyn for T {
    fn name(&self) -> &str {
        AiGateway::name(self)
    }

    fn model(&self) -> &str {
        AiGateway::model(self)
    }

    fn generate_boxed<'a>(
        &'a self,
        prior_turns: &'a [Turn],
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>> {
        Box::pin(self.generate(prior_turns, prompt))
    }
}

/// Type-erased gateway injected into the chat service.
///
/// Since `AiGateway` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxAiGateway` provides equivalent methods that delegate to the
/// inner `AiGatewayDyn` trait object.
pub struct BoxAiGateway {
    inner: Box<dyn AiGatewayDyn + Send + Sync>,
}

impl BoxAiGateway {
    /// Wrap a concrete `AiGateway` in a type-erased box.
    pub fn new<T: AiGateway + 'static>(gateway: T) -> Self {
        Self {
            inner: Box::new(gateway),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    /// Generate a full-text reply for `prompt` given `prior_turns`.
    pub async fn generate(&self, prior_turns: &[Turn], prompt: &str) -> Result<String, GatewayError> {
        self.inner.generate_boxed(prior_turns, prompt).await
    }
}

impl std::fmt::Debug for BoxAiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxAiGateway")
            .field("name", &self.name())
            .field("model", &self.model())
            .finish()
    }
}
