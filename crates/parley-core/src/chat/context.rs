//! Gateway context assembly.
//!
//! Turns a history prefix into the prior turns sent to the gateway. The
//! target user message is always the prompt and never appears among the
//! prior turns.

use parley_types::chat::{Message, MessageRole};
use parley_types::gateway::Turn;

/// Prior turns and prompt for one gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayContext {
    pub prior_turns: Vec<Turn>,
    pub prompt: String,
}

/// Build the gateway context for `target` from its history prefix.
///
/// Blank assistant entries are skipped so no empty model turn reaches the
/// provider.
pub fn build_context(history: &[Message], target: &Message) -> GatewayContext {
    let prior_turns = history
        .iter()
        .filter(|m| m.id != target.id)
        .filter(|m| !(m.role == MessageRole::Assistant && m.content.trim().is_empty()))
        .map(Turn::from)
        .collect();

    GatewayContext {
        prior_turns,
        prompt: target.content.clone(),
    }
}
