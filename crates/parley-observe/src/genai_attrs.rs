//! OpenTelemetry GenAI Semantic Convention values.
//!
//! Gateway spans carry `gen_ai.operation.name`, `gen_ai.provider.name` and
//! `gen_ai.request.model`, and are named `"{operation} {model}"` (e.g.,
//! `"chat gemini-1.5-flash"`).

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

/// Provider name for the Gemini gateway.
pub const PROVIDER_GEMINI: &str = "gemini";

/// Build a span name following the `"{operation} {model}"` convention.
pub fn span_name(operation: &str, model: &str) -> String {
    format!("{operation} {model}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_name_joins_operation_and_model() {
        assert_eq!(span_name(OP_CHAT, "gemini-1.5-flash"), "chat gemini-1.5-flash");
    }
}
