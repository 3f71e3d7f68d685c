//! Observability for Parley: tracing subscriber setup and the attribute
//! names used on generative-provider spans.

pub mod genai_attrs;
pub mod tracing_setup;
