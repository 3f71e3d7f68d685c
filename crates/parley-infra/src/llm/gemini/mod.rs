//! Google Gemini gateway.
//!
//! Talks to the `generateContent` endpoint of the Generative Language API
//! with a single non-streaming request per reply.

pub mod client;
pub mod types;

pub use client::GeminiGateway;
