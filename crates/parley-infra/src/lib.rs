//! Infrastructure layer for Parley.
//!
//! Implements the ports defined in `parley-core`: SQLite storage for
//! conversations, messages, users and API keys, and the Gemini gateway.
//! Also resolves the data directory and loads `config.toml`.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod sqlite;
