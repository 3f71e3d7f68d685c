//! Conversation core: ordered message log, version tracking, context
//! assembly, and reply regeneration.
//!
//! `ChatRepository` is the storage port; `ChatService` is the entry point
//! used by the CLI and the REST API.

pub mod context;
pub mod lock;
pub mod log;
pub mod regenerate;
pub mod repository;
pub mod service;
pub mod version;
