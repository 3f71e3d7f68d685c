//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley service:
//! users, conversations, versioned messages, gateway turns, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod user;
