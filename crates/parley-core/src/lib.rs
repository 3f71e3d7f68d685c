//! Business logic and repository trait definitions for Parley.
//!
//! This crate defines the "ports" (repository and gateway traits) that the
//! infrastructure layer implements, plus the conversation core: message log,
//! version tracking, and reply regeneration. It depends only on
//! `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod chat;
pub mod event;
pub mod gateway;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
