//! Repository trait definitions (ports) outside the conversation core.
//!
//! These traits define the storage interface that the infrastructure layer
//! (parley-infra) implements. The core crate never depends on any specific
//! storage technology.

pub mod user;
