//! AI gateway abstractions for Parley.
//!
//! - `AiGateway`: RPITIT trait for concrete provider implementations
//! - `BoxAiGateway`: Object-safe wrapper for dynamic dispatch and injection

pub mod box_gateway;
pub mod provider;
