//! HTTP/REST API layer for Parley.
//!
//! Axum-based REST API at `/api/v1/` with API key authentication,
//! envelope response format, CORS, and a WebSocket event feed.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
