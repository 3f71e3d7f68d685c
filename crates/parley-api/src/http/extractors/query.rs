//! Query parameter extractors.

use serde::Deserialize;

/// Pagination for `GET /conversations`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// API key passed in the query string, for clients that cannot set headers
/// (browser WebSocket upgrades).
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub api_key: Option<String>,
}
