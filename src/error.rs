//! Search error types / 搜索错误类型
//!
//! Every variant is a fetch failure from the controller's point of view:
//! the previous result set stays intact and the next keyword change retries.
//! Superseded responses are not errors and never show up here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search service returned HTTP {0}")]
    Status(u16),

    #[error("Search service error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Search timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid search configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Whether retrying the same request could succeed / 同一请求重试是否可能成功
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Http(_) | SearchError::Timeout(_) => true,
            SearchError::Status(code) => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}
