use catsync_engine::PlatformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus { status: u16, url: String, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid header value for access token")]
    InvalidToken,

    #[error("{0}")]
    Missing(String),
}

impl From<ShopifyError> for PlatformError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::RateLimited { retry_after_secs } => {
                PlatformError::RateLimited { retry_after_secs }
            }
            ShopifyError::UnexpectedStatus { status, body, .. } if (400..500).contains(&status) => {
                PlatformError::Validation {
                    status,
                    message: body,
                }
            }
            ShopifyError::UnexpectedStatus { status, body, .. } => PlatformError::Transient {
                status: Some(status),
                message: body,
            },
            ShopifyError::Http(e) => PlatformError::Transient {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            e @ (ShopifyError::Deserialize { .. }
            | ShopifyError::InvalidToken
            | ShopifyError::Missing(_)) => PlatformError::InvalidResponse(e.to_string()),
        }
    }
}
