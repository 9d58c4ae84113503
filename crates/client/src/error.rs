//! Fetch error taxonomy.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Non-success HTTP status.
    #[error("request failed: {status} {status_text}")]
    RequestFailed { status: u16, status_text: String },
    /// Body was not the expected `{ "value": [...] }` envelope of list items.
    #[error("parse failed: {0}")]
    ParseFailed(String),
    /// Connection, TLS or timeout fault raised by the HTTP transport.
    #[error("transport: {0}")]
    Transport(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ClientError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::RequestFailed { .. } => "request",
            ClientError::ParseFailed(_) => "parse",
            ClientError::Transport(_) => "transport",
            ClientError::InvalidEndpoint(_) => "endpoint",
        }
    }
}
