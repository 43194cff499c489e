use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {status} body={body}")]
    UnexpectedStatus { status: StatusCode, body: String },
    #[error("response did not match contract: {0}")]
    Decode(String),
}

/// Coarse failure classes the grid reacts to. Both degrade to the offline indicator; the
/// distinction only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkUnreachable,
    MalformedResponse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkUnreachable => "network_unreachable",
            FailureKind::MalformedResponse => "malformed_response",
        }
    }
}

impl WireError {
    /// Build an `UnexpectedStatus` from a raw code (used by fakes that never touch reqwest).
    pub fn status(code: u16, body: impl Into<String>) -> Self {
        WireError::UnexpectedStatus {
            status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            WireError::Http(err) if err.is_decode() => FailureKind::MalformedResponse,
            WireError::Http(_) => FailureKind::NetworkUnreachable,
            WireError::UnexpectedStatus { .. } | WireError::Decode(_) => {
                FailureKind::MalformedResponse
            }
        }
    }
}
