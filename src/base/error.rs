//! Error taxonomy for the request path.
//!
//! Startup and plumbing code uses `anyhow` through [`Res`](super::types::Res);
//! the request path uses [`RelayError`] so the webhook handler can tell the
//! failure kinds apart.

use std::fmt;

use thiserror::Error;

/// Longest body excerpt carried in an upstream error.
pub const UPSTREAM_EXCERPT_CHARS: usize = 500;

pub type RelayResult<T> = Result<T, RelayError>;

/// What went wrong talking to an upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Non-success HTTP status.
    Status,
    /// Success status, but the body lacked the expected shape.
    Malformed,
    /// The request never produced a response.
    Transport,
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpstreamKind::Status => "status",
            UpstreamKind::Malformed => "malformed",
            UpstreamKind::Transport => "transport",
        };

        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: missing {}", .missing.join(", "))]
    Config { missing: Vec<&'static str> },

    #[error("Failed to parse inbound body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{service} upstream error ({kind}, status {status:?}): {excerpt}")]
    Upstream {
        service: &'static str,
        kind: UpstreamKind,
        status: Option<u16>,
        excerpt: String,
    },

    #[error("Failed to post message: {0}")]
    Post(String),
}

impl RelayError {
    /// Upstream answered with a non-success status.
    pub fn upstream_status(service: &'static str, status: u16, body: &str) -> Self {
        RelayError::Upstream {
            service,
            kind: UpstreamKind::Status,
            status: Some(status),
            excerpt: excerpt(body, UPSTREAM_EXCERPT_CHARS),
        }
    }

    /// Upstream answered successfully with an unexpected body.
    pub fn upstream_malformed(service: &'static str, body: &str) -> Self {
        RelayError::Upstream {
            service,
            kind: UpstreamKind::Malformed,
            status: Some(200),
            excerpt: excerpt(body, UPSTREAM_EXCERPT_CHARS),
        }
    }

    /// The request failed before a response arrived.
    pub fn upstream_transport(service: &'static str, err: impl fmt::Display) -> Self {
        RelayError::Upstream {
            service,
            kind: UpstreamKind::Transport,
            status: None,
            excerpt: excerpt(&err.to_string(), UPSTREAM_EXCERPT_CHARS),
        }
    }

    pub fn upstream_kind(&self) -> Option<UpstreamKind> {
        match self {
            RelayError::Upstream { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// First `max_chars` characters of `body`, cut on a char boundary.
pub fn excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
