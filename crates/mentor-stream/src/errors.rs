use crate::upstream::UpstreamId;

/// Errors reported by an upstream text-generation adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream service returned an application-level failure (HTTP
    /// status, auth, quota, etc.).
    #[error("upstream error ({upstream}): {message}")]
    Service {
        upstream: UpstreamId,
        message: String,
        status_code: Option<u16>,
    },
    /// Transport or I/O toward the upstream failed.
    #[error("upstream transport error ({upstream}): {message}")]
    Transport {
        upstream: UpstreamId,
        message: String,
    },
    /// The upstream response shape or signal sequencing was invalid.
    #[error("upstream protocol error ({upstream}): {message}")]
    Protocol {
        upstream: UpstreamId,
        message: String,
    },
}

impl UpstreamError {
    /// Creates a service-level error.
    pub fn service(
        upstream: impl Into<UpstreamId>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Service {
            upstream: upstream.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(upstream: impl Into<UpstreamId>, message: impl Into<String>) -> Self {
        Self::Transport {
            upstream: upstream.into(),
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(upstream: impl Into<UpstreamId>, message: impl Into<String>) -> Self {
        Self::Protocol {
            upstream: upstream.into(),
            message: message.into(),
        }
    }

    /// Returns the upstream associated with this error.
    pub fn upstream_id(&self) -> &UpstreamId {
        match self {
            Self::Service { upstream, .. }
            | Self::Transport { upstream, .. }
            | Self::Protocol { upstream, .. } => upstream,
        }
    }

    /// Returns the human-readable message for this error.
    ///
    /// This is the text carried by the client-facing `error` frame, so it
    /// omits the upstream prefix of the `Display` form.
    pub fn message(&self) -> &str {
        match self {
            Self::Service { message, .. }
            | Self::Transport { message, .. }
            | Self::Protocol { message, .. } => message,
        }
    }
}

/// Top-level error type for the mentor-stream public API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MentorError {
    /// Invalid adapter or client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid request payload.
    #[error("validation error: {0}")]
    Validation(String),
    /// Upstream failure surfaced outside a running stream.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
