use std::fmt;
use std::pin::Pin;

use crate::errors::UpstreamError;
use crate::request::ChatRequest;

/// Stable identifier for an upstream adapter implementation (for example
/// `openai`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct UpstreamId(pub String);

impl UpstreamId {
    /// Creates an upstream id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the upstream id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpstreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UpstreamId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UpstreamId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Signal reported by a started upstream call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamSignal {
    /// A produced answer payload is ready for delivery.
    TextReady { text: String },
    /// The call finished successfully, terminal.
    Completed,
}

/// Boxed signal stream produced by a started upstream call.
///
/// Zero or more `TextReady` items precede exactly one terminal item: either
/// `Completed` or an `Err`, which is the failure signal.
pub type SignalStream =
    Pin<Box<dyn futures::Stream<Item = Result<UpstreamSignal, UpstreamError>> + Send + 'static>>;

/// Handle for one started upstream call.
pub struct UpstreamHandle {
    pub signals: SignalStream,
}

/// Contract implemented by upstream text-generation integrations.
///
/// An adapter is started exactly once per request and reports its progress
/// through the returned signal stream.
#[async_trait::async_trait]
pub trait UpstreamAdapter: Send + Sync {
    /// Returns the stable adapter id.
    fn id(&self) -> UpstreamId;

    /// Starts the upstream call for a validated request.
    async fn start(&self, request: ChatRequest) -> Result<UpstreamHandle, UpstreamError>;
}
