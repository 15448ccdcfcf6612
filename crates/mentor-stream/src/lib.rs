//! Streaming delivery pipeline for the interview-practice mentor chat.
//!
//! The upstream model call produces one complete answer per request; this
//! crate replays that answer to the client as a paced server-sent-events
//! stream that stays cancellable the whole way, and guarantees the client
//! sees at most one terminal frame (`done` or `error`).
//!
//! Vendor-specific upstream integrations are namespaced under `vendors::*`.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::StreamExt as _;
//! use mentor_stream::prelude::*;
//! use mentor_stream::vendors::openai::OpenAiMentor;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), MentorError> {
//! let upstream = Arc::new(OpenAiMentor::from_env()?);
//! let request = ChatRequest::new(
//!     Some("You are a supportive interview mentor.".into()),
//!     vec![ChatTurn::user("How do I talk through a design question?")],
//! )?;
//!
//! let (transport, mut frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
//! let (_cancel_handle, cancel_token) = cancel_pair();
//! tokio::spawn(StreamCoordinator::new(transport, cancel_token).run(upstream, request));
//!
//! while let Some(Ok(frame)) = frames.next().await {
//!     print!("{}", String::from_utf8_lossy(&frame));
//! }
//! # Ok(())
//! # }
//! ```

/// Cooperative cancellation pair shared across one request.
pub mod cancel;
/// Per-request arbiter between upstream signals and cancellation.
pub mod coordinator;
/// Public error types used by the pipeline API.
pub mod errors;
/// Outgoing wire events and their framing.
pub mod events;
/// Paced replay of one complete answer.
pub mod pacer;
/// Common imports for typical usage.
pub mod prelude;
/// Validated chat request payload.
pub mod request;
/// Server-sent-events transport for one request.
pub mod transport;
/// Upstream adapter contracts.
pub mod upstream;
/// Vendor-specific upstream integrations.
pub mod vendors;

pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use coordinator::StreamCoordinator;
pub use errors::{MentorError, UpstreamError};
pub use events::ClientEvent;
pub use pacer::{PacedEmitter, WRITE_DELAY};
pub use request::{ChatRequest, ChatTurn, Role};
pub use transport::{DEFAULT_FRAME_CAPACITY, FrameStream, SseTransport};
pub use upstream::{UpstreamAdapter, UpstreamHandle, UpstreamId, UpstreamSignal};
