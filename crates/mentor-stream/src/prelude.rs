//! Common imports for typical pipeline usage.
//!
//! This module intentionally exports the most frequently used request,
//! transport, and coordinator types so application code needs fewer import
//! lines.
pub use crate::{
    CancelHandle, CancelToken, ChatRequest, ChatTurn, ClientEvent, DEFAULT_FRAME_CAPACITY,
    FrameStream, MentorError, PacedEmitter, Role, SseTransport, StreamCoordinator,
    UpstreamAdapter, UpstreamError, UpstreamId, cancel_pair,
};
