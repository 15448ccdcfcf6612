use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mentor_stream::{
    ChatRequest, ChatTurn, DEFAULT_FRAME_CAPACITY, FrameStream, MentorError, SseTransport,
    StreamCoordinator, cancel_pair,
};
use serde::Deserialize;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info};

use crate::state::AppState;

/// Upper bound on the chat payload; anything larger is rejected before the
/// pipeline runs.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/mentor/chat", post(chat))
        .route("/healthz", get(healthz))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Wire shape of the chat payload.
#[derive(Debug, Deserialize)]
struct ChatBody {
    turns: Vec<ChatTurn>,
}

/// Opens the long-lived mentor stream for one validated conversation.
///
/// The response body is the request's frame stream; dropping it (client
/// disconnect) fires the cancellation handle, which the pipeline observes
/// cooperatively.
async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Response {
    let request = match ChatRequest::new(Some(state.system_prompt.to_string()), body.turns) {
        Ok(request) => request,
        Err(err) => return reject(err),
    };
    let request_id = request.request_id;
    info!(request_id = %request_id, turns = request.turns.len(), "mentor chat stream opened");

    let (transport, frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
    let (cancel_handle, cancel_token) = cancel_pair();

    let disconnected = transport.disconnected();
    tokio::spawn(async move {
        disconnected.await;
        debug!(request_id = %request_id, "client stream gone, cancelling");
        cancel_handle.cancel();
    });

    tokio::spawn(
        StreamCoordinator::new(transport, cancel_token).run(state.upstream.clone(), request),
    );

    sse_response(frames)
}

/// Opens the event-stream response around the frame stream.
fn sse_response(frames: FrameStream) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(frames))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn reject(err: MentorError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}
