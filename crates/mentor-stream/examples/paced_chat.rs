use std::sync::Arc;

use futures::StreamExt as _;
use mentor_stream::prelude::*;
use mentor_stream::vendors::openai::OpenAiMentor;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), MentorError> {
    let upstream = Arc::new(OpenAiMentor::from_env()?);
    let request = ChatRequest::new(
        Some("You are a supportive interview mentor. Keep answers short.".into()),
        vec![ChatTurn::user(
            "Give me one tip for talking through a coding problem.",
        )],
    )?;

    let (transport, mut frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
    let (_cancel_handle, cancel_token) = cancel_pair();
    tokio::spawn(StreamCoordinator::new(transport, cancel_token).run(upstream, request));

    while let Some(Ok(frame)) = frames.next().await {
        print!("{}", String::from_utf8_lossy(&frame));
    }
    Ok(())
}
