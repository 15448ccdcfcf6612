use std::sync::Arc;

use futures::StreamExt as _;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::events::ClientEvent;
use crate::pacer::PacedEmitter;
use crate::request::ChatRequest;
use crate::transport::SseTransport;
use crate::upstream::{UpstreamAdapter, UpstreamSignal};

/// Per-request arbiter between upstream signals and client cancellation.
///
/// Owns the transport and the cancellation token for the lifetime of one
/// request and guarantees that at most one terminal frame (`done` or
/// `error`) reaches the client. Replays run one at a time on the signal
/// loop, so a terminal signal is only handled after every started replay
/// has drained.
pub struct StreamCoordinator {
    transport: SseTransport,
    cancel: CancelToken,
    pacer: PacedEmitter,
}

impl StreamCoordinator {
    /// Creates a coordinator with the default pacing.
    pub fn new(transport: SseTransport, cancel: CancelToken) -> Self {
        Self {
            transport,
            cancel,
            pacer: PacedEmitter::new(),
        }
    }

    /// Overrides the pacing used for answer replays.
    pub fn with_pacer(mut self, pacer: PacedEmitter) -> Self {
        self.pacer = pacer;
        self
    }

    /// Starts the upstream call and runs the request to its terminal frame
    /// (or silent close), consuming the coordinator.
    ///
    /// Cancellation never writes a frame by itself; it only suppresses the
    /// writes this loop and the active replay would otherwise perform. The
    /// transport is closed on every exit path.
    pub async fn run(mut self, upstream: Arc<dyn UpstreamAdapter>, request: ChatRequest) {
        let request_id = request.request_id;
        let upstream_id = upstream.id();

        let mut handle = match upstream.start(request).await {
            Ok(handle) => handle,
            Err(err) => {
                debug!(request_id = %request_id, upstream = %upstream_id, error = %err, "upstream failed to start");
                self.finish_with_error(err.message().to_string()).await;
                return;
            }
        };

        loop {
            match handle.signals.next().await {
                Some(Ok(UpstreamSignal::TextReady { text })) => {
                    debug!(request_id = %request_id, upstream = %upstream_id, chars = text.len(), "answer ready, replaying");
                    self.pacer
                        .replay(&text, &mut self.transport, &self.cancel)
                        .await;
                }
                Some(Ok(UpstreamSignal::Completed)) => {
                    debug!(request_id = %request_id, upstream = %upstream_id, "upstream completed");
                    if !self.cancel.is_cancelled() {
                        self.transport.write(&ClientEvent::Done).await;
                    }
                    self.transport.close();
                    return;
                }
                Some(Err(err)) => {
                    debug!(request_id = %request_id, upstream = %upstream_id, error = %err, "upstream failed");
                    self.finish_with_error(err.message().to_string()).await;
                    return;
                }
                None => {
                    debug!(request_id = %request_id, upstream = %upstream_id, "signal stream ended without completion");
                    self.finish_with_error(format!(
                        "upstream ended without completion ({upstream_id})"
                    ))
                    .await;
                    return;
                }
            }
        }
    }

    /// Writes the error frame unless the client already left, then closes.
    async fn finish_with_error(&mut self, message: String) {
        if !self.cancel.is_cancelled() {
            self.transport.write(&ClientEvent::error(message)).await;
        }
        self.transport.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::{CancelHandle, cancel_pair};
    use crate::errors::UpstreamError;
    use crate::request::ChatTurn;
    use crate::transport::{DEFAULT_FRAME_CAPACITY, FrameStream};
    use crate::upstream::{UpstreamHandle, UpstreamId};
    use futures::stream;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct FakeUpstream {
        behavior: FakeBehavior,
    }

    enum FakeBehavior {
        Signals(Vec<Result<UpstreamSignal, UpstreamError>>),
        Channel(std::sync::Mutex<Option<mpsc::UnboundedReceiver<Result<UpstreamSignal, UpstreamError>>>>),
        StartError(UpstreamError),
    }

    #[async_trait::async_trait]
    impl UpstreamAdapter for FakeUpstream {
        fn id(&self) -> UpstreamId {
            UpstreamId::new("fake")
        }

        async fn start(&self, _request: ChatRequest) -> Result<UpstreamHandle, UpstreamError> {
            match &self.behavior {
                FakeBehavior::Signals(signals) => Ok(UpstreamHandle {
                    signals: Box::pin(stream::iter(signals.clone())),
                }),
                FakeBehavior::Channel(rx) => {
                    let rx = rx.lock().expect("receiver lock").take().expect("single start");
                    Ok(UpstreamHandle {
                        signals: Box::pin(stream::unfold(rx, |mut rx| async move {
                            rx.recv().await.map(|signal| (signal, rx))
                        })),
                    })
                }
                FakeBehavior::StartError(err) => Err(err.clone()),
            }
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new(None, vec![ChatTurn::user("hello")]).expect("valid request")
    }

    fn text_ready(text: &str) -> Result<UpstreamSignal, UpstreamError> {
        Ok(UpstreamSignal::TextReady { text: text.into() })
    }

    fn spawn_session(
        behavior: FakeBehavior,
    ) -> (tokio::task::JoinHandle<()>, FrameStream, CancelHandle) {
        let (transport, frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
        let (handle, token) = cancel_pair();
        let coordinator = StreamCoordinator::new(transport, token)
            .with_pacer(PacedEmitter::with_delay(Duration::from_millis(1)));
        let task = tokio::spawn(coordinator.run(Arc::new(FakeUpstream { behavior }), request()));
        (task, frames, handle)
    }

    async fn collect_events(mut frames: FrameStream) -> Vec<ClientEvent> {
        use futures::StreamExt as _;
        let mut events = Vec::new();
        while let Some(Ok(frame)) = frames.next().await {
            let line = std::str::from_utf8(&frame).expect("utf8 frame");
            let json = line
                .strip_prefix("data: ")
                .and_then(|rest| rest.strip_suffix("\n\n"))
                .expect("well-formed frame");
            events.push(serde_json::from_str(json).expect("client event"));
        }
        events
    }

    fn delta_text(events: &[ClientEvent]) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                ClientEvent::Delta { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn terminal_count(events: &[ClientEvent]) -> usize {
        events.iter().filter(|event| event.is_terminal()).count()
    }

    #[tokio::test]
    async fn replays_the_answer_then_sends_done() {
        let (task, frames, _handle) = spawn_session(FakeBehavior::Signals(vec![
            text_ready("Hello world"),
            Ok(UpstreamSignal::Completed),
        ]));
        let events = collect_events(frames).await;
        task.await.expect("session task");

        assert_eq!(
            events,
            vec![
                ClientEvent::delta("Hello "),
                ClientEvent::delta("world"),
                ClientEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn done_waits_for_every_started_replay() {
        let (task, frames, _handle) = spawn_session(FakeBehavior::Signals(vec![
            text_ready("First part. "),
            text_ready("Second part."),
            Ok(UpstreamSignal::Completed),
        ]));
        let events = collect_events(frames).await;
        task.await.expect("session task");

        assert_eq!(delta_text(&events), "First part. Second part.");
        assert_eq!(events.last(), Some(&ClientEvent::Done));
        assert_eq!(terminal_count(&events), 1);
    }

    #[tokio::test]
    async fn failure_becomes_a_single_error_frame() {
        let (task, frames, _handle) = spawn_session(FakeBehavior::Signals(vec![
            text_ready("partial "),
            Err(UpstreamError::service("fake", "quota exceeded", Some(429))),
        ]));
        let events = collect_events(frames).await;
        task.await.expect("session task");

        assert_eq!(delta_text(&events), "partial ");
        assert_eq!(events.last(), Some(&ClientEvent::error("quota exceeded")));
        assert_eq!(terminal_count(&events), 1);
    }

    #[tokio::test]
    async fn start_failure_becomes_a_single_error_frame() {
        let (task, frames, _handle) = spawn_session(FakeBehavior::StartError(
            UpstreamError::transport("fake", "connection refused"),
        ));
        let events = collect_events(frames).await;
        task.await.expect("session task");

        assert_eq!(events, vec![ClientEvent::error("connection refused")]);
    }

    #[tokio::test]
    async fn signal_stream_ending_early_is_a_protocol_failure() {
        let (task, frames, _handle) = spawn_session(FakeBehavior::Signals(vec![]));
        let events = collect_events(frames).await;
        task.await.expect("session task");

        assert_eq!(terminal_count(&events), 1);
        assert!(matches!(
            events.last(),
            Some(ClientEvent::Error { message }) if message.contains("without completion")
        ));
    }

    #[tokio::test]
    async fn cancellation_suppresses_every_later_frame() {
        use futures::StreamExt as _;
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (transport, mut frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
        let (handle, token) = cancel_pair();
        let coordinator = StreamCoordinator::new(transport, token)
            .with_pacer(PacedEmitter::with_delay(Duration::from_millis(50)));
        let behavior = FakeBehavior::Channel(std::sync::Mutex::new(Some(signal_rx)));
        let task = tokio::spawn(coordinator.run(Arc::new(FakeUpstream { behavior }), request()));

        signal_tx.send(text_ready("Hello world")).expect("signal");
        let first = frames.next().await.expect("first frame").expect("bytes");
        assert!(std::str::from_utf8(&first).expect("utf8").contains("Hello "));

        // client walks away mid-replay, then the upstream still completes
        handle.cancel();
        signal_tx.send(Ok(UpstreamSignal::Completed)).expect("signal");
        drop(signal_tx);
        task.await.expect("session task");

        assert!(frames.next().await.is_none(), "no frames after cancellation");
    }

    #[tokio::test]
    async fn failure_after_cancellation_closes_silently() {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (transport, frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
        let (handle, token) = cancel_pair();
        let coordinator = StreamCoordinator::new(transport, token);
        let behavior = FakeBehavior::Channel(std::sync::Mutex::new(Some(signal_rx)));
        let task = tokio::spawn(coordinator.run(Arc::new(FakeUpstream { behavior }), request()));

        handle.cancel();
        signal_tx
            .send(Err(UpstreamError::service("fake", "boom", Some(500))))
            .expect("signal");
        drop(signal_tx);
        task.await.expect("session task");

        let events = collect_events(frames).await;
        assert!(events.is_empty(), "no frames for a post-disconnect failure");
    }
}
