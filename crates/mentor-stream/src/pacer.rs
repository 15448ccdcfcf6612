use std::time::Duration;

use crate::cancel::CancelToken;
use crate::events::ClientEvent;
use crate::transport::SseTransport;

/// Delay between two paced writes.
pub const WRITE_DELAY: Duration = Duration::from_millis(15);

/// Replays one complete answer as a sequence of small `delta` writes so the
/// client sees it arrive at a human reading pace.
#[derive(Clone, Debug)]
pub struct PacedEmitter {
    delay: Duration,
}

impl Default for PacedEmitter {
    fn default() -> Self {
        Self { delay: WRITE_DELAY }
    }
}

impl PacedEmitter {
    /// Creates an emitter with the default inter-write delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an emitter with an explicit inter-write delay.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    /// Replays `text` to the transport as `delta` frames.
    ///
    /// The token is checked before every write; once it is set the remaining
    /// runs are dropped, leaving the client with a strict prefix of the
    /// answer at a run boundary. An uncancelled replay delivers fragments
    /// whose ordered concatenation equals `text` exactly.
    pub async fn replay(&self, text: &str, transport: &mut SseTransport, cancel: &CancelToken) {
        let runs = split_runs(text);
        let last = runs.len() - 1;
        for (index, run) in runs.iter().enumerate() {
            if cancel.is_cancelled() {
                return;
            }
            transport.write(&ClientEvent::delta(*run)).await;
            if index < last {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}

/// Splits `text` into word-preserving runs: each run is a maximal stretch of
/// non-whitespace characters followed by its trailing whitespace. Leading
/// whitespace sticks to the first run and an input without words is a single
/// run, so the runs always concatenate back to `text`.
fn split_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut seen_word = false;
    let mut prev_was_space = false;
    for (index, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        if seen_word && prev_was_space && !is_space {
            runs.push(&text[start..index]);
            start = index;
            seen_word = false;
        }
        seen_word |= !is_space;
        prev_was_space = is_space;
    }
    runs.push(&text[start..]);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::transport::DEFAULT_FRAME_CAPACITY;
    use futures::StreamExt as _;

    fn fragments(frames: Vec<bytes::Bytes>) -> Vec<String> {
        frames
            .iter()
            .map(|frame| {
                let line = std::str::from_utf8(frame).expect("utf8 frame");
                let json = line
                    .strip_prefix("data: ")
                    .and_then(|rest| rest.strip_suffix("\n\n"))
                    .expect("well-formed frame");
                match serde_json::from_str(json).expect("client event") {
                    ClientEvent::Delta { text } => text,
                    other => panic!("unexpected event: {other:?}"),
                }
            })
            .collect()
    }

    async fn collect_frames(mut frames: crate::transport::FrameStream) -> Vec<bytes::Bytes> {
        let mut out = Vec::new();
        while let Some(Ok(frame)) = frames.next().await {
            out.push(frame);
        }
        out
    }

    #[test]
    fn splits_words_with_their_trailing_whitespace() {
        assert_eq!(split_runs("Hello world"), vec!["Hello ", "world"]);
        assert_eq!(split_runs("a  b\tc\n"), vec!["a  ", "b\t", "c\n"]);
    }

    #[test]
    fn leading_whitespace_sticks_to_the_first_run() {
        assert_eq!(split_runs("  Hi there"), vec!["  Hi ", "there"]);
    }

    #[test]
    fn wordless_input_is_a_single_run() {
        assert_eq!(split_runs(""), vec![""]);
        assert_eq!(split_runs("   "), vec!["   "]);
    }

    #[test]
    fn runs_concatenate_back_to_the_input() {
        for text in ["Hello world", "  spaced   out  ", "one", "a\nb\r\nc", "ç très bien"] {
            assert_eq!(split_runs(text).concat(), text);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn uncancelled_replay_delivers_the_exact_text() {
        let (mut transport, frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
        let (_handle, token) = cancel_pair();
        let text = "The key is to narrate your thinking out loud.";

        let replay = tokio::spawn(async move {
            PacedEmitter::new().replay(text, &mut transport, &token).await;
            transport.close();
        });
        let frames = collect_frames(frames).await;
        replay.await.expect("replay task");

        assert_eq!(fragments(frames).concat(), text);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_runs_between_writes_but_not_after_the_last() {
        let (mut transport, frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
        let (_handle, token) = cancel_pair();

        let started = tokio::time::Instant::now();
        let replay = tokio::spawn(async move {
            PacedEmitter::new().replay("a b c", &mut transport, &token).await;
            let elapsed = started.elapsed();
            transport.close();
            elapsed
        });
        let frames = collect_frames(frames).await;
        let elapsed = replay.await.expect("replay task");

        assert_eq!(fragments(frames), vec!["a ", "b ", "c"]);
        assert_eq!(elapsed, WRITE_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_replay_at_a_run_boundary() {
        let (mut transport, mut frames) = SseTransport::channel(DEFAULT_FRAME_CAPACITY);
        let (handle, token) = cancel_pair();

        let replay = tokio::spawn(async move {
            PacedEmitter::new()
                .replay("Hello world again", &mut transport, &token)
                .await;
            transport.close();
        });

        let first = frames.next().await.expect("first frame").expect("bytes");
        handle.cancel();
        replay.await.expect("replay task");

        assert_eq!(fragments(vec![first]), vec!["Hello "]);
        assert!(frames.next().await.is_none(), "no writes after cancellation");
    }
}
