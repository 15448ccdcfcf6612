use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::events::ClientEvent;

/// Default frame buffer size between the coordinator and the HTTP response.
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

/// Write side of one request's server-sent-events channel.
///
/// `write` and `close` never fail: once the stream is closed locally or the
/// client side is gone, both become no-ops. A write that raced ahead of a
/// disconnect is absorbed here instead of erroring, which lets cancellation
/// checks elsewhere stay best-effort.
pub struct SseTransport {
    tx: Option<mpsc::Sender<Bytes>>,
}

impl SseTransport {
    /// Creates a transport and the frame stream the HTTP layer responds
    /// with.
    ///
    /// The connection preamble (content type, cache and buffering headers)
    /// is emitted by the HTTP layer when it opens the response around the
    /// returned [`FrameStream`].
    pub fn channel(capacity: usize) -> (SseTransport, FrameStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, FrameStream { rx })
    }

    /// Frames and sends one event.
    ///
    /// Returns whether the frame was handed to the client stream. A write
    /// after [`close`](Self::close) or after the client disconnected
    /// returns false without error.
    pub async fn write(&mut self, event: &ClientEvent) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        if tx.send(Bytes::from(event.to_frame())).await.is_err() {
            // receiver gone: stop holding the channel open
            self.tx = None;
            return false;
        }
        true
    }

    /// Terminates the stream. Idempotent.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Returns a future that resolves once the client side of the channel
    /// is gone, used to fire the request's cancellation handle.
    pub fn disconnected(&self) -> impl Future<Output = ()> + Send + 'static {
        let tx = self.tx.clone();
        async move {
            if let Some(tx) = tx {
                tx.closed().await;
            }
        }
    }
}

/// Read side handed to the HTTP layer; yields framed events as bytes.
pub struct FrameStream {
    rx: mpsc::Receiver<Bytes>,
}

impl futures::Stream for FrameStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}
