use tokio::sync::watch;

/// Creates the cancellation pair for one request.
///
/// The handle is fired when the client disconnects; clones of the token are
/// read before every side-effecting step of the pipeline.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Set-once side of the cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Marks the request as cancelled.
    ///
    /// Cancellation is cooperative: in-flight work stops at its next token
    /// check rather than immediately.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Read side of the cancellation pair.
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Returns true once the client is gone.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}
