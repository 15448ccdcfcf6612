use serde::{Deserialize, Serialize};

/// Outgoing wire event delivered to the mentor chat client.
///
/// A request emits any number of `Delta` frames followed by at most one
/// terminal frame (`Done` or `Error`). The serialized forms are the only
/// three JSON shapes the client ever sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEvent {
    /// Incremental fragment of the answer.
    Delta {
        /// Fragment text, concatenable back into the full answer.
        text: String,
    },
    /// Successful completion, terminal.
    Done,
    /// Failure, terminal.
    Error {
        /// Human-readable failure message.
        message: String,
    },
}

impl ClientEvent {
    /// Creates a delta event from any string-like value.
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    /// Creates an error event from any string-like value.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns true for `Done` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Delta { .. })
    }

    /// Renders the event as one server-sent-events frame: a `data:` line
    /// holding the JSON object, followed by a blank line.
    pub fn to_frame(&self) -> String {
        let json = serde_json::to_string(self)
            .expect("client event serialization should be infallible");
        format!("data: {json}\n\n")
    }
}
