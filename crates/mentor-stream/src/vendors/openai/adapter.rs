use futures::stream;
use tracing::debug;

use crate::errors::{MentorError, UpstreamError};
use crate::request::{ChatRequest, Role};
use crate::upstream::{UpstreamAdapter, UpstreamHandle, UpstreamId, UpstreamSignal};

use super::config::OpenAiConfig;

const OPENAI_UPSTREAM: &str = "openai";

/// Upstream adapter that asks an OpenAI-compatible chat endpoint for one
/// complete mentor answer per request.
///
/// The call is non-streaming: the pipeline re-paces the whole answer
/// locally, so the adapter reports `TextReady` once with the full text and
/// then `Completed`.
pub struct OpenAiMentor {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiMentor {
    /// Creates an adapter from explicit configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, MentorError> {
        if config.api_key.trim().is_empty() {
            return Err(MentorError::Config(
                "OpenAI config api_key must not be empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MentorError::Config(format!("failed to build OpenAI client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates an adapter using `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, MentorError> {
        Self::new(OpenAiConfig::from_env()?)
    }
}

#[async_trait::async_trait]
impl UpstreamAdapter for OpenAiMentor {
    fn id(&self) -> UpstreamId {
        UpstreamId::new(OPENAI_UPSTREAM)
    }

    async fn start(&self, request: ChatRequest) -> Result<UpstreamHandle, UpstreamError> {
        let upstream_id = UpstreamId::new(OPENAI_UPSTREAM);
        let body = build_request_body(&request, &self.config.model);
        debug!(request_id = %request.request_id, model = %self.config.model, "starting OpenAI chat completion");

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                UpstreamError::transport(
                    upstream_id.clone(),
                    format!("OpenAI request failed: {e}"),
                )
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(UpstreamError::service(
                upstream_id,
                format!("OpenAI chat request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }

        Ok(UpstreamHandle {
            signals: Box::pin(answer_signal_stream(upstream_id, response)),
        })
    }
}

pub(crate) fn build_request_body(request: &ChatRequest, model: &str) -> serde_json::Value {
    let mut messages = Vec::with_capacity(request.turns.len() + 1);
    if let Some(system_prompt) = request.system_prompt.as_deref() {
        messages.push(serde_json::json!({
            "role": "system",
            "content": system_prompt,
        }));
    }
    for turn in &request.turns {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        messages.push(serde_json::json!({
            "role": role,
            "content": turn.content,
        }));
    }
    serde_json::json!({
        "model": model,
        "messages": messages,
        "stream": false,
    })
}

pub(crate) fn extract_answer_text(response: &serde_json::Value) -> Option<String> {
    response
        .get("choices")?
        .as_array()?
        .iter()
        .find_map(|choice| {
            choice
                .get("message")?
                .get("content")?
                .as_str()
                .map(ToOwned::to_owned)
        })
}

/// Reads the completion body and reports it as one `TextReady` signal
/// followed by `Completed`.
fn answer_signal_stream(
    upstream_id: UpstreamId,
    response: reqwest::Response,
) -> impl futures::Stream<Item = Result<UpstreamSignal, UpstreamError>> + Send {
    enum State {
        Awaiting(UpstreamId, Box<reqwest::Response>),
        Finishing,
        Terminal,
    }

    stream::try_unfold(
        State::Awaiting(upstream_id, Box::new(response)),
        |state| async move {
            match state {
                State::Awaiting(upstream_id, response) => {
                    let value: serde_json::Value = response.json().await.map_err(|e| {
                        UpstreamError::transport(
                            upstream_id.clone(),
                            format!("failed to read OpenAI response body: {e}"),
                        )
                    })?;
                    let text = extract_answer_text(&value).ok_or_else(|| {
                        UpstreamError::protocol(
                            upstream_id.clone(),
                            "OpenAI response carried no message content",
                        )
                    })?;
                    Ok(Some((UpstreamSignal::TextReady { text }, State::Finishing)))
                }
                State::Finishing => Ok(Some((UpstreamSignal::Completed, State::Terminal))),
                State::Terminal => Ok(None),
            }
        },
    )
}
