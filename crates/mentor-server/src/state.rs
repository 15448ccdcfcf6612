use std::sync::Arc;

use mentor_stream::UpstreamAdapter;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn UpstreamAdapter>,
    pub system_prompt: Arc<str>,
}

impl AppState {
    pub fn new(upstream: Arc<dyn UpstreamAdapter>, system_prompt: String) -> Self {
        Self {
            upstream,
            system_prompt: system_prompt.into(),
        }
    }
}
