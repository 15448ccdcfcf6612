mod chat;
mod config;
mod logging;
mod state;

use std::sync::Arc;

use anyhow::Context as _;
use mentor_stream::vendors::openai::{OpenAiConfig, OpenAiMentor};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_env();
    logging::init();

    let settings = config::Settings::from_env()?;
    let upstream = OpenAiMentor::new(
        OpenAiConfig::new(&settings.openai_api_key)
            .base_url(&settings.openai_base_url)
            .model(&settings.openai_model),
    )
    .context("failed to build the OpenAI upstream adapter")?;

    let state = state::AppState::new(Arc::new(upstream), settings.mentor_system_prompt.clone());
    let app = chat::router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!(addr = %settings.bind_addr, model = %settings.openai_model, "mentor server listening");
    axum::serve(listener, app)
        .await
        .context("server exited with an error")?;
    Ok(())
}
