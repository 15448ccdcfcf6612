use std::env;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a supportive technical interview mentor. \
Give focused, encouraging guidance without solving the whole problem for the candidate.";

/// Loads `.env` if present so local runs pick up keys without exporting them.
pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Runtime settings for the mentor server.
#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub mentor_system_prompt: String,
}

impl Settings {
    /// Reads settings from the environment, failing fast on a missing key.
    pub fn from_env() -> anyhow::Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        if openai_api_key.trim().is_empty() {
            anyhow::bail!("missing OPENAI_API_KEY for the mentor upstream");
        }
        Ok(Self {
            bind_addr: env_or("MENTOR_BIND_ADDR", "127.0.0.1:8787"),
            openai_api_key,
            openai_base_url: env_or("MENTOR_OPENAI_BASE_URL", "https://api.openai.com"),
            openai_model: env_or("MENTOR_OPENAI_MODEL", "gpt-4o-mini"),
            mentor_system_prompt: env_or("MENTOR_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_blank() {
        assert_eq!(env_or("MENTOR_TEST_UNSET_VARIABLE", "fallback"), "fallback");
    }
}
