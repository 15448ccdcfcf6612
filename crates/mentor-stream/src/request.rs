use crate::errors::MentorError;

/// Speaker of one conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The candidate practicing the interview.
    User,
    /// The mentor's earlier replies.
    Assistant,
}

/// One turn of the mentor conversation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    /// Creates a candidate turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a mentor turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Validated conversation payload handed to the upstream adapter.
///
/// Built only through [`ChatRequest::new`], so the pipeline can assume the
/// payload was approved before any stream state is created.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatRequest {
    /// Id used to correlate log lines for one stream.
    pub request_id: uuid::Uuid,
    /// Mentor persona instructions; blank prompts are dropped.
    pub system_prompt: Option<String>,
    /// Conversation turns in order, ending with the candidate's message.
    pub turns: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Validates and builds a request.
    pub fn new(
        system_prompt: Option<String>,
        turns: Vec<ChatTurn>,
    ) -> Result<Self, MentorError> {
        if turns.is_empty() {
            return Err(MentorError::Validation(
                "at least one conversation turn is required".into(),
            ));
        }
        if turns.iter().any(|turn| turn.content.trim().is_empty()) {
            return Err(MentorError::Validation(
                "turn content must not be empty".into(),
            ));
        }
        if turns.last().map(|turn| turn.role) != Some(Role::User) {
            return Err(MentorError::Validation(
                "the final turn must come from the user".into(),
            ));
        }
        Ok(Self {
            request_id: uuid::Uuid::new_v4(),
            system_prompt: system_prompt.filter(|prompt| !prompt.trim().is_empty()),
            turns,
        })
    }
}
