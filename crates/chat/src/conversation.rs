use serde::Serialize;

use crate::blocks::MessageTemplate;
use crate::messages::{recommendation_message, user_message, DisplaySettings, Recommendation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User { text: String },
    Assistant { recommendation: Recommendation },
}

impl Turn {
    pub fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedTurn {
    pub role: Role,
    pub message: MessageTemplate,
}

/// Ordered chat history, replayed on every redraw.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::User { text: text.into() });
    }

    pub fn push_recommendation(&mut self, recommendation: Recommendation) {
        self.turns.push(Turn::Assistant { recommendation });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn render(&self, settings: &DisplaySettings) -> Vec<RenderedTurn> {
        self.turns
            .iter()
            .map(|turn| RenderedTurn {
                role: turn.role(),
                message: match turn {
                    Turn::User { text } => user_message(text),
                    Turn::Assistant { recommendation } => {
                        recommendation_message(recommendation, settings)
                    }
                },
            })
            .collect()
    }
}
