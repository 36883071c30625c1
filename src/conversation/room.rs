use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::Language;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A conversation between two personas on one topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub ai1_role: String,
    pub ai2_role: String,
    pub topic: String,
    pub language: Language,
    pub messages: Vec<Message>,
    /// Message count at which a continuation payment was accepted
    pub unlocked_at: Option<usize>,
    #[serde(skip)]
    pub generating: bool,
    /// A continuation payment for the current due point is being redeemed
    #[serde(skip)]
    pub continuation_claimed: bool,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        id: String,
        ai1_role: String,
        ai2_role: String,
        topic: String,
        language: Language,
    ) -> Self {
        Self {
            id,
            ai1_role,
            ai2_role,
            topic,
            language,
            messages: Vec::new(),
            unlocked_at: None,
            generating: false,
            continuation_claimed: false,
            created_at: Utc::now(),
        }
    }

    /// The persona that did not speak last
    pub fn next_speaker(&self) -> &str {
        match self.messages.last() {
            Some(last) if last.role == self.ai1_role => &self.ai2_role,
            _ => &self.ai1_role,
        }
    }

    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The opening pair is free; after it, every `cadence` messages need a
    /// continuation payment before the next turn.
    pub fn requires_payment(&self, cadence: usize) -> bool {
        if cadence == 0 {
            return false;
        }

        let len = self.messages.len();
        let exchanged = len.saturating_sub(2);

        exchanged > 0 && exchanged % cadence == 0 && self.unlocked_at != Some(len)
    }

    pub fn unlock_continuation(&mut self) {
        self.unlocked_at = Some(self.messages.len());
        self.continuation_claimed = false;
    }
}
