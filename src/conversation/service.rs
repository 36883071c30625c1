use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::{
    completion::CompletionClient,
    language::Language,
    repository::{RoomClaim, RoomRepository},
    room::{Message, Room},
};
use crate::error::AppResult;

/// Sent instead of an empty completion
pub const FALLBACK_REPLY: &str = "Sorry, I can't respond right now.";

/// Drives persona turns over the room store
pub struct ConversationService {
    completion: Arc<dyn CompletionClient>,
    rooms: RoomRepository,
    cadence: usize,
}

impl ConversationService {
    pub fn new(completion: Arc<dyn CompletionClient>, rooms: RoomRepository, cadence: usize) -> Self {
        Self {
            completion,
            rooms,
            cadence,
        }
    }

    pub fn rooms(&self) -> &RoomRepository {
        &self.rooms
    }

    pub fn cadence(&self) -> usize {
        self.cadence
    }

    /// One completion under the language's system prompt
    pub async fn complete(&self, prompt: &str, language: Language) -> AppResult<String> {
        let content = self
            .completion
            .complete(language.system_prompt(), prompt)
            .await?;

        if content.trim().is_empty() {
            warn!("Empty completion, using fallback reply");
            return Ok(FALLBACK_REPLY.to_string());
        }

        Ok(content)
    }

    /// Generates the next turn and returns the messages it added.
    ///
    /// The room stays claimed while the completion runs; the claim is
    /// released if generation fails or the caller goes away.
    #[instrument(skip(self))]
    pub async fn advance(&self, room_id: &str) -> AppResult<Vec<Message>> {
        let (room, claim) = self.rooms.begin_turn(room_id, self.cadence).await?;

        let generated = self
            .generate(&room)
            .await
            .inspect_err(|e| error!("Turn generation failed: {}", e))?;

        self.rooms.finish_turn(claim, generated.clone()).await?;
        info!("💬 Added {} message(s)", generated.len());
        Ok(generated)
    }

    /// Spends a redeemed continuation claim and runs the turn it paid for
    pub async fn continue_after_payment(&self, claim: RoomClaim) -> AppResult<Vec<Message>> {
        let room_id = claim.room_id().to_string();
        self.rooms.unlock_continuation(claim).await?;
        self.advance(&room_id).await
    }

    async fn generate(&self, room: &Room) -> AppResult<Vec<Message>> {
        let lang = room.language;

        if room.messages.is_empty() {
            let opening = self
                .complete(&lang.opening_prompt(&room.ai1_role, &room.topic), lang)
                .await?;
            let reply = self
                .complete(&lang.reply_prompt(&room.ai2_role, &opening), lang)
                .await?;

            return Ok(vec![
                Message::new(room.ai1_role.clone(), opening),
                Message::new(room.ai2_role.clone(), reply),
            ]);
        }

        let speaker = room.next_speaker().to_string();
        let prompt = lang.history_prompt(&speaker, &room.transcript());
        let content = self.complete(&prompt, lang).await?;

        Ok(vec![Message::new(speaker, content)])
    }
}
