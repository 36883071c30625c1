pub mod completion;
pub mod language;
pub mod repository;
pub mod room;
pub mod service;

pub use completion::{CompletionClient, CompletionConfig, OpenAiClient};
pub use language::Language;
pub use repository::{RoomClaim, RoomRepository};
pub use room::{Message, Room};
pub use service::ConversationService;
