pub mod conversation_models;
pub mod conversation_repository;

pub use conversation_models::{Conversation, ParticipantPair};
pub use conversation_repository::{ConversationRepository, ConversationStore};
