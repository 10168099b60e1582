//! Conversation engine — walks a user through the questions for one feature.
//!
//! A session first picks a feature type by keyword, then answers one
//! question per turn. When the last question is answered the answers are
//! validated against the feature schema and emitted as YAML; success and
//! failure both start the session over.

pub mod engine;
pub mod prompts;
pub mod state;

pub use engine::{TurnReply, advance, reset};
pub use prompts::INITIAL_GREETING;
pub use state::{ConversationPhase, SessionState};
