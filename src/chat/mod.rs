mod prompt;
mod session;

pub use prompt::{CHAT_SYSTEM_INSTRUCTION, opening_greeting};
pub use session::{
    ConversationSession, DEFAULT_REQUEST_TIMEOUT, Role, SessionError, SessionReply, Turn,
};
