pub mod backend;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod state;
pub mod transition;

// Re-export main types for convenience
pub use backend::{ChatBackend, HttpChatBackend, ReplyField, TransportError};
pub use clipboard::{Clipboard, NoClipboard, SystemClipboard};
pub use config::Config;
pub use controller::{ConversationController, PendingRequest, SubmitSkipped};
pub use state::{ChatState, Conversation, Feedback, FeedbackKind, Message, MessageId, Origin, Sender};
pub use transition::{transition, Event, CONNECTIVITY_ERROR, EMPTY_REPLY_PLACEHOLDER, FAILURE_NOTICE};
