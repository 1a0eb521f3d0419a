pub mod ai;
pub mod config;
pub mod conversation;
pub mod provider;
pub mod state;
pub mod surface;
pub mod truncation;

// Re-export main types for convenience
pub use ai::{ChatClient, ExchangeError, ExchangeErrorKind, RequestParams};
pub use config::Config;
pub use conversation::{Conversation, PendingReply, Phase, Submission, Turn, APOLOGY};
pub use provider::Provider;
pub use state::{ChatMessage, ChatRole, Transcript};
pub use surface::{ChatView, Entry, EntryKind, Surface};
