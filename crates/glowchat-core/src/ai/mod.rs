pub mod chat;
pub mod error;

pub use chat::{parse_reply, ChatClient, RequestParams};
pub use error::{ExchangeError, ExchangeErrorKind};
