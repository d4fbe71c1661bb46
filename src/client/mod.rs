//! Generation service client.

mod chat;

pub use chat::{ChatBackend, ChatClient, CompletionResponse, Message};
