//! precept - principle-grounded conversation dataset generation.
//!
//! ## Pipeline
//!
//! 1. **Fetch + Parse**: download the source policy document and extract
//!    categorized principles from its headings, lists, and paragraphs
//! 2. **Generate**: cross principles with scenario archetypes and fan the
//!    pairs out against a chat-completions endpoint under a bounded
//!    concurrency gate, with per-attempt retry and backoff
//! 3. **Postprocess**: validate conversation structure, drop near
//!    duplicates by user-turn fingerprint, persist as JSONL
//!
//! Training, evaluation, and judging of the resulting dataset are left to
//! external services that consume the JSONL output.

pub mod client;
pub mod constitution;
pub mod datagen;
pub mod models;

// Re-exports for convenience
pub use client::{ChatBackend, ChatClient};
pub use constitution::{fetch_constitution, parse_constitution};
pub use datagen::{postprocess_and_save, Generator};
pub use models::{Config, Constitution, Conversation, PreceptError, Principle, Result};
