//! Data models for precept.

mod config;
mod conversation;
mod error;
mod principle;

pub use config::{ApiConfig, Config, ConfigError, ConstitutionConfig, DatagenConfig};
pub use conversation::{ChatTurn, Conversation};
pub use error::{PreceptError, Result};
pub use principle::{
    Constitution, Principle, PrincipleCategory, HEADING_CATEGORY_KEYWORDS,
};
