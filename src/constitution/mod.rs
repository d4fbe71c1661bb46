//! Source document handling: fetch and parse.

mod fetch;
mod parse;

pub use fetch::fetch_constitution;
pub use parse::{classify_section, parse_constitution};
