//! Validate, deduplicate, and persist conversations as JSONL.

use crate::models::{Conversation, PreceptError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Counts reported by a postprocessing run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostprocessStats {
    /// Candidates received
    pub total: usize,
    /// Candidates rejected by validation
    pub invalid: usize,
    /// Validated candidates dropped as duplicates
    pub duplicates: usize,
    /// Records written to the destination
    pub written: usize,
}

/// Check that a conversation has valid structure.
///
/// Valid means: at least two messages, every role in {user, assistant}
/// with non-empty trimmed content, the first role is user, and roles
/// strictly alternate.
pub fn validate_conversation(conversation: &Conversation) -> bool {
    let messages = &conversation.messages;
    if messages.len() < 2 {
        return false;
    }

    for message in messages {
        if message.role != "user" && message.role != "assistant" {
            return false;
        }
        if message.content.trim().is_empty() {
            return false;
        }
    }

    if messages[0].role != "user" {
        return false;
    }
    messages.windows(2).all(|pair| pair[0].role != pair[1].role)
}

/// Content fingerprint over the user turns.
///
/// SHA-256 of the lower-cased, trimmed user messages joined with `|||`.
/// Two conversations with the same user turns collide regardless of
/// assistant content; this is a near-duplicate filter, not equality.
pub fn fingerprint(conversation: &Conversation) -> String {
    let combined = conversation
        .messages
        .iter()
        .filter(|m| m.role == "user")
        .map(|m| m.content.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|||");

    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Validate, deduplicate (first occurrence wins), and save conversations
/// to a newline-delimited JSON file.
///
/// Invalid and duplicate candidates are counted and logged, never fatal;
/// only storage errors abort.
pub fn postprocess_and_save(
    conversations: Vec<Conversation>,
    output_path: &Path,
) -> Result<PostprocessStats> {
    let mut stats = PostprocessStats {
        total: conversations.len(),
        ..Default::default()
    };

    let valid: Vec<Conversation> = conversations
        .into_iter()
        .filter(validate_conversation)
        .collect();
    stats.invalid = stats.total - valid.len();
    if stats.invalid > 0 {
        warn!(count = stats.invalid, "Filtered invalid conversations");
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<Conversation> = Vec::new();
    for conversation in valid {
        if seen.insert(fingerprint(&conversation)) {
            unique.push(conversation);
        }
    }
    stats.duplicates = stats.total - stats.invalid - unique.len();
    if stats.duplicates > 0 {
        warn!(count = stats.duplicates, "Removed duplicate conversations");
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| PreceptError::io("creating output directory", e))?;
    }

    let file =
        File::create(output_path).map_err(|e| PreceptError::io("creating output file", e))?;
    let mut writer = BufWriter::new(file);
    for conversation in &unique {
        let json = serde_json::to_string(conversation)
            .map_err(|e| PreceptError::Internal(format!("Failed to serialize record: {e}")))?;
        writeln!(writer, "{json}").map_err(|e| PreceptError::io("writing output", e))?;
    }
    writer
        .flush()
        .map_err(|e| PreceptError::io("flushing output", e))?;

    stats.written = unique.len();
    info!(
        written = stats.written,
        path = %output_path.display(),
        "Saved dataset"
    );

    Ok(stats)
}
