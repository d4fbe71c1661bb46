//! Parse the source policy document into structured principles.
//!
//! Pure and deterministic: no I/O, never fails. Malformed input degrades
//! to fewer (or zero) principles.

use crate::models::{
    Constitution, Principle, PrincipleCategory, HEADING_CATEGORY_KEYWORDS,
};
use regex::Regex;

/// Model name used by the source document. Rewritten to the target name
/// everywhere except attributions to the document itself.
const SOURCE_MODEL_NAME: &str = "Claude";

/// Candidates shorter than this are discarded as fragments.
const MIN_PRINCIPLE_CHARS: usize = 40;

/// Parse document text into a structured [`Constitution`].
///
/// Sections are split on level 1–3 headings; content before the first
/// heading becomes a "Preamble" section categorized as compliance.
pub fn parse_constitution(
    document: &str,
    target_model_name: &str,
    source_url: &str,
) -> Constitution {
    let mut constitution = Constitution::new(source_url, target_model_name);

    let heading_re = Regex::new(r"(?m)^(#{1,3})\s+(.+)$").expect("heading pattern");

    let headings: Vec<_> = heading_re.captures_iter(document).collect();

    // Preamble: everything before the first heading.
    let preamble_end = headings
        .first()
        .map(|c| c.get(0).expect("whole match").start())
        .unwrap_or(document.len());
    let preamble = &document[..preamble_end];
    if !preamble.trim().is_empty() {
        add_principles(
            &mut constitution,
            preamble,
            "Preamble",
            PrincipleCategory::Compliance,
            target_model_name,
        );
    }

    for (i, caps) in headings.iter().enumerate() {
        let heading = caps.get(2).expect("heading text").as_str().trim();
        let content_start = caps.get(0).expect("whole match").end();
        let content_end = headings
            .get(i + 1)
            .map(|c| c.get(0).expect("whole match").start())
            .unwrap_or(document.len());
        let content = &document[content_start..content_end];

        let category = classify_section(heading);
        add_principles(&mut constitution, content, heading, category, target_model_name);
    }

    constitution
}

/// Map a section heading to a category.
///
/// First keyword found in the lower-cased heading wins; unmatched headings
/// default to compliance.
pub fn classify_section(heading: &str) -> PrincipleCategory {
    let lower = heading.to_lowercase();
    for (keyword, category) in HEADING_CATEGORY_KEYWORDS {
        if lower.contains(keyword) {
            return *category;
        }
    }
    PrincipleCategory::Compliance
}

/// Extract principle candidates from a section's content.
///
/// List items (numbered, `*`, or `-` markers at line start) are collected
/// first; each item runs until the next marker, a blank line, or the end
/// of the block. Only when no list items are found does the block fall
/// back to paragraph extraction.
fn extract_principles_from_block(text: &str) -> Vec<String> {
    let marker_re = Regex::new(r"^(?:\d+\.\s+|\*\s+|-\s+)").expect("marker pattern");

    let mut items: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(m) = marker_re.find(line) {
            if let Some(item) = current.take() {
                items.push(item);
            }
            current = Some(line[m.end()..].to_string());
        } else if line.trim().is_empty() {
            if let Some(item) = current.take() {
                items.push(item);
            }
        } else if let Some(item) = current.as_mut() {
            item.push('\n');
            item.push_str(line);
        }
    }
    if let Some(item) = current.take() {
        items.push(item);
    }

    let mut principles: Vec<String> = items
        .iter()
        .map(|item| clean_principle(item.trim()))
        .filter(|p| is_valid_principle(p))
        .collect();

    if principles.is_empty() {
        let paragraph_re = Regex::new(r"\n\n+").expect("paragraph pattern");
        principles = paragraph_re
            .split(text)
            .map(|para| clean_principle(para.trim()))
            .filter(|p| is_valid_principle(p))
            .collect();
    }

    principles
}

/// Clean up a candidate's text.
fn clean_principle(text: &str) -> String {
    // Leading bold label, with or without trailing colon: "**Truthful**: ..."
    let label_colon_re = Regex::new(r"^\*\*[^*]+\*\*:\s*").expect("label pattern");
    let label_re = Regex::new(r"^\*\*[^*]+\*\*\s*").expect("label pattern");
    let ws_re = Regex::new(r"\s+").expect("whitespace pattern");

    let text = label_colon_re.replace(text, "");
    let text = label_re.replace(&text, "");
    let text = ws_re.replace_all(&text, " ");
    text.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .to_string()
}

/// Filter out headings and short fragments.
fn is_valid_principle(text: &str) -> bool {
    if text.chars().count() < MIN_PRINCIPLE_CHARS {
        return false;
    }
    if text.starts_with('#') {
        return false;
    }
    true
}

/// Substitute the source document's model name with the target name.
///
/// Attributions to the document itself ("Claude's Constitution") are left
/// untouched.
fn replace_model_name(text: &str, target_name: &str) -> String {
    let re = Regex::new(&format!(r"\b{SOURCE_MODEL_NAME}\b('s Constitution)?"))
        .expect("model name pattern");
    re.replace_all(text, |caps: &regex::Captures<'_>| {
        if caps.get(1).is_some() {
            caps.get(0).expect("whole match").as_str().to_string()
        } else {
            target_name.to_string()
        }
    })
    .into_owned()
}

/// Extract, clean, and append principles from one content block, assigning
/// indices from the running sequence length.
fn add_principles(
    constitution: &mut Constitution,
    content: &str,
    section: &str,
    category: PrincipleCategory,
    target_model_name: &str,
) {
    for text in extract_principles_from_block(content) {
        let index = constitution.principles.len();
        constitution.principles.push(Principle {
            text: replace_model_name(&text, target_model_name),
            category,
            section: section.to_string(),
            index,
        });
    }
}
