//! Structured principle types extracted from the source document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Category tag assigned to every extracted principle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PrincipleCategory {
    Safety,
    Ethics,
    Honesty,
    Helpfulness,
    HarmAvoidance,
    Compliance,
    Identity,
    OperatorsUsers,
}

impl PrincipleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safety => "safety",
            Self::Ethics => "ethics",
            Self::Honesty => "honesty",
            Self::Helpfulness => "helpfulness",
            Self::HarmAvoidance => "harm_avoidance",
            Self::Compliance => "compliance",
            Self::Identity => "identity",
            Self::OperatorsUsers => "operators_users",
        }
    }
}

impl std::fmt::Display for PrincipleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section-heading keywords mapped to categories.
///
/// This is a priority list, scanned front to back against the lower-cased
/// heading text; the first keyword found as a substring wins. The order is
/// part of the classification contract and must not be reordered.
pub const HEADING_CATEGORY_KEYWORDS: &[(&str, PrincipleCategory)] = &[
    ("safe", PrincipleCategory::Safety),
    ("ethic", PrincipleCategory::Ethics),
    ("honest", PrincipleCategory::Honesty),
    ("helpful", PrincipleCategory::Helpfulness),
    ("harm", PrincipleCategory::HarmAvoidance),
    ("guideline", PrincipleCategory::Compliance),
    ("identity", PrincipleCategory::Identity),
    ("operator", PrincipleCategory::OperatorsUsers),
    ("user", PrincipleCategory::OperatorsUsers),
    ("principal", PrincipleCategory::OperatorsUsers),
    ("conflict", PrincipleCategory::OperatorsUsers),
    ("mission", PrincipleCategory::Identity),
    ("core value", PrincipleCategory::Ethics),
    ("constitution", PrincipleCategory::Compliance),
    ("approach", PrincipleCategory::Compliance),
    ("instruc", PrincipleCategory::Compliance),
];

/// A single normative principle extracted from the source document.
///
/// Immutable once created. `index` is the principle's position in the
/// whole parse run, assigned at append time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principle {
    /// Cleaned directive text
    pub text: String,

    /// Category of the section this principle came from
    pub category: PrincipleCategory,

    /// Source section heading
    pub section: String,

    /// 0-based position across the whole document
    pub index: usize,
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// A parsed set of principles, in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constitution {
    pub principles: Vec<Principle>,
    pub source_url: String,
    pub target_model_name: String,
}

impl Constitution {
    pub fn new(source_url: impl Into<String>, target_model_name: impl Into<String>) -> Self {
        Self {
            principles: Vec::new(),
            source_url: source_url.into(),
            target_model_name: target_model_name.into(),
        }
    }

    /// Principles belonging to one category, in document order.
    pub fn by_category(&self, category: PrincipleCategory) -> Vec<&Principle> {
        self.principles
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// The set of categories with at least one principle.
    pub fn categories(&self) -> BTreeSet<PrincipleCategory> {
        self.principles.iter().map(|p| p.category).collect()
    }

    pub fn len(&self) -> usize {
        self.principles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Principle> {
        self.principles.iter()
    }
}
