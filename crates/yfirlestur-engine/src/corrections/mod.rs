//! Correction records and their lifecycle.
//!
//! - **`diff`**: word-level comparison of a paragraph against the corrected text
//! - **`manager`**: paragraph snapshots, purge/install of records and ranges,
//!   accept/select/click handling
//! - **`list`**: the UI-facing collaborator that holds the visible records

pub mod diff;
pub mod list;
pub mod manager;

use std::fmt;

use serde::Serialize;

use crate::editing::ParagraphId;

pub use diff::{DiffError, diff_paragraph};
pub use list::{CorrectionList, CorrectionSink};
pub use manager::{CorrectionManager, ParagraphSnapshot, ProofreadBatch, ProofreadReport};

/// Key of a correction, derived from its paragraph and the span it was found at
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct CorrectionId {
    pub paragraph: ParagraphId,
    pub from: usize,
    pub to: usize,
}

impl CorrectionId {
    pub fn new(paragraph: ParagraphId, from: usize, to: usize) -> Self {
        Self {
            paragraph,
            from,
            to,
        }
    }
}

impl fmt::Display for CorrectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_correction", self.paragraph, self.from, self.to)
    }
}

impl From<CorrectionId> for String {
    fn from(id: CorrectionId) -> Self {
        id.to_string()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// One word replaced by another
    Correction,
}

/// A pending suggested substitution
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CorrectionRecord {
    pub id: CorrectionId,
    #[serde(rename = "correction_type")]
    pub kind: CorrectionKind,
    pub from: usize,
    pub to: usize,
    pub before_text: String,
    pub after_text: String,
    pub context_before: String,
    pub context_after: String,
}

impl CorrectionRecord {
    /// Short "before → after" label
    pub fn summary(&self) -> String {
        format!("{} → {}", self.before_text, self.after_text)
    }
}
