//! Position-mapped overlay of annotated document ranges.
//!
//! The overlay is what gets painted over the text: one underline range per
//! pending correction plus at most one highlight. Ranges are remapped through
//! every [`Patch`] the document emits, in the same call that applied the edit,
//! so they never point at text that moved.

use std::ops::Range;

use crate::corrections::CorrectionId;
use crate::editing::{HostDocument, Patch};

/// Identity of a range inside one overlay
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RangeRole {
    /// Underlined word with a pending suggestion
    Correction,
    /// The currently focused correction
    Highlight,
}

/// Payload carried by an overlay range
#[derive(Clone, Debug, PartialEq)]
pub struct RangeMeta {
    pub correction_id: CorrectionId,
    pub role: RangeRole,
    /// Hover text for renderers
    pub tooltip: Option<String>,
}

impl RangeMeta {
    pub fn correction(correction_id: CorrectionId, tooltip: impl Into<String>) -> Self {
        Self {
            correction_id,
            role: RangeRole::Correction,
            tooltip: Some(tooltip.into()),
        }
    }

    pub fn highlight(correction_id: CorrectionId) -> Self {
        Self {
            correction_id,
            role: RangeRole::Highlight,
            tooltip: None,
        }
    }

    pub fn is_highlight(&self) -> bool {
        self.role == RangeRole::Highlight
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayRange {
    id: RangeId,
    pub range: Range<usize>,
    pub meta: RangeMeta,
}

impl OverlayRange {
    pub fn id(&self) -> RangeId {
        self.id
    }

    pub fn from(&self) -> usize {
        self.range.start
    }

    pub fn to(&self) -> usize {
        self.range.end
    }
}

/// Ordered set of annotated ranges over a mutable document
#[derive(Clone, Debug, Default)]
pub struct Overlay {
    ranges: Vec<OverlayRange>,
    next_id: u64,
    doc_len: usize,
}

impl Overlay {
    /// Empty overlay bound to the document's current state
    pub fn create(doc: &impl HostDocument) -> Self {
        Self {
            ranges: Vec::new(),
            next_id: 0,
            doc_len: doc.len(),
        }
    }

    /// Add ranges. Overlaps are allowed; key uniqueness is the caller's concern.
    /// Empty ranges and ranges past the end of the document are ignored.
    pub fn add(&mut self, ranges: impl IntoIterator<Item = (Range<usize>, RangeMeta)>) -> Vec<RangeId> {
        let mut added = Vec::new();
        for (range, meta) in ranges {
            if range.start >= range.end || range.end > self.doc_len {
                log::debug!(
                    "Ignoring overlay range {range:?} outside document of {} bytes",
                    self.doc_len
                );
                continue;
            }
            let id = RangeId(self.next_id);
            self.next_id += 1;
            self.ranges.push(OverlayRange { id, range, meta });
            added.push(id);
        }
        self.sort();
        added
    }

    /// Remove exactly the given ranges, returning how many were present
    pub fn remove(&mut self, ids: &[RangeId]) -> usize {
        let before = self.ranges.len();
        self.ranges.retain(|r| !ids.contains(&r.id));
        before - self.ranges.len()
    }

    /// Ranges intersecting `[from, to)`; with `from == to` the ranges containing
    /// that position. Missing bounds are open.
    pub fn find(&self, from: Option<usize>, to: Option<usize>) -> Vec<&OverlayRange> {
        let start = from.unwrap_or(0);
        let end = to.unwrap_or(usize::MAX);
        self.ranges
            .iter()
            .filter(|r| {
                if start == end {
                    r.range.start <= start && start < r.range.end
                } else {
                    r.range.start < end && start < r.range.end
                }
            })
            .collect()
    }

    /// Ranges whose metadata satisfies the predicate
    pub fn find_by(&self, predicate: impl Fn(&RangeMeta) -> bool) -> Vec<&OverlayRange> {
        self.ranges.iter().filter(|r| predicate(&r.meta)).collect()
    }

    /// Remap every range through an edit.
    ///
    /// A range survives only if its text was carried through the edit
    /// untouched; collapsed or edited ranges are dropped and returned so the
    /// owner can retire whatever they stood for.
    pub fn remap(&mut self, patch: &Patch) -> Vec<OverlayRange> {
        let mapping = patch.mapping();
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.ranges.len());

        for mut range in self.ranges.drain(..) {
            match mapping.map_intact(&range.range) {
                Some(new_range) if !new_range.is_empty() => {
                    range.range = new_range;
                    kept.push(range);
                }
                _ => dropped.push(range),
            }
        }

        self.ranges = kept;
        self.doc_len = patch.new_len();
        self.sort();
        dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn sort(&mut self) {
        self.ranges
            .sort_by(|a, b| a.range.start.cmp(&b.range.start).then(a.id.cmp(&b.id)));
    }
}
