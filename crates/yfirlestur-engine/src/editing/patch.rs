use std::ops::Range;

use xi_rope::delta::{DeltaElement, Transformer};
use xi_rope::{Delta, RopeInfo};

/// Result of applying a command: the change notification handed to everything
/// that keeps positions into the document.
pub struct Patch {
    pub(crate) delta: Delta<RopeInfo>,
    pub version: u64,
}

impl Patch {
    /// Position-mapping function for this edit
    pub fn mapping(&self) -> Mapping<'_> {
        Mapping { delta: &self.delta }
    }

    /// Length of the document before the edit
    pub fn old_len(&self) -> usize {
        self.delta.base_len
    }

    /// Length of the document after the edit
    pub fn new_len(&self) -> usize {
        self.delta.new_document_len()
    }
}

impl std::fmt::Debug for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patch")
            .field("old_len", &self.old_len())
            .field("new_len", &self.new_len())
            .field("version", &self.version)
            .finish()
    }
}

/// Maps old-document offsets to new-document offsets through a single edit
#[derive(Clone, Copy)]
pub struct Mapping<'a> {
    delta: &'a Delta<RopeInfo>,
}

impl<'a> Mapping<'a> {
    pub fn new(delta: &'a Delta<RopeInfo>) -> Self {
        Self { delta }
    }

    /// Map a position. With `after` set, text inserted exactly at `pos` ends up
    /// before the mapped position.
    pub fn map(&self, pos: usize, after: bool) -> usize {
        Transformer::new(self.delta).transform(pos, after)
    }

    /// Map a range whose text must survive unchanged.
    ///
    /// Returns the new range only when a single copied segment of the delta
    /// covers the whole old range, i.e. none of its bytes were deleted and
    /// nothing was inserted strictly inside it.
    pub fn map_intact(&self, range: &Range<usize>) -> Option<Range<usize>> {
        let mut new_offset = 0;
        for el in &self.delta.els {
            match el {
                DeltaElement::Copy(from, to) => {
                    if *from <= range.start && range.end <= *to {
                        let start = new_offset + (range.start - from);
                        return Some(start..start + range.len());
                    }
                    new_offset += to - from;
                }
                DeltaElement::Insert(node) => {
                    new_offset += node.len();
                }
            }
        }
        None
    }

    /// Whether the single byte at `pos` was carried through the edit
    pub fn survives(&self, pos: usize) -> Option<usize> {
        self.map_intact(&(pos..pos + 1)).map(|range| range.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xi_rope::Rope;
    use xi_rope::delta::Builder;

    fn replace(len: usize, range: Range<usize>, text: &str) -> Delta<RopeInfo> {
        let mut builder = Builder::new(len);
        builder.replace(range, Rope::from(text));
        builder.build()
    }

    #[test]
    fn test_map_shifts_positions_after_insertion() {
        let delta = replace(20, 5..5, "abc");
        let mapping = Mapping::new(&delta);

        assert_eq!(mapping.map(2, true), 2);
        assert_eq!(mapping.map(10, true), 13);
        // Insertion exactly at the position: bias decides the side
        assert_eq!(mapping.map(5, true), 8);
        assert_eq!(mapping.map(5, false), 5);
    }

    #[test]
    fn test_map_intact_keeps_untouched_range() {
        let delta = replace(20, 2..4, "");
        let mapping = Mapping::new(&delta);

        assert_eq!(mapping.map_intact(&(10..13)), Some(8..11));
        assert_eq!(mapping.map_intact(&(0..2)), Some(0..2));
    }

    #[test]
    fn test_map_intact_rejects_touched_range() {
        let deletion = replace(20, 11..12, "");
        assert_eq!(Mapping::new(&deletion).map_intact(&(10..13)), None);

        let insertion = replace(20, 11..11, "x");
        assert_eq!(Mapping::new(&insertion).map_intact(&(10..13)), None);
    }

    #[test]
    fn test_map_intact_allows_insertion_at_boundaries() {
        let at_start = replace(20, 10..10, "xy");
        assert_eq!(Mapping::new(&at_start).map_intact(&(10..13)), Some(12..15));

        let at_end = replace(20, 13..13, "xy");
        assert_eq!(Mapping::new(&at_end).map_intact(&(10..13)), Some(10..13));
    }
}
