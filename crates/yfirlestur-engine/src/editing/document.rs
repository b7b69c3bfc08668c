use std::collections::HashMap;
use std::ops::Range;

use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::{Cmd, EditError, Mapping, ParagraphId, Patch};

/// Byte that opens every paragraph in the buffer
pub(crate) const SEPARATOR: char = '\n';

/// Read-only view of one paragraph at the time it was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphView {
    pub id: ParagraphId,
    /// Offset of the paragraph's opening separator
    pub pos: usize,
    pub text: String,
}

impl ParagraphView {
    /// Byte range of the paragraph's text in document coordinates
    pub fn content_range(&self) -> Range<usize> {
        let start = self.pos + 1;
        start..start + self.text.len()
    }

    /// Range from the opening separator to the end of the text
    pub fn node_range(&self) -> Range<usize> {
        self.pos..self.pos + 1 + self.text.len()
    }
}

/// What the correction subsystem needs from the editor that owns the text
pub trait HostDocument {
    /// All paragraphs in document order
    fn paragraphs(&self) -> Vec<ParagraphView>;

    /// Look a paragraph up by its identifier
    fn paragraph(&self, id: ParagraphId) -> Option<ParagraphView>;

    /// Apply an edit and return the change notification
    fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError>;

    /// Text between two document offsets
    fn slice(&self, range: Range<usize>) -> String;

    /// Document length in bytes, including paragraph separators
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.paragraphs().iter().all(|p| p.text.is_empty())
    }

    fn replace(&mut self, range: Range<usize>, text: &str) -> Result<Patch, EditError> {
        self.apply(Cmd::ReplaceRange {
            range,
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ParagraphEntry {
    id: ParagraphId,
    pos: usize,
}

/// Paragraph document backed by a single xi-rope buffer.
///
/// The buffer is the concatenation of `"\n" + text` for every paragraph, so
/// offset 0 always holds the first separator and a paragraph's text starts one
/// byte after its position. Paragraph identities are attached to separators and
/// carried through every edit; an id-to-index map is rebuilt alongside.
///
/// ```rust
/// # use yfirlestur_engine::editing::{Cmd, Document, HostDocument};
/// let mut doc = Document::from_text("Fyrsta málsgrein\nÖnnur");
/// let first = doc.paragraphs()[0].id;
///
/// doc.apply(Cmd::InsertText { at: 1, text: "Hér er ".to_string() }).unwrap();
///
/// let paragraph = doc.paragraph(first).unwrap();
/// assert_eq!(paragraph.text, "Hér er Fyrsta málsgrein");
/// ```
pub struct Document {
    pub(crate) buffer: Rope,
    pub(crate) selection: Range<usize>,
    pub(crate) version: u64,
    paragraphs: Vec<ParagraphEntry>,
    index: HashMap<ParagraphId, usize>,
}

impl Document {
    /// Build a document from plain text, one paragraph per line
    pub fn from_text(text: &str) -> Self {
        let mut content = String::with_capacity(text.len() + 1);
        content.push(SEPARATOR);
        content.push_str(text);
        let buffer = Rope::from(content.as_str());
        let len = buffer.len();

        let paragraphs = separator_offsets(&content)
            .into_iter()
            .map(|pos| ParagraphEntry {
                id: ParagraphId::new(),
                pos,
            })
            .collect();

        let mut doc = Self {
            buffer,
            selection: len..len,
            version: 0,
            paragraphs,
            index: HashMap::new(),
        };
        doc.rebuild_index();
        doc
    }

    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    /// Plain text content: paragraphs joined by newlines
    pub fn to_plain_text(&self) -> String {
        let text = self.buffer.to_string();
        text.strip_prefix(SEPARATOR).unwrap_or(&text).to_string()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_plain_text().into_bytes()
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Set the selection, clamped to the document after the leading separator
    pub fn set_selection(&mut self, selection: Range<usize>) {
        let len = self.buffer.len();
        let start = selection.start.clamp(1, len);
        let end = selection.end.clamp(start, len);
        self.selection = start..end;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Paragraph containing the given document offset
    pub fn paragraph_at(&self, pos: usize) -> Option<ParagraphView> {
        let index = match self.paragraphs.binary_search_by(|entry| entry.pos.cmp(&pos)) {
            Ok(index) => index,
            Err(0) => return None,
            Err(index) => index - 1,
        };
        Some(self.view(index))
    }

    fn view(&self, index: usize) -> ParagraphView {
        let entry = &self.paragraphs[index];
        let end = self
            .paragraphs
            .get(index + 1)
            .map(|next| next.pos)
            .unwrap_or_else(|| self.buffer.len());
        ParagraphView {
            id: entry.id,
            pos: entry.pos,
            text: self.slice(entry.pos + 1..end),
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .paragraphs
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i))
            .collect();
    }

    fn validate_range(&self, range: &Range<usize>, text: &str) -> Result<(), EditError> {
        let len = self.buffer.len();
        if range.start > range.end {
            return Err(EditError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > len {
            return Err(EditError::OutOfBounds { end: range.end, len });
        }
        // Offset 0 is the first paragraph's separator; it can be replaced only
        // by text that starts a paragraph itself.
        if range.start == 0 && !(range.is_empty() && text.starts_with(SEPARATOR)) {
            return Err(EditError::DocumentStart);
        }
        for offset in [range.start, range.end] {
            if offset < len && !self.buffer.is_codepoint_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }

    /// Carry paragraph identities through a delta.
    ///
    /// Paragraphs before and after the edited region keep their entries (the
    /// latter shifted). Only the region the delta rewrote is rescanned for
    /// separators: one copied through the edit keeps its id, one that only
    /// exists in inserted text gets a fresh id.
    fn transform_paragraphs(&mut self, delta: &Delta<RopeInfo>) {
        let mapping = Mapping::new(delta);
        let (region, new_len) = delta.summary();
        let (start, end) = region.start_end();

        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut survivors: HashMap<usize, ParagraphId> = HashMap::new();
        for entry in self.paragraphs.drain(..) {
            if entry.pos < start {
                before.push(entry);
            } else if entry.pos >= end {
                after.push(ParagraphEntry {
                    id: entry.id,
                    pos: entry.pos - (end - start) + new_len,
                });
            } else if let Some(new_pos) = mapping.survives(entry.pos) {
                survivors.insert(new_pos, entry.id);
            }
        }

        let rewritten = self.buffer.slice_to_cow(start..start + new_len);
        let inside: Vec<ParagraphEntry> = separator_offsets(&rewritten)
            .into_iter()
            .map(|offset| {
                let pos = start + offset;
                ParagraphEntry {
                    id: survivors.remove(&pos).unwrap_or_default(),
                    pos,
                }
            })
            .collect();

        self.paragraphs = before.into_iter().chain(inside).chain(after).collect();
        self.rebuild_index();
    }
}

impl HostDocument for Document {
    fn paragraphs(&self) -> Vec<ParagraphView> {
        (0..self.paragraphs.len()).map(|i| self.view(i)).collect()
    }

    fn paragraph(&self, id: ParagraphId) -> Option<ParagraphView> {
        self.index.get(&id).map(|&i| self.view(i))
    }

    /// Apply command to document.
    ///
    /// The command is compiled to a delta, the buffer is updated, paragraph
    /// identities and the selection are carried through the same delta and the
    /// version is bumped. The returned patch holds the delta so every other
    /// holder of positions can remap in the same event.
    fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let (range, text) = cmd.as_replacement();
        self.validate_range(&range, &text)?;

        let delta = crate::editing::commands::compile_command(self.buffer.len(), &cmd);

        self.buffer = delta.apply(&self.buffer);
        self.transform_paragraphs(&delta);

        let mapping = Mapping::new(&delta);
        let start = mapping.map(self.selection.start, true);
        let end = mapping.map(self.selection.end, true).max(start);
        self.selection = start..end;

        self.version += 1;

        Ok(Patch {
            delta,
            version: self.version,
        })
    }

    fn slice(&self, range: Range<usize>) -> String {
        let doc_len = self.buffer.len();

        // Clamp range to document bounds to prevent xi-rope panic
        let start = range.start.min(doc_len);
        let end = range.end.min(doc_len).max(start);

        self.buffer.slice_to_cow(start..end).into_owned()
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            selection: self.selection.clone(),
            version: self.version,
            paragraphs: self.paragraphs.clone(),
            index: self.index.clone(),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("text", &self.to_plain_text())
            .field("paragraphs", &self.paragraphs.len())
            .field("selection", &self.selection)
            .field("version", &self.version)
            .finish()
    }
}

fn separator_offsets(content: &str) -> Vec<usize> {
    content
        .char_indices()
        .filter(|(_, c)| *c == SEPARATOR)
        .map(|(i, _)| i)
        .collect()
}
