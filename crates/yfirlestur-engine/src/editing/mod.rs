/*!
 * # Editing Core Module
 *
 * The host document the correction overlay is laid over.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The entire document is stored in a single **`xi_rope::Rope`** buffer
 * - Each paragraph is encoded as a `'\n'` separator followed by its text, so a
 *   paragraph's position is the offset of its separator and its text begins one
 *   byte later
 * - All offsets are UTF-8 byte offsets
 *
 * ### 2. Command-Based Editing
 * - All edits are represented as **Commands** (`Cmd` enum) that compile to **Deltas**
 * - Applying a command returns a **`Patch`**: the change notification carrying the
 *   delta, which doubles as the position-mapping function
 *
 * ### 3. Stable Paragraph IDs
 * - Every separator carries a `ParagraphId` that survives edits to the text
 *   around it; an explicit id-to-index map is rebuilt after each edit
 *
 * ### 4. Host Capability Trait
 * - `HostDocument` is all the correction subsystem relies on, so other editors can
 *   supply their own document model
 *
 * ## Module Structure
 *
 * - **`document`**: `Document` type and the `HostDocument` trait
 * - **`commands`**: `Cmd` enum and delta compilation
 * - **`patch`**: change notification and `Mapping`
 */

pub mod commands;
pub mod document;
pub mod patch;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use commands::Cmd;
pub use document::{Document, HostDocument, ParagraphView};
pub use patch::{Mapping, Patch};

/// Stable identifier of a paragraph, assigned by the document
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParagraphId(pub Uuid);

impl ParagraphId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParagraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Edit range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },
    #[error("Edit range ends at {end} but the document is {len} bytes long")]
    OutOfBounds { end: usize, len: usize },
    #[error("Edit would remove the start of the document")]
    DocumentStart,
    #[error("Offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}
