use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::document::SEPARATOR;

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText { at: usize, text: String },
    DeleteRange { range: Range<usize> },
    ReplaceRange { range: Range<usize>, text: String },
    /// Break the paragraph at `at`; the text after it becomes a new paragraph
    SplitParagraph { at: usize },
}

impl Cmd {
    /// Every command is a single replacement of a range by some text
    pub fn as_replacement(&self) -> (Range<usize>, String) {
        match self {
            Cmd::InsertText { at, text } => (*at..*at, text.clone()),
            Cmd::DeleteRange { range } => (range.clone(), String::new()),
            Cmd::ReplaceRange { range, text } => (range.clone(), text.clone()),
            Cmd::SplitParagraph { at } => (*at..*at, SEPARATOR.to_string()),
        }
    }
}

/// Compile a command into a delta over a buffer of `len` bytes
pub(crate) fn compile_command(len: usize, cmd: &Cmd) -> Delta<RopeInfo> {
    let mut builder = Builder::new(len);
    match cmd {
        Cmd::DeleteRange { range } => {
            builder.delete(range.clone());
        }
        _ => {
            let (range, text) = cmd.as_replacement();
            builder.replace(range, Rope::from(text));
        }
    }
    builder.build()
}
