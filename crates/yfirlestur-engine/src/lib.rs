pub mod corrections;
pub mod editing;
pub mod io;
pub mod lookup;
pub mod overlay;
pub mod proofread;
pub mod session;

// Re-export key types for easier usage
pub use corrections::{
    CorrectionId, CorrectionKind, CorrectionList, CorrectionManager, CorrectionRecord,
    CorrectionSink, DiffError, ProofreadBatch, ProofreadReport, diff_paragraph,
};
pub use editing::{
    Cmd, Document, EditError, HostDocument, Mapping, ParagraphId, ParagraphView, Patch,
};
pub use io::*;
pub use lookup::{Lookup, LookupCache};
pub use overlay::{Overlay, OverlayRange, RangeId, RangeMeta, RangeRole};
pub use proofread::{Completed, HttpProofreader, ProofreadError, ProofreadWorker, Proofreader};
pub use session::{Session, SessionOptions};
