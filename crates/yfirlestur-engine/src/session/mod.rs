//! Document-change coordinator.
//!
//! A [`Session`] ties one document to its correction manager and decides when
//! proofreading runs: debounced after ordinary edits, immediately on confirm,
//! never in reaction to an accepted correction. Time is always passed in, so
//! the host event loop owns the clock.
//!
//! Hosts that can wait on the network call [`Session::tick`] and
//! [`Session::confirm`]. Hosts that must not block take the batch from
//! [`Session::poll`] or [`Session::confirm_batch`], send it wherever they like
//! (see [`ProofreadWorker`](crate::proofread::ProofreadWorker)) and hand the
//! answer to [`Session::complete`], editing freely in between.

pub mod timers;

use std::ops::Range;
use std::time::{Duration, Instant};

use crate::corrections::{
    CorrectionId, CorrectionList, CorrectionManager, CorrectionRecord, CorrectionSink,
    ProofreadBatch, ProofreadReport,
};
use crate::editing::{Cmd, Document, EditError, HostDocument, Patch};
use crate::overlay::Overlay;
use crate::proofread::{ProofreadError, Proofreader};

pub use timers::{Debouncer, SuppressionWindow};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(3000);
pub const DEFAULT_SUPPRESSION: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub suppression: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            suppression: DEFAULT_SUPPRESSION,
        }
    }
}

pub struct Session<D, P, S> {
    document: D,
    manager: CorrectionManager,
    proofreader: P,
    sink: S,
    debounce: Debouncer,
    suppression: SuppressionWindow,
}

impl<D, P, S> Session<D, P, S>
where
    D: HostDocument,
    S: CorrectionSink,
{
    pub fn new(document: D, proofreader: P, sink: S, options: SessionOptions) -> Self {
        let manager = CorrectionManager::new(&document);
        Self {
            document,
            manager,
            proofreader,
            sink,
            debounce: Debouncer::new(options.debounce),
            suppression: SuppressionWindow::new(options.suppression),
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn proofreader(&self) -> &P {
        &self.proofreader
    }

    pub fn manager(&self) -> &CorrectionManager {
        &self.manager
    }

    /// The overlay to paint over the current document
    pub fn decorations(&self) -> &Overlay {
        self.manager.overlay()
    }

    /// Apply an edit and run change handling for it
    pub fn apply(&mut self, cmd: Cmd, now: Instant) -> Result<Patch, EditError> {
        let patch = self.document.apply(cmd)?;
        self.manager.handle_document_change(&patch, &mut self.sink);
        self.on_change(now);
        Ok(patch)
    }

    pub fn edit(&mut self, range: Range<usize>, text: &str, now: Instant) -> Result<Patch, EditError> {
        self.apply(
            Cmd::ReplaceRange {
                range,
                text: text.to_string(),
            },
            now,
        )
    }

    /// Debounced proofreading, as after an edit
    pub fn request_proofread(&mut self, now: Instant) {
        self.debounce.schedule(now);
    }

    /// Advance timers. When a debounced pass falls due and something changed,
    /// returns the batch to send; its decorations are already purged.
    pub fn poll(&mut self, now: Instant) -> Option<ProofreadBatch> {
        if self.advance(now) {
            self.begin()
        } else {
            None
        }
    }

    /// Start a pass right away, dropping any pending debounced one
    pub fn confirm_batch(&mut self) -> Option<ProofreadBatch> {
        self.debounce.cancel();
        self.begin()
    }

    /// Install the answer for a batch from [`poll`](Self::poll) or
    /// [`confirm_batch`](Self::confirm_batch). Paragraphs edited since the
    /// batch was taken are skipped and stay eligible for the next pass.
    pub fn complete(
        &mut self,
        batch: ProofreadBatch,
        response: Result<Vec<String>, ProofreadError>,
    ) -> Result<ProofreadReport, ProofreadError> {
        self.manager
            .complete_proofread(batch, response, &self.document, &mut self.sink)
    }

    /// Earliest instant at which the timers have something to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.suppression.expires_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_proofread_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppression.is_active(now)
    }

    /// Apply a suggestion. The resulting edit does not schedule proofreading.
    /// Returns `Ok(None)` if the correction is already gone.
    pub fn accept_correction(
        &mut self,
        record: &CorrectionRecord,
        now: Instant,
    ) -> Result<Option<Patch>, EditError> {
        let accepted = self
            .manager
            .accept_correction(record, &mut self.document, &mut self.sink)?;
        match accepted {
            Some(patch) => {
                self.suppression.arm(now);
                self.on_change(now);
                Ok(Some(patch))
            }
            None => Ok(None),
        }
    }

    /// Focus a correction in both the overlay and the sink
    pub fn select_correction(&mut self, id: &CorrectionId) -> bool {
        let found = self.manager.select_correction(id);
        if found {
            self.sink.select_correction(id);
        }
        found
    }

    pub fn handle_click(&mut self, pos: usize) -> bool {
        self.manager.handle_click(pos, &mut self.sink)
    }

    fn begin(&mut self) -> Option<ProofreadBatch> {
        self.manager.begin_proofread(&self.document, &mut self.sink)
    }

    /// Close an expired suppression window; true if the debounce fired
    fn advance(&mut self, now: Instant) -> bool {
        if self.suppression.expire(now) {
            log::debug!("Suppression window closed");
        }
        self.debounce.fire(now)
    }

    fn on_change(&mut self, now: Instant) {
        if self.suppression.is_active(now) {
            log::debug!("Change notification suppressed");
            self.debounce.cancel();
            self.suppression.extend(now);
        } else {
            self.debounce.schedule(now);
        }
    }
}

/// Blocking variants for hosts that can wait on the proofreader
impl<D, P, S> Session<D, P, S>
where
    D: HostDocument,
    P: Proofreader,
    S: CorrectionSink,
{
    /// Proofread right away, dropping any pending debounced pass
    pub fn confirm(&mut self, _now: Instant) -> Result<ProofreadReport, ProofreadError> {
        let batch = self.confirm_batch();
        self.run(batch)
    }

    /// Advance timers. Returns the result of a debounced pass if one ran.
    pub fn tick(&mut self, now: Instant) -> Option<Result<ProofreadReport, ProofreadError>> {
        if !self.advance(now) {
            return None;
        }
        let batch = self.begin();
        Some(self.run(batch))
    }

    fn run(&mut self, batch: Option<ProofreadBatch>) -> Result<ProofreadReport, ProofreadError> {
        let Some(batch) = batch else {
            return Ok(ProofreadReport::default());
        };
        let response = self.proofreader.proofread(&batch.texts());
        self.complete(batch, response)
    }
}

impl<D, P> Session<D, P, CorrectionList>
where
    D: HostDocument,
{
    /// Pending corrections ordered by where the overlay currently puts them
    pub fn corrections(&self) -> Vec<&CorrectionRecord> {
        self.sink
            .in_document_order(|id| self.manager.find_range(id).map(|range| range.start))
    }

    /// Focus the correction `step` places away from the focused one, wrapping
    pub fn cycle_correction(&mut self, step: isize) -> Option<CorrectionId> {
        let manager = &self.manager;
        let id = self
            .sink
            .cycle(step, |id| manager.find_range(id).map(|range| range.start))?;
        self.select_correction(&id);
        Some(id)
    }
}

impl<P, S> Session<Document, P, S>
where
    S: CorrectionSink,
{
    pub fn set_selection(&mut self, selection: Range<usize>) {
        self.document.set_selection(selection);
    }
}
