use std::collections::HashMap;
use std::ops::Range;

use crate::corrections::{CorrectionId, CorrectionRecord, CorrectionSink, diff_paragraph};
use crate::editing::{EditError, HostDocument, ParagraphId, ParagraphView, Patch};
use crate::overlay::{Overlay, OverlayRange, RangeId, RangeMeta, RangeRole};
use crate::proofread::{ProofreadError, Proofreader};

/// Last text (and position) a paragraph was proofread against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSnapshot {
    pub text: String,
    pub pos: usize,
}

#[derive(Debug, Clone)]
struct PendingParagraph {
    id: ParagraphId,
    text: String,
}

/// Paragraphs captured for one proofreading request
#[derive(Debug, Clone)]
pub struct ProofreadBatch {
    id: u64,
    paragraphs: Vec<PendingParagraph>,
}

impl ProofreadBatch {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Texts to send, in document order
    pub fn texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(|p| p.text.clone()).collect()
    }

    pub fn paragraph_ids(&self) -> Vec<ParagraphId> {
        self.paragraphs.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Outcome of one proofreading pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofreadReport {
    /// Paragraphs sent to the service
    pub submitted: usize,
    /// Correction records installed
    pub added: usize,
    /// Paragraphs whose corrected text did not line up word for word
    pub mismatched: Vec<ParagraphId>,
    /// Paragraphs edited or removed while the request was in flight
    pub stale: Vec<ParagraphId>,
}

/// Owns the overlay and the paragraph snapshots for one document.
///
/// All operations run to completion synchronously; the only suspension point
/// is between [`begin_proofread`](Self::begin_proofread) and
/// [`complete_proofread`](Self::complete_proofread), during which the
/// document may keep changing as long as every patch is fed to
/// [`handle_document_change`](Self::handle_document_change).
#[derive(Debug)]
pub struct CorrectionManager {
    overlay: Overlay,
    snapshots: HashMap<ParagraphId, ParagraphSnapshot>,
    next_batch: u64,
}

impl CorrectionManager {
    pub fn new(doc: &impl HostDocument) -> Self {
        Self {
            overlay: Overlay::create(doc),
            snapshots: HashMap::new(),
            next_batch: 0,
        }
    }

    /// Current decorations, for painting
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn snapshot(&self, id: ParagraphId) -> Option<&ParagraphSnapshot> {
        self.snapshots.get(&id)
    }

    /// Non-empty paragraph never proofread, or changed since it was
    pub fn needs_proofreading(&self, paragraph: &ParagraphView) -> bool {
        if paragraph.text.trim().is_empty() {
            return false;
        }
        match self.snapshots.get(&paragraph.id) {
            Some(snapshot) => snapshot.text != paragraph.text,
            None => true,
        }
    }

    /// Remap the overlay through an edit. Must be called for every patch the
    /// document produces, whoever caused it. Correction ranges whose text was
    /// edited are retired from the sink as well.
    pub fn handle_document_change(&mut self, patch: &Patch, sink: &mut dyn CorrectionSink) -> usize {
        let dropped = self.overlay.remap(patch);
        for range in &dropped {
            if range.meta.role == RangeRole::Correction {
                log::debug!("Correction {} edited away", range.meta.correction_id);
                sink.remove_correction(&range.meta.correction_id);
            }
        }
        dropped.len()
    }

    /// Find the paragraphs that need proofreading and purge their current
    /// decorations. Returns `None` when nothing has to be sent.
    pub fn begin_proofread(
        &mut self,
        doc: &impl HostDocument,
        sink: &mut dyn CorrectionSink,
    ) -> Option<ProofreadBatch> {
        let pending: Vec<ParagraphView> = doc
            .paragraphs()
            .into_iter()
            .filter(|p| self.needs_proofreading(p))
            .collect();

        if pending.is_empty() {
            log::debug!("No paragraphs changed since last proofreading");
            return None;
        }

        for paragraph in &pending {
            let purged = self.purge_paragraph(paragraph, sink);
            log::debug!(
                "Queued paragraph {} for proofreading, purged {purged} ranges",
                paragraph.id
            );
        }

        let id = self.next_batch;
        self.next_batch += 1;
        Some(ProofreadBatch {
            id,
            paragraphs: pending
                .into_iter()
                .map(|p| PendingParagraph {
                    id: p.id,
                    text: p.text,
                })
                .collect(),
        })
    }

    /// Install the service's answer for a batch.
    ///
    /// On failure nothing is committed: snapshots stay as they were, so the
    /// batch's paragraphs are picked up again by the next pass. Paragraphs
    /// edited while the request was in flight are skipped the same way.
    pub fn complete_proofread(
        &mut self,
        batch: ProofreadBatch,
        response: Result<Vec<String>, ProofreadError>,
        doc: &impl HostDocument,
        sink: &mut dyn CorrectionSink,
    ) -> Result<ProofreadReport, ProofreadError> {
        let corrected = match response {
            Ok(corrected) => corrected,
            Err(e) => {
                log::warn!("Proofreading batch {} failed: {e}", batch.id);
                return Err(e);
            }
        };
        if corrected.len() != batch.len() {
            log::warn!(
                "Proofreading batch {} answered {} paragraphs for {}",
                batch.id,
                corrected.len(),
                batch.len()
            );
            return Err(ProofreadError::LengthMismatch {
                sent: batch.len(),
                received: corrected.len(),
            });
        }

        let mut report = ProofreadReport {
            submitted: batch.len(),
            ..ProofreadReport::default()
        };

        for (pending, corrected_text) in batch.paragraphs.into_iter().zip(corrected) {
            let current = match doc.paragraph(pending.id) {
                Some(current) if current.text == pending.text => current,
                _ => {
                    log::debug!("Paragraph {} changed while in flight", pending.id);
                    report.stale.push(pending.id);
                    continue;
                }
            };

            // A later response for the same paragraph overwrites an earlier one
            self.purge_paragraph(&current, sink);

            match diff_paragraph(current.id, current.pos, &current.text, &corrected_text) {
                Ok(records) => {
                    report.added += records.len();
                    self.install(&records, sink);
                }
                Err(e) => {
                    log::warn!("Skipping paragraph {}: {e}", current.id);
                    report.mismatched.push(current.id);
                }
            }

            self.snapshots.insert(
                current.id,
                ParagraphSnapshot {
                    text: current.text,
                    pos: current.pos,
                },
            );
        }

        log::info!(
            "Proofread {} paragraphs, {} corrections",
            report.submitted,
            report.added
        );
        Ok(report)
    }

    /// Proofread every changed paragraph with a blocking proofreader.
    /// A no-op without a network call when nothing changed.
    pub fn proofread_changed_paragraphs(
        &mut self,
        doc: &impl HostDocument,
        proofreader: &dyn Proofreader,
        sink: &mut dyn CorrectionSink,
    ) -> Result<ProofreadReport, ProofreadError> {
        let Some(batch) = self.begin_proofread(doc, sink) else {
            return Ok(ProofreadReport::default());
        };
        let response = proofreader.proofread(&batch.texts());
        self.complete_proofread(batch, response, doc, sink)
    }

    /// Replace a correction's span with its suggestion.
    ///
    /// Uses the span the overlay currently holds for the correction. Returns
    /// `Ok(None)` without touching anything if the correction is no longer in
    /// the overlay.
    pub fn accept_correction(
        &mut self,
        record: &CorrectionRecord,
        doc: &mut impl HostDocument,
        sink: &mut dyn CorrectionSink,
    ) -> Result<Option<Patch>, EditError> {
        let Some(range) = self.find_range(&record.id) else {
            log::debug!("Correction {} is no longer in the overlay", record.id);
            return Ok(None);
        };

        let paragraph = doc.paragraph(record.id.paragraph);
        let patch = doc.replace(range, &record.after_text)?;

        let ids: Vec<RangeId> = self
            .overlay
            .find_by(|meta| meta.correction_id == record.id)
            .iter()
            .map(|r| r.id())
            .collect();
        self.overlay.remove(&ids);
        self.handle_document_change(&patch, sink);
        sink.remove_correction(&record.id);

        // The paragraph now holds the service's own suggestion; if it was
        // clean before, it is still clean.
        if let Some(before) = paragraph
            && self
                .snapshots
                .get(&before.id)
                .is_some_and(|snapshot| snapshot.text == before.text)
            && let Some(after) = doc.paragraph(before.id)
        {
            self.snapshots.insert(
                after.id,
                ParagraphSnapshot {
                    text: after.text,
                    pos: after.pos,
                },
            );
        }

        Ok(Some(patch))
    }

    /// Move the highlight to the given correction. Returns `false`, leaving no
    /// highlight, when the correction is not in the overlay.
    pub fn select_correction(&mut self, id: &CorrectionId) -> bool {
        self.clear_highlight();
        let Some(range) = self.find_range(id) else {
            return false;
        };
        self.overlay.add([(range, RangeMeta::highlight(*id))]);
        true
    }

    /// Remove the highlight, returning whether there was one
    pub fn clear_highlight(&mut self) -> bool {
        let ids: Vec<RangeId> = self
            .overlay
            .find_by(RangeMeta::is_highlight)
            .iter()
            .map(|r| r.id())
            .collect();
        self.overlay.remove(&ids) > 0
    }

    /// Where the overlay currently places a correction
    pub fn find_range(&self, id: &CorrectionId) -> Option<Range<usize>> {
        self.correction_ranges(id).first().map(|r| r.range.clone())
    }

    /// Correction decorated at a document position
    pub fn correction_at(&self, pos: usize) -> Option<CorrectionId> {
        self.overlay
            .find(Some(pos), Some(pos))
            .into_iter()
            .find(|r| r.meta.role == RangeRole::Correction)
            .map(|r| r.meta.correction_id)
    }

    /// A click at `pos`: selects the correction under it, otherwise drops the
    /// highlight. Returns whether the click was consumed.
    pub fn handle_click(&mut self, pos: usize, sink: &mut dyn CorrectionSink) -> bool {
        if let Some(id) = self.correction_at(pos) {
            sink.select_correction(&id);
            self.select_correction(&id);
            return true;
        }
        self.clear_highlight()
    }

    fn correction_ranges(&self, id: &CorrectionId) -> Vec<&OverlayRange> {
        self.overlay
            .find_by(|meta| meta.role == RangeRole::Correction && meta.correction_id == *id)
    }

    /// Remove every range keyed to the paragraph or lying inside it
    fn purge_paragraph(&mut self, paragraph: &ParagraphView, sink: &mut dyn CorrectionSink) -> usize {
        let span = paragraph.node_range();
        let stale: Vec<(RangeId, CorrectionId, RangeRole)> = self
            .overlay
            .iter()
            .filter(|r| {
                r.meta.correction_id.paragraph == paragraph.id
                    || (span.start <= r.range.start && r.range.end <= span.end)
            })
            .map(|r| (r.id(), r.meta.correction_id, r.meta.role))
            .collect();

        for (_, correction_id, role) in &stale {
            if *role == RangeRole::Correction {
                sink.remove_correction(correction_id);
            }
        }
        let ids: Vec<RangeId> = stale.iter().map(|(id, _, _)| *id).collect();
        self.overlay.remove(&ids)
    }

    fn install(&mut self, records: &[CorrectionRecord], sink: &mut dyn CorrectionSink) {
        for record in records {
            sink.add_correction(record);
        }
        self.overlay.add(records.iter().map(|record| {
            (
                record.from..record.to,
                RangeMeta::correction(record.id, record.summary()),
            )
        }));
    }
}
