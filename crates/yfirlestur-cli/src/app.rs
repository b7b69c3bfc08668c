use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use yfirlestur_engine::{
    Cmd, CorrectionList, Document, HostDocument, ParagraphView, ProofreadBatch, ProofreadError,
    ProofreadReport, ProofreadWorker, Session, SessionOptions, io,
};

/// Upper bound on how long the event loop waits for input
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Input wait while a proofreading answer may arrive
const IN_FLIGHT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub session: Session<Document, ProofreadWorker, CorrectionList>,
    pub path: PathBuf,
    pub list_state: ListState,
    pub status: String,
    pub dirty: bool,
}

impl App {
    pub fn new(
        document: Document,
        path: PathBuf,
        worker: ProofreadWorker,
        options: SessionOptions,
    ) -> Self {
        let mut session = Session::new(document, worker, CorrectionList::new(), options);
        session.set_selection(1..1);
        Self {
            session,
            path,
            list_state: ListState::default(),
            status: String::new(),
            dirty: false,
        }
    }

    /// Cursor as a document offset
    pub fn cursor(&self) -> usize {
        self.session.document().selection().start
    }

    /// How long the event loop may block before the session needs a tick
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let idle = if self.session.proofreader().in_flight() > 0 {
            IN_FLIGHT_POLL
        } else {
            IDLE_POLL
        };
        self.session
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(idle)
            .min(idle)
    }

    /// Index of the focused correction in document order
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.session.sink().selected()?;
        self.session
            .corrections()
            .iter()
            .position(|r| r.id == selected.id)
    }

    /// Install finished answers, then send a debounced pass if one is due
    pub fn tick(&mut self, now: Instant) {
        self.collect();
        if let Some(batch) = self.session.poll(now) {
            self.dispatch(batch);
        }
    }

    /// Install every answer the worker has ready
    pub fn collect(&mut self) {
        while let Some((batch, response)) = self.session.proofreader().try_recv() {
            let result = self.session.complete(batch, response);
            self.report(result);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('q') if ctrl => return Flow::Quit,
            KeyCode::Char('a') if ctrl => self.accept_selected(now),
            KeyCode::Char('l') if ctrl => self.click(),
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('r') if ctrl => {
                self.session.request_proofread(now);
                self.status = "Proofreading scheduled".to_string();
            }
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => {
                let at = self.cursor();
                self.apply(
                    Cmd::InsertText {
                        at,
                        text: c.to_string(),
                    },
                    now,
                );
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    let range = prev..self.cursor();
                    self.apply(Cmd::DeleteRange { range }, now);
                }
            }
            KeyCode::Delete => {
                if let Some(next) = self.next_boundary() {
                    let range = self.cursor()..next;
                    self.apply(Cmd::DeleteRange { range }, now);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.move_to(prev);
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.next_boundary() {
                    self.move_to(next);
                }
            }
            KeyCode::Up => self.move_vertical(false),
            KeyCode::Down => self.move_vertical(true),
            KeyCode::Home => {
                if let Some(paragraph) = self.current_paragraph() {
                    self.move_to(paragraph.content_range().start);
                }
            }
            KeyCode::End => {
                if let Some(paragraph) = self.current_paragraph() {
                    self.move_to(paragraph.content_range().end);
                }
            }
            KeyCode::Enter => {
                let at = self.cursor();
                self.apply(Cmd::SplitParagraph { at }, now);
                match self.session.confirm_batch() {
                    Some(batch) => self.dispatch(batch),
                    None => self.status = "Nothing changed since last proofreading".to_string(),
                }
            }
            KeyCode::Tab => self.cycle(1),
            KeyCode::BackTab => self.cycle(-1),
            _ => {}
        }
        Flow::Continue
    }

    fn apply(&mut self, cmd: Cmd, now: Instant) {
        match self.session.apply(cmd, now) {
            Ok(_) => self.dirty = true,
            Err(e) => {
                log::warn!("Edit rejected: {e}");
                self.status = format!("Edit rejected: {e}");
            }
        }
    }

    fn dispatch(&mut self, batch: ProofreadBatch) {
        let count = batch.len();
        self.status = match self.session.proofreader().dispatch(batch) {
            Ok(()) => format!("Proofreading {count} paragraphs..."),
            Err(e) => {
                log::error!("{e}");
                format!("Proofreading failed: {e}")
            }
        };
    }

    fn report(&mut self, result: Result<ProofreadReport, ProofreadError>) {
        self.status = match result {
            Ok(report) => {
                let mut status = format!(
                    "{} corrections in {} paragraphs",
                    report.added, report.submitted
                );
                if !report.mismatched.is_empty() {
                    status.push_str(&format!(", {} skipped", report.mismatched.len()));
                }
                if !report.stale.is_empty() {
                    status.push_str(&format!(", {} edited meanwhile", report.stale.len()));
                }
                status
            }
            Err(e) => format!("Proofreading failed: {e}"),
        };
    }

    fn cycle(&mut self, step: isize) {
        self.session.cycle_correction(step);
    }

    fn accept_selected(&mut self, now: Instant) {
        let Some(record) = self.session.sink().selected().cloned() else {
            self.status = "No correction selected".to_string();
            return;
        };
        match self.session.accept_correction(&record, now) {
            Ok(Some(_)) => {
                self.dirty = true;
                self.status = format!("Accepted {}", record.summary());
            }
            Ok(None) => {}
            Err(e) => self.status = format!("Could not accept correction: {e}"),
        }
    }

    fn click(&mut self) {
        if !self.session.handle_click(self.cursor()) {
            self.status = "No correction at cursor".to_string();
        }
    }

    fn save(&mut self) {
        match io::write_document(&self.path, self.session.document()) {
            Ok(()) => {
                self.dirty = false;
                self.status = format!("Saved {}", self.path.display());
            }
            Err(e) => {
                log::error!("Saving {} failed: {e}", self.path.display());
                self.status = format!("Save failed: {e}");
            }
        }
    }

    fn move_to(&mut self, pos: usize) {
        self.session.set_selection(pos..pos);
    }

    /// Paragraph whose text the cursor is in or at the end of
    fn current_paragraph(&self) -> Option<ParagraphView> {
        self.session
            .document()
            .paragraph_at(self.cursor().saturating_sub(1))
    }

    fn prev_boundary(&self) -> Option<usize> {
        let cursor = self.cursor();
        let paragraph = self.current_paragraph()?;
        let column = cursor - paragraph.content_range().start;
        match paragraph.text.get(..column)?.chars().next_back() {
            Some(c) => Some(cursor - c.len_utf8()),
            // Step over the separator onto the end of the previous paragraph
            None if cursor > 1 => Some(cursor - 1),
            None => None,
        }
    }

    fn next_boundary(&self) -> Option<usize> {
        let cursor = self.cursor();
        let paragraph = self.current_paragraph()?;
        let column = cursor - paragraph.content_range().start;
        match paragraph.text.get(column..)?.chars().next() {
            Some(c) => Some(cursor + c.len_utf8()),
            None if cursor < self.session.document().len() => Some(cursor + 1),
            None => None,
        }
    }

    fn move_vertical(&mut self, down: bool) {
        let Some(current) = self.current_paragraph() else {
            return;
        };
        let paragraphs = self.session.document().paragraphs();
        let Some(index) = paragraphs.iter().position(|p| p.id == current.id) else {
            return;
        };
        let target = if down {
            paragraphs.get(index + 1)
        } else {
            index.checked_sub(1).and_then(|i| paragraphs.get(i))
        };
        let Some(target) = target else {
            return;
        };

        let mut column = (self.cursor() - current.content_range().start).min(target.text.len());
        while !target.text.is_char_boundary(column) {
            column -= 1;
        }
        self.move_to(target.content_range().start + column);
    }
}
