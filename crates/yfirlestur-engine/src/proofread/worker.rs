use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::corrections::ProofreadBatch;
use crate::proofread::{ProofreadError, Proofreader};

/// A batch together with the service's answer for it
pub type Completed = (ProofreadBatch, Result<Vec<String>, ProofreadError>);

/// Runs a blocking [`Proofreader`] on its own thread.
///
/// Batches go in with [`dispatch`](Self::dispatch) and come back, in the
/// order they were sent, through [`try_recv`](Self::try_recv). The host feeds
/// each one to `Session::complete`. The thread exits when the worker is
/// dropped, after finishing the request it is on.
pub struct ProofreadWorker {
    requests: Sender<ProofreadBatch>,
    responses: Receiver<Completed>,
    in_flight: Cell<usize>,
}

impl ProofreadWorker {
    pub fn spawn<P>(proofreader: P) -> std::io::Result<Self>
    where
        P: Proofreader + Send + 'static,
    {
        let (requests, inbox) = mpsc::channel::<ProofreadBatch>();
        let (outbox, responses) = mpsc::channel::<Completed>();

        thread::Builder::new()
            .name("proofread".to_string())
            .spawn(move || {
                for batch in inbox {
                    let response = proofreader.proofread(&batch.texts());
                    if outbox.send((batch, response)).is_err() {
                        break;
                    }
                }
                log::debug!("Proofreading worker stopped");
            })?;

        Ok(Self {
            requests,
            responses,
            in_flight: Cell::new(0),
        })
    }

    pub fn dispatch(&self, batch: ProofreadBatch) -> Result<(), ProofreadError> {
        log::debug!(
            "Dispatching proofreading batch {} with {} paragraphs",
            batch.id(),
            batch.len()
        );
        self.requests
            .send(batch)
            .map_err(|_| ProofreadError::Unavailable("proofreading worker stopped".to_string()))?;
        self.in_flight.set(self.in_flight.get() + 1);
        Ok(())
    }

    /// A finished batch, if one is ready
    pub fn try_recv(&self) -> Option<Completed> {
        match self.responses.try_recv() {
            Ok(completed) => Some(self.received(completed)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight.set(0);
                None
            }
        }
    }

    /// Wait up to `timeout` for a finished batch
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completed> {
        match self.responses.recv_timeout(timeout) {
            Ok(completed) => Some(self.received(completed)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.in_flight.set(0);
                None
            }
        }
    }

    /// Batches dispatched but not yet received back
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    fn received(&self, completed: Completed) -> Completed {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corrections::{CorrectionList, CorrectionManager};
    use crate::editing::Document;
    use pretty_assertions::assert_eq;

    const WAIT: Duration = Duration::from_secs(5);

    fn upper(paragraphs: &[String]) -> Result<Vec<String>, ProofreadError> {
        Ok(paragraphs.iter().map(|p| p.to_uppercase()).collect())
    }

    fn batch(text: &str) -> ProofreadBatch {
        let doc = Document::from_text(text);
        let mut manager = CorrectionManager::new(&doc);
        manager
            .begin_proofread(&doc, &mut CorrectionList::new())
            .unwrap()
    }

    #[test]
    fn test_batches_come_back_in_order() {
        let worker = ProofreadWorker::spawn(upper).unwrap();
        let first = batch("einn");
        let second = batch("tveir\nþrír");
        let first_id = first.paragraph_ids();

        worker.dispatch(first).unwrap();
        worker.dispatch(second).unwrap();
        assert_eq!(worker.in_flight(), 2);

        let (batch, response) = worker.recv_timeout(WAIT).unwrap();
        assert_eq!(batch.paragraph_ids(), first_id);
        assert_eq!(response.unwrap(), vec!["EINN"]);

        let (_, response) = worker.recv_timeout(WAIT).unwrap();
        assert_eq!(response.unwrap(), vec!["TVEIR", "ÞRÍR"]);
        assert_eq!(worker.in_flight(), 0);
    }

    #[test]
    fn test_failures_are_returned_with_their_batch() {
        let offline = |_: &[String]| -> Result<Vec<String>, ProofreadError> {
            Err(ProofreadError::Status(503))
        };
        let worker = ProofreadWorker::spawn(offline).unwrap();

        worker.dispatch(batch("halló")).unwrap();
        let (batch, response) = worker.recv_timeout(WAIT).unwrap();

        assert_eq!(batch.len(), 1);
        assert!(matches!(response, Err(ProofreadError::Status(503))));
    }

    #[test]
    fn test_try_recv_without_work() {
        let worker = ProofreadWorker::spawn(upper).unwrap();
        assert!(worker.try_recv().is_none());
        assert_eq!(worker.in_flight(), 0);
    }
}
