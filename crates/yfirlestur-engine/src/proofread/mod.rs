//! Remote proofreading.
//!
//! The service is opaque: it takes an ordered list of paragraph texts and
//! returns the corrected texts in the same order. All diffing happens here.

pub mod http;
pub mod worker;

pub use http::HttpProofreader;
pub use worker::{Completed, ProofreadWorker};

#[derive(Debug, thiserror::Error)]
pub enum ProofreadError {
    #[error("Proofreading request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Proofreading service answered with HTTP status {0}")]
    Status(u16),
    #[error("Sent {sent} paragraphs for proofreading but received {received}")]
    LengthMismatch { sent: usize, received: usize },
    #[error("Proofreading service unavailable: {0}")]
    Unavailable(String),
}

/// Something that turns paragraphs into corrected paragraphs
pub trait Proofreader {
    fn proofread(&self, paragraphs: &[String]) -> Result<Vec<String>, ProofreadError>;
}

impl<F> Proofreader for F
where
    F: Fn(&[String]) -> Result<Vec<String>, ProofreadError>,
{
    fn proofread(&self, paragraphs: &[String]) -> Result<Vec<String>, ProofreadError> {
        self(paragraphs)
    }
}
