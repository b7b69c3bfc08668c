use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use crate::proofread::{ProofreadError, Proofreader};

/// Request body of the correction endpoint
#[derive(Debug, Serialize)]
pub(crate) struct CorrectTextRequest<'a> {
    pub text: &'a [String],
}

/// Blocking client for a `POST {"text": [...]}` -> `[...]` correction endpoint
#[derive(Debug, Clone)]
pub struct HttpProofreader {
    client: Client,
    endpoint: String,
}

impl HttpProofreader {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProofreadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Proofreader for HttpProofreader {
    fn proofread(&self, paragraphs: &[String]) -> Result<Vec<String>, ProofreadError> {
        log::debug!(
            "Sending {} paragraphs to {}",
            paragraphs.len(),
            self.endpoint
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CorrectTextRequest { text: paragraphs })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProofreadError::Status(status.as_u16()));
        }

        let corrected: Vec<String> = response.json()?;
        if corrected.len() != paragraphs.len() {
            return Err(ProofreadError::LengthMismatch {
                sent: paragraphs.len(),
                received: corrected.len(),
            });
        }
        Ok(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let paragraphs = vec!["Teh quick".to_string(), "Halló".to_string()];
        let body = serde_json::to_value(CorrectTextRequest { text: &paragraphs }).unwrap();
        assert_eq!(body, serde_json::json!({ "text": ["Teh quick", "Halló"] }));
    }

    #[test]
    fn test_unreachable_endpoint_is_a_transport_error() {
        let proofreader =
            HttpProofreader::new("http://127.0.0.1:9/api/correctText", Duration::from_millis(500))
                .unwrap();
        let result = proofreader.proofread(&["Teh".to_string()]);
        assert!(matches!(result, Err(ProofreadError::Transport(_))));
    }
}
