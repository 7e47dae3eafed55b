use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::corpus::Document;
use crate::errors::AlignerError;

use super::{AlignedPair, Aligner, AlignmentParams, AlignmentRequest};

/// Client for an alignment service exposing `POST <endpoint>/align`
///
/// The service runs the embedding model and the alignment search. One
/// request per unit, no retries: a failed call fails the run and the
/// unit is picked up again on the next run.
#[derive(Debug)]
pub struct HttpAligner {
    /// Fully resolved `/align` URL
    align_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Request body for the alignment service
#[derive(Debug, Serialize)]
pub struct AlignBody<'a> {
    pub source_language: &'a str,
    pub target_language: &'a str,
    pub source: &'a Document,
    pub target: &'a Document,
    #[serde(flatten)]
    pub params: &'a AlignmentParams,
}

/// Response body from the alignment service
#[derive(Debug, Deserialize)]
pub struct AlignResponse {
    pub pairs: Vec<AlignedPair>,
}

impl HttpAligner {
    /// Create a client for the service at `endpoint`
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, AlignerError> {
        let base = Url::parse(endpoint)
            .map_err(|e| AlignerError::Unavailable(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let align_url = format!("{}/align", base.as_str().trim_end_matches('/'));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| AlignerError::Unavailable(format!("building HTTP client: {}", e)))?;

        Ok(Self { align_url, client })
    }

    /// The URL requests are sent to
    pub fn align_url(&self) -> &str {
        &self.align_url
    }
}

#[async_trait]
impl Aligner for HttpAligner {
    async fn align(&self, request: AlignmentRequest<'_>) -> Result<Vec<AlignedPair>, AlignerError> {
        let body = AlignBody {
            source_language: request.source_language,
            target_language: request.target_language,
            source: request.source,
            target: request.target,
            params: request.params,
        };

        debug!(
            "POST {} ({} + {} chars)",
            self.align_url,
            request.source.char_count(),
            request.target.char_count()
        );

        let response = self
            .client
            .post(&self.align_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AlignerError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Alignment service error ({}): {}", status, message);
            return Err(AlignerError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let decoded: AlignResponse = response
            .json()
            .await
            .map_err(|e| AlignerError::InvalidResponse(e.to_string()))?;

        Ok(decoded.pairs)
    }

    fn name(&self) -> &str {
        "http"
    }
}
