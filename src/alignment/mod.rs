/*!
 * The alignment collaborator.
 *
 * The cross-lingual sentence aligner is external to this crate. This module
 * defines the seam the controller calls through:
 * - `Aligner`: maps two parallel documents to ordered sentence pairs
 * - `http`: client for an alignment service reachable over HTTP
 * - `mock`: positional aligner for tests and dry runs
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::corpus::Document;
use crate::errors::AlignerError;

pub mod http;
pub mod mock;

pub use http::HttpAligner;
pub use mock::{MockAligner, MockBehavior};

/// One source segment matched to its target segment
///
/// Either side may be empty when the aligner emits a 1-0 or 0-1 bead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedPair {
    #[serde(rename = "source")]
    pub source_text: String,
    #[serde(rename = "target")]
    pub target_text: String,
}

impl AlignedPair {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
        }
    }
}

/// Tuning parameters passed through verbatim to the aligner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentParams {
    /// Maximum number of sentences on either side of one alignment bead
    #[serde(default = "default_max_align")]
    pub max_align: usize,

    /// Candidate count kept per source sentence in the first pass
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Search window around the first-pass path
    #[serde(default = "default_win")]
    pub win: usize,

    /// Score penalty for leaving a sentence unaligned
    #[serde(default = "default_skip")]
    pub skip: f64,

    /// Use margin-based scoring
    #[serde(default = "default_true")]
    pub margin: bool,

    /// Penalize beads of unbalanced length
    #[serde(default = "default_true")]
    pub len_penalty: bool,

    /// Documents are already split into sentences
    #[serde(default)]
    pub is_split: bool,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            max_align: default_max_align(),
            top_k: default_top_k(),
            win: default_win(),
            skip: default_skip(),
            margin: true,
            len_penalty: true,
            is_split: false,
        }
    }
}

fn default_max_align() -> usize {
    5
}

fn default_top_k() -> usize {
    3
}

fn default_win() -> usize {
    5
}

fn default_skip() -> f64 {
    -0.1
}

fn default_true() -> bool {
    true
}

/// Everything the aligner needs for one unit
#[derive(Debug, Clone, Copy)]
pub struct AlignmentRequest<'a> {
    pub source_language: &'a str,
    pub target_language: &'a str,
    pub source: &'a Document,
    pub target: &'a Document,
    pub params: &'a AlignmentParams,
}

/// Common trait for all aligners
///
/// Implementations are called once per unit, sequentially; a call returning
/// an error aborts the run.
#[async_trait]
pub trait Aligner: Send + Sync + Debug {
    /// Align two parallel documents into ordered sentence pairs
    async fn align(&self, request: AlignmentRequest<'_>) -> Result<Vec<AlignedPair>, AlignerError>;

    /// Short name for logs
    fn name(&self) -> &str;
}
