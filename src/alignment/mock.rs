/*!
 * Mock aligner for testing and dry runs.
 *
 * - `MockAligner::positional()` - pairs the i-th source sentence with the i-th target sentence
 * - `MockAligner::empty()` - succeeds with no pairs
 * - `MockAligner::failing()` - always fails
 * - `MockAligner::fail_after(n)` - succeeds n times, then fails
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::corpus::Document;
use crate::errors::AlignerError;

use super::{AlignedPair, Aligner, AlignmentRequest};

/// Behavior mode for the mock aligner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Positional 1-1 pairing, padding the shorter side with empty text
    Positional,
    /// Succeeds with zero pairs
    Empty,
    /// Always fails
    Failing,
    /// Succeeds for the first `successes` calls, then fails
    FailAfter { successes: usize },
}

/// Mock aligner counting its calls
#[derive(Debug, Clone)]
pub struct MockAligner {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockAligner {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn positional() -> Self {
        Self::new(MockBehavior::Positional)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_after(successes: usize) -> Self {
        Self::new(MockBehavior::FailAfter { successes })
    }

    /// Number of `align` calls so far, shared between clones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Pair segments positionally
    pub fn pair_positionally(source: &[String], target: &[String]) -> Vec<AlignedPair> {
        let len = source.len().max(target.len());
        (0..len)
            .map(|i| {
                AlignedPair::new(
                    source.get(i).cloned().unwrap_or_default(),
                    target.get(i).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}

/// Split a document into sentences
///
/// Pre-split input keeps its segments (or its lines, for raw text); raw text
/// otherwise breaks after `.`, `!` or `?` followed by whitespace.
pub fn segment(document: &Document, is_split: bool) -> Vec<String> {
    match document {
        Document::Segments(segments) => segments
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Document::Text(text) if is_split => text
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        Document::Text(text) => split_sentences(text),
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace());
        if at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

#[async_trait]
impl Aligner for MockAligner {
    async fn align(&self, request: AlignmentRequest<'_>) -> Result<Vec<AlignedPair>, AlignerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Failing => Err(AlignerError::Unavailable("mock aligner always fails".to_string())),
            MockBehavior::FailAfter { successes } if call >= successes => Err(AlignerError::Unavailable(
                format!("mock aligner failed on call {}", call + 1),
            )),
            MockBehavior::Empty => Ok(Vec::new()),
            MockBehavior::Positional | MockBehavior::FailAfter { .. } => {
                let is_split = request.params.is_split;
                let source = segment(request.source, is_split);
                let target = segment(request.target, is_split);
                Ok(Self::pair_positionally(&source, &target))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
