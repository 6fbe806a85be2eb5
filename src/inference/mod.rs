//! External inference capability: single-image analysis and dual-image
//! comparison over a structured-JSON contract.
//!
//! The transport is `gemini`; `schema` owns the response-schema definitions
//! and validation; `prompts` the fixed instruction texts. Everything behind
//! the `InferenceClient` trait so workflows are testable against
//! `MockInferenceClient`.

pub mod gemini;
pub mod prompts;
pub mod schema;

use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{AnalysisResult, ComparisonResult, Confidence, ImageBinary, DISCLAIMER};

pub use gemini::GeminiClient;

/// Failures of the inference capability.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// No access credential in the environment. Fatal to any inference
    /// call; surfaced verbatim to the user.
    #[error("{} is not set. Configure an API key to enable analysis", gemini::API_KEY_VAR)]
    Configuration,
    /// Transport-level failure (connect, timeout, body read).
    #[error("inference request failed: {0}")]
    Http(String),
    /// Non-success status from the service.
    #[error("inference service returned {status}: {body}")]
    Api { status: u16, body: String },
    /// Response payload is not parseable JSON or misses required fields.
    /// The offending payload goes to the log, never to the user.
    #[error("malformed inference response: {0}")]
    ResponseFormat(String),
}

/// The external AI capability, reduced to the two operations the session
/// needs. Single-shot: no retry, no in-flight cancellation; callers
/// abandon a pending future by dropping it.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Assess a single lesion image.
    async fn analyze(&self, image: &ImageBinary) -> Result<AnalysisResult, InferenceError>;

    /// Judge progression between two images. Argument order is meaningful
    /// and preserved on the wire: `before` first, `after` second.
    async fn compare(
        &self,
        before: &ImageBinary,
        after: &ImageBinary,
    ) -> Result<ComparisonResult, InferenceError>;
}

// ═══════════════════════════════════════════════════════════
// Mock client for tests
// ═══════════════════════════════════════════════════════════

/// What a mock client saw, in call order. Images are recorded by name so
/// ordering assertions read naturally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Analyze { image: String },
    Compare { before: String, after: String },
}

/// Configurable in-memory stand-in for the inference capability.
///
/// `None` responses make the corresponding operation fail with
/// `ResponseFormat`, which is the interesting failure for workflow tests.
pub struct MockInferenceClient {
    analysis: Option<AnalysisResult>,
    comparison: Option<ComparisonResult>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockInferenceClient {
    /// A client that succeeds with canned results.
    pub fn succeeding() -> Self {
        Self {
            analysis: Some(Self::canned_analysis()),
            comparison: Some(Self::canned_comparison()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with `ResponseFormat`.
    pub fn failing() -> Self {
        Self {
            analysis: None,
            comparison: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn with_comparison(mut self, comparison: ComparisonResult) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// Calls received so far, in order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    pub fn canned_analysis() -> AnalysisResult {
        AnalysisResult {
            condition_name: "Benign nevus".into(),
            confidence: Confidence::High,
            description: "Uniform pigmentation with regular, well-defined borders.".into(),
            recommendations: vec![
                "Photograph again in three months to monitor for change.".into(),
                DISCLAIMER.into(),
            ],
        }
    }

    pub fn canned_comparison() -> ComparisonResult {
        ComparisonResult {
            change_summary: "No appreciable change between the two images.".into(),
            key_observations: vec!["Border and pigmentation are stable.".into()],
            recommendation: "Continue routine monitoring.".into(),
            updated_condition_assessment: "Consistent with the prior assessment.".into(),
            post_comparison_condition: "Benign nevus".into(),
        }
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn analyze(&self, image: &ImageBinary) -> Result<AnalysisResult, InferenceError> {
        self.record(RecordedCall::Analyze {
            image: image.name.clone(),
        });
        self.analysis
            .clone()
            .ok_or_else(|| InferenceError::ResponseFormat("mock failure".into()))
    }

    async fn compare(
        &self,
        before: &ImageBinary,
        after: &ImageBinary,
    ) -> Result<ComparisonResult, InferenceError> {
        self.record(RecordedCall::Compare {
            before: before.name.clone(),
            after: after.name.clone(),
        });
        self.comparison
            .clone()
            .ok_or_else(|| InferenceError::ResponseFormat("mock failure".into()))
    }
}
