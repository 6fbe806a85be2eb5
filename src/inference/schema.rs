//! Response schemas and validation for the inference contract.
//!
//! Requests carry a machine-checkable schema so the capability answers in
//! JSON; responses are still validated explicitly here, field by field
//! with the offending payload logged at debug, because the schema is a
//! request hint, not a guarantee.

use serde::Deserialize;
use serde_json::json;

use crate::models::{AnalysisResult, ComparisonResult, Confidence};

use super::InferenceError;

/// Schema the capability must follow for a single-image assessment.
pub fn analysis_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "condition_name": { "type": "STRING" },
            "confidence": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
            "description": { "type": "STRING" },
            "recommendations": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["condition_name", "confidence", "description", "recommendations"]
    })
}

/// Schema for the dual-image comparison.
pub fn comparison_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "change_summary": { "type": "STRING" },
            "key_observations": { "type": "ARRAY", "items": { "type": "STRING" } },
            "recommendation": { "type": "STRING" },
            "updated_condition_assessment": { "type": "STRING" },
            "post_comparison_condition": { "type": "STRING" }
        },
        "required": [
            "change_summary",
            "key_observations",
            "recommendation",
            "updated_condition_assessment",
            "post_comparison_condition"
        ]
    })
}

/// Validate a response payload into an [`AnalysisResult`].
pub fn parse_analysis(payload: &str) -> Result<AnalysisResult, InferenceError> {
    #[derive(Deserialize)]
    struct Raw {
        condition_name: Option<String>,
        confidence: Option<String>,
        description: Option<String>,
        recommendations: Option<Vec<String>>,
    }

    let raw: Raw = parse_json(payload)?;
    Ok(AnalysisResult {
        condition_name: required(raw.condition_name, "condition_name", payload)?,
        confidence: Confidence::parse(&required(raw.confidence, "confidence", payload)?),
        description: required(raw.description, "description", payload)?,
        recommendations: required(raw.recommendations, "recommendations", payload)?,
    })
}

/// Validate a response payload into a [`ComparisonResult`].
pub fn parse_comparison(payload: &str) -> Result<ComparisonResult, InferenceError> {
    #[derive(Deserialize)]
    struct Raw {
        change_summary: Option<String>,
        key_observations: Option<Vec<String>>,
        recommendation: Option<String>,
        updated_condition_assessment: Option<String>,
        post_comparison_condition: Option<String>,
    }

    let raw: Raw = parse_json(payload)?;
    Ok(ComparisonResult {
        change_summary: required(raw.change_summary, "change_summary", payload)?,
        key_observations: required(raw.key_observations, "key_observations", payload)?,
        recommendation: required(raw.recommendation, "recommendation", payload)?,
        updated_condition_assessment: required(
            raw.updated_condition_assessment,
            "updated_condition_assessment",
            payload,
        )?,
        post_comparison_condition: required(
            raw.post_comparison_condition,
            "post_comparison_condition",
            payload,
        )?,
    })
}

fn parse_json<T: for<'de> Deserialize<'de>>(payload: &str) -> Result<T, InferenceError> {
    serde_json::from_str(payload).map_err(|e| {
        tracing::debug!(payload, "Unparseable inference response");
        InferenceError::ResponseFormat(format!("not valid JSON: {e}"))
    })
}

fn required<T>(field: Option<T>, name: &str, payload: &str) -> Result<T, InferenceError> {
    field.ok_or_else(|| {
        tracing::debug!(payload, "Inference response missing field {name}");
        InferenceError::ResponseFormat(format!("missing required field: {name}"))
    })
}
