use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Fixed disclaimer the inference capability is instructed to append as the
/// final recommendation of every assessment. A prompt-level contract: we
/// observe it (`AnalysisResult::has_disclaimer`) but never enforce it.
pub const DISCLAIMER: &str = "This is an AI-generated assessment, not a medical diagnosis. \
Always consult a qualified dermatologist.";

/// How confident the model reports itself to be about an assessment.
///
/// The external capability is instructed to answer High/Medium/Low, but any
/// other string it produces is carried through losslessly rather than
/// rejected; confidence is display data, not a control value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl Confidence {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Structured assessment of a single lesion image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub condition_name: String,
    pub confidence: Confidence,
    pub description: String,
    /// Ordered; the capability is instructed to end with [`DISCLAIMER`].
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    /// Whether the capability honored the trailing-disclaimer contract.
    pub fn has_disclaimer(&self) -> bool {
        self.recommendations
            .last()
            .is_some_and(|last| last == DISCLAIMER)
    }
}

/// Structured progression judgment between two lesion images.
///
/// Ephemeral: held by the comparison workflow for display only, never
/// merged into patient history or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub change_summary: String,
    pub key_observations: Vec<String>,
    pub recommendation: String,
    pub updated_condition_assessment: String,
    pub post_comparison_condition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_parses_known_levels() {
        assert_eq!(Confidence::parse("High"), Confidence::High);
        assert_eq!(Confidence::parse("Medium"), Confidence::Medium);
        assert_eq!(Confidence::parse("Low"), Confidence::Low);
    }

    #[test]
    fn confidence_keeps_unknown_strings() {
        let c = Confidence::parse("Very High");
        assert_eq!(c, Confidence::Unrecognized("Very High".to_string()));
        assert_eq!(c.as_str(), "Very High");
    }

    #[test]
    fn confidence_serde_round_trips_unknown() {
        let json = serde_json::to_string(&Confidence::parse("Moderate")).unwrap();
        assert_eq!(json, "\"Moderate\"");
        let back: Confidence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Confidence::Unrecognized("Moderate".to_string()));
    }

    #[test]
    fn disclaimer_detection() {
        let mut result = AnalysisResult {
            condition_name: "Benign nevus".into(),
            confidence: Confidence::High,
            description: "Uniform pigmentation, regular borders.".into(),
            recommendations: vec!["Monitor for changes.".into(), DISCLAIMER.into()],
        };
        assert!(result.has_disclaimer());

        result.recommendations.pop();
        assert!(!result.has_disclaimer());

        result.recommendations.clear();
        assert!(!result.has_disclaimer());
    }
}
