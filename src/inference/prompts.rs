//! Fixed instruction texts sent with every inference request.
//!
//! The trailing-disclaimer rule is a prompt-level contract: the capability
//! is told to end `recommendations` with the exact disclaimer text, and the
//! upload workflow only observes (logs) violations.

use crate::models::DISCLAIMER;

/// Instruction for single-image assessment.
pub fn analyze_instruction() -> String {
    format!(
        "You are a dermatology assistant. Examine the attached skin-lesion \
photograph and produce a structured assessment.\n\
- condition_name: the most likely condition, in plain clinical language.\n\
- confidence: exactly one of High, Medium or Low.\n\
- description: two to four sentences describing the visible features \
(color, border, symmetry, texture) that support the assessment.\n\
- recommendations: concrete next steps for the clinician, ordered by \
priority. The final recommendation must be exactly this sentence: \
\"{DISCLAIMER}\""
    )
}

/// Instruction for dual-image progression comparison. The first attached
/// image is the earlier one, the second the later one.
pub fn compare_instruction() -> String {
    format!(
        "You are a dermatology assistant. The first attached photograph shows \
a skin lesion at an earlier point in time, the second shows the same lesion \
later. Judge the progression between them.\n\
- change_summary: one paragraph summarizing what changed.\n\
- key_observations: specific visible differences (size, color, border, \
elevation), one per entry.\n\
- recommendation: the single most important next step for the clinician.\n\
- updated_condition_assessment: whether the earlier assessment still holds, \
and why.\n\
- post_comparison_condition: the most likely condition as of the second \
image.\n\
End the recommendation with this sentence: \"{DISCLAIMER}\""
    )
}
