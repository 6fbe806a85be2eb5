//! Caller-initiated workflows: upload→analyze→append and
//! select-two→compare→display.
//!
//! Workflows are the error-containment boundary: every failure is caught
//! here, converted to a user-displayable message, and leaves session state
//! untouched. Each invocation closes over its own locals and touches
//! shared state only through `SessionManager`'s atomic operations, so
//! concurrent workflows against different patients do not interfere.

pub mod compare;
pub mod upload;

use crate::inference::InferenceError;

/// Generic retryable message for malformed external responses; the raw
/// payload stays in the logs.
const RETRYABLE_MESSAGE: &str =
    "The analysis service returned an unexpected response. Please try again.";

/// Convert an inference failure into what the user should see.
///
/// Configuration problems are surfaced verbatim (the user must act on
/// them); everything else collapses to a generic retryable message with
/// the detail logged.
pub(crate) fn inference_user_message(err: &InferenceError) -> String {
    match err {
        InferenceError::Configuration => err.to_string(),
        InferenceError::ResponseFormat(detail) => {
            tracing::error!(%detail, "Malformed inference response");
            RETRYABLE_MESSAGE.to_string()
        }
        InferenceError::Http(_) | InferenceError::Api { .. } => {
            tracing::error!("Inference call failed: {err}");
            RETRYABLE_MESSAGE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_is_surfaced_verbatim() {
        let msg = inference_user_message(&InferenceError::Configuration);
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn response_format_collapses_to_generic_message() {
        let err = InferenceError::ResponseFormat("missing required field: confidence".into());
        let msg = inference_user_message(&err);
        assert_eq!(msg, RETRYABLE_MESSAGE);
        assert!(!msg.contains("confidence"));
    }

    #[test]
    fn transport_errors_collapse_to_generic_message() {
        let err = InferenceError::Api {
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(inference_user_message(&err), RETRYABLE_MESSAGE);
    }
}
