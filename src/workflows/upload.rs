//! Upload workflow: encode + analyze concurrently, then merge.
//!
//! The merge step (`append_image`) runs only after a successful analysis,
//! so a failed external call can never leave a partial image record in
//! patient history.

use chrono::Utc;
use uuid::Uuid;

use crate::codec;
use crate::inference::InferenceClient;
use crate::models::{ImageBinary, LesionImage, Patient};
use crate::session::SessionManager;

use super::inference_user_message;

/// Observable workflow state. `Idle` and `Uploading` are the transient
/// display states; `run` always ends in one of the terminal two.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Uploading,
    Succeeded(Patient),
    Failed(String),
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

/// Run the upload workflow for one image against one patient.
///
/// Encoding and analysis run concurrently; both complete before the merge.
/// By the time the analysis resolves the target patient may have gone away
/// (stale selection after navigation); the merge then fails cleanly
/// instead of updating state that no longer matches the selection.
pub async fn run(
    session: &SessionManager,
    client: &dyn InferenceClient,
    patient_id: Uuid,
    binary: ImageBinary,
) -> UploadState {
    let (encoded_payload, analysis) = tokio::join!(
        async { codec::encode(&binary) },
        client.analyze(&binary)
    );

    let analysis = match analysis {
        Ok(analysis) => analysis,
        Err(e) => return UploadState::Failed(inference_user_message(&e)),
    };

    if !analysis.has_disclaimer() {
        tracing::warn!(
            condition = %analysis.condition_name,
            "Analysis result missing the trailing disclaimer"
        );
    }

    let image = LesionImage {
        id: Uuid::new_v4(),
        encoded_payload,
        binary: Some(binary),
        analysis: Some(analysis),
        timestamp: Utc::now(),
    };

    match session.append_image(patient_id, image) {
        Ok(patient) => UploadState::Succeeded(patient),
        Err(e) => {
            tracing::error!(patient = %patient_id, "Could not merge analyzed image: {e}");
            UploadState::Failed(e.to_string())
        }
    }
}
