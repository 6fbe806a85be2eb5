//! Comparison workflow: select two historical images, compare, display.
//!
//! Selection order decides which image is "before", never the
//! timestamps. The result is ephemeral: nothing here mutates or persists
//! patient history.

use uuid::Uuid;

use crate::codec::{self, DecodeError};
use crate::inference::{InferenceClient, InferenceError};
use crate::models::{ComparisonResult, ImageBinary, ImageProvenance, LesionImage};
use crate::session::SessionManager;

use super::inference_user_message;

/// Why a comparison could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// Rejected locally, before any inference call.
    #[error("Select two different images to compare")]
    SameImage,
    #[error("No patient with id {0}")]
    PatientNotFound(Uuid),
    #[error("No image with id {0} for this patient")]
    ImageNotFound(Uuid),
    /// Corrupt persisted payload, surfaced as a comparison-specific failure.
    #[error("A stored image could not be read for comparison: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl CompareError {
    /// User-displayable form; inference detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Inference(err) => inference_user_message(err),
            other => other.to_string(),
        }
    }
}

/// Terminal state of one comparison run.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareState {
    Succeeded(ComparisonResult),
    Failed(String),
}

/// Run the comparison workflow over two of a patient's images.
///
/// `first_id` is the "before" image, `second_id` the "after", as
/// selected by the caller.
pub async fn run(
    session: &SessionManager,
    client: &dyn InferenceClient,
    patient_id: Uuid,
    first_id: Uuid,
    second_id: Uuid,
) -> CompareState {
    match compare_images(session, client, patient_id, first_id, second_id).await {
        Ok(result) => CompareState::Succeeded(result),
        Err(e) => {
            tracing::warn!(patient = %patient_id, "Comparison failed: {e}");
            CompareState::Failed(e.user_message())
        }
    }
}

async fn compare_images(
    session: &SessionManager,
    client: &dyn InferenceClient,
    patient_id: Uuid,
    first_id: Uuid,
    second_id: Uuid,
) -> Result<ComparisonResult, CompareError> {
    if first_id == second_id {
        return Err(CompareError::SameImage);
    }

    let patient = session
        .patient(&patient_id)
        .ok_or(CompareError::PatientNotFound(patient_id))?;
    let first = patient
        .image(&first_id)
        .ok_or(CompareError::ImageNotFound(first_id))?;
    let second = patient
        .image(&second_id)
        .ok_or(CompareError::ImageNotFound(second_id))?;

    let before = resolve_binary(first)?;
    let after = resolve_binary(second)?;

    Ok(client.compare(&before, &after).await?)
}

/// Obtain submit-ready bytes for an image: the live handle when the image
/// was uploaded this session, otherwise a decode of its stored payload.
fn resolve_binary(image: &LesionImage) -> Result<ImageBinary, DecodeError> {
    match image.provenance() {
        ImageProvenance::Live(binary) => Ok(binary.clone()),
        ImageProvenance::EncodedOnly(payload) => {
            codec::decode(payload, &format!("lesion-{}", image.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use crate::inference::{MockInferenceClient, RecordedCall};
    use crate::models::NewPatient;
    use crate::store::{KvStore, SqliteStore, PATIENTS_KEY};

    use super::*;

    fn binary(name: &str) -> ImageBinary {
        ImageBinary {
            name: name.into(),
            mime_type: "image/png".into(),
            bytes: name.as_bytes().to_vec(),
        }
    }

    fn image(name: &str, secs: i64, live: bool) -> LesionImage {
        let bin = binary(name);
        LesionImage {
            id: Uuid::new_v4(),
            encoded_payload: codec::encode(&bin),
            binary: live.then_some(bin),
            analysis: None,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    /// Patient with two images: newest (t=200) at index 0, older (t=100)
    /// behind it, per the manager newest-first ordering.
    fn session_with_two_images(
        live: bool,
    ) -> (Arc<SqliteStore>, SessionManager, Uuid, Uuid, Uuid) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let session = SessionManager::load(Arc::clone(&store) as Arc<dyn KvStore>);
        let patient = session
            .add_patient(NewPatient {
                name: "Lena Voss".into(),
                dob: "1990-01-01".into(),
                ..Default::default()
            })
            .unwrap();
        let older = image("img_100", 100, live);
        let newer = image("img_200", 200, live);
        let older_id = older.id;
        let newer_id = newer.id;
        session.append_image(patient.id, older).unwrap();
        session.append_image(patient.id, newer).unwrap();
        (store, session, patient.id, older_id, newer_id)
    }

    #[tokio::test]
    async fn compare_succeeds_without_mutating_or_persisting() {
        let (store, session, patient_id, older, newer) = session_with_two_images(true);
        let saved_before = store.get(PATIENTS_KEY).unwrap();
        let history_before = session.patient(&patient_id).unwrap().lesion_images;

        let client = MockInferenceClient::succeeding();
        let state = run(&session, &client, patient_id, older, newer).await;

        assert!(matches!(state, CompareState::Succeeded(_)));
        assert_eq!(
            session.patient(&patient_id).unwrap().lesion_images,
            history_before
        );
        assert_eq!(store.get(PATIENTS_KEY).unwrap(), saved_before);
    }

    #[tokio::test]
    async fn same_image_rejected_before_any_call() {
        let (_, session, patient_id, older, _) = session_with_two_images(true);
        let client = MockInferenceClient::succeeding();

        let state = run(&session, &client, patient_id, older, older).await;
        match state {
            CompareState::Failed(msg) => assert!(msg.contains("two different images")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn selection_order_decides_before_and_after() {
        // Select the older image first even though it sits at index 1:
        // the wire order must follow the selection, not the sequence.
        let (_, session, patient_id, older, newer) = session_with_two_images(true);
        let client = MockInferenceClient::succeeding();

        run(&session, &client, patient_id, older, newer).await;
        assert_eq!(
            client.recorded_calls(),
            vec![RecordedCall::Compare {
                before: "img_100".into(),
                after: "img_200".into(),
            }]
        );

        // Reversed selection reverses the wire order, timestamps unchanged.
        run(&session, &client, patient_id, newer, older).await;
        assert_eq!(
            client.recorded_calls()[1],
            RecordedCall::Compare {
                before: "img_200".into(),
                after: "img_100".into(),
            }
        );
    }

    #[tokio::test]
    async fn reloaded_images_are_decoded_for_comparison() {
        let (store, session, patient_id, older, newer) = session_with_two_images(true);
        drop(session);
        // Reload drops every live handle, as after a restart.
        let session = SessionManager::load(store);
        let patient = session.patient(&patient_id).unwrap();
        assert!(patient.lesion_images.iter().all(|i| i.binary.is_none()));

        let client = MockInferenceClient::succeeding();
        let state = run(&session, &client, patient_id, older, newer).await;
        assert!(matches!(state, CompareState::Succeeded(_)));

        // Decoded handles carry derived names and the original bytes.
        match &client.recorded_calls()[0] {
            RecordedCall::Compare { before, after } => {
                assert_eq!(before, &format!("lesion-{older}"));
                assert_eq!(after, &format!("lesion-{newer}"));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn corrupt_payload_surfaces_comparison_failure() {
        let (_, session, patient_id, _, newer) = session_with_two_images(false);
        let corrupt = LesionImage {
            id: Uuid::new_v4(),
            encoded_payload: "not-a-data-url".into(),
            binary: None,
            analysis: None,
            timestamp: Utc::now(),
        };
        let corrupt_id = corrupt.id;
        session.append_image(patient_id, corrupt).unwrap();

        let client = MockInferenceClient::succeeding();
        let state = run(&session, &client, patient_id, corrupt_id, newer).await;
        match state {
            CompareState::Failed(msg) => {
                assert!(msg.contains("could not be read"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_image_id_fails_locally() {
        let (_, session, patient_id, older, _) = session_with_two_images(true);
        let client = MockInferenceClient::succeeding();

        let state = run(&session, &client, patient_id, older, Uuid::new_v4()).await;
        assert!(matches!(state, CompareState::Failed(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn inference_failure_discards_partial_state() {
        let (_, session, patient_id, older, newer) = session_with_two_images(true);
        let client = MockInferenceClient::failing();

        let state = run(&session, &client, patient_id, older, newer).await;
        match state {
            CompareState::Failed(msg) => assert!(msg.contains("try again")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(
            session.patient(&patient_id).unwrap().lesion_images.len(),
            2
        );
    }
}
