use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AnalysisResult;

/// In-memory reference to raw image bytes.
///
/// Present only for images added during the current process lifetime; it is
/// never serialized, so images loaded from the store carry only their
/// encoded payload and must be decoded before re-submission to inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBinary {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// How an image's bytes can be obtained, decided by provenance rather than
/// ad-hoc field presence: uploaded this session (live bytes available) or
/// rehydrated from the store (encoded payload only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageProvenance<'a> {
    Live(&'a ImageBinary),
    EncodedOnly(&'a str),
}

/// One photograph of a lesion, with its assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LesionImage {
    pub id: Uuid,
    /// Transportable data-URL form of the image (see `codec`).
    pub encoded_payload: String,
    /// Stripped on save; always `None` after a reload.
    #[serde(skip)]
    pub binary: Option<ImageBinary>,
    /// `None` marks an analysis that never completed. The upload workflow
    /// refuses to append on analysis failure, so persisted `None` values
    /// are never silently-dropped failures.
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    /// Stored as an RFC 3339 string (the durable format has no instant
    /// type) and rehydrated by chrono on load.
    pub timestamp: DateTime<Utc>,
}

impl LesionImage {
    pub fn provenance(&self) -> ImageProvenance<'_> {
        match &self.binary {
            Some(binary) => ImageProvenance::Live(binary),
            None => ImageProvenance::EncodedOnly(&self.encoded_payload),
        }
    }
}

/// A patient and their lesion-image history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    /// Date of birth, kept as entered.
    pub dob: String,
    #[serde(default)]
    pub patient_number: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub existing_conditions: Option<String>,
    /// Insertion order, newest first.
    #[serde(default)]
    pub lesion_images: Vec<LesionImage>,
}

impl Patient {
    /// Build a patient from intake data with a fresh id and empty history.
    pub fn new(data: NewPatient) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: data.name,
            dob: data.dob,
            patient_number: data.patient_number,
            gender: data.gender,
            blood_type: data.blood_type,
            existing_conditions: data.existing_conditions,
            lesion_images: Vec::new(),
        }
    }

    pub fn image(&self, image_id: &Uuid) -> Option<&LesionImage> {
        self.lesion_images.iter().find(|img| &img.id == image_id)
    }
}

/// Intake form data for a new patient. Name and dob are mandatory;
/// everything else is optional demographics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPatient {
    pub name: String,
    pub dob: String,
    pub patient_number: Option<String>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub existing_conditions: Option<String>,
}
