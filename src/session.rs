//! Shared session state: users, patients, login flag.
//!
//! `SessionManager` is the single owner of the in-memory collections.
//! Wrapped in `Arc` at startup and shared by every workflow; `RwLock`
//! allows concurrent reads while mutations take the write lock. Every
//! mutation replaces the affected collection wholesale (copy-on-write),
//! so a change becomes visible only once complete and concurrent
//! workflows observe a total order of mutations. Each successful
//! mutation persists its slice before returning.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::models::{LesionImage, NewPatient, Patient, User};
use crate::store::{snapshot, KvStore};

/// Errors from session-state operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("An account with this email already exists")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0} is required")]
    MissingField(&'static str),
    /// Internal invariant violation: UI paths only offer existing
    /// patients, so this indicates a stale selection or a defect.
    #[error("No patient with id {0}")]
    PatientNotFound(Uuid),
    #[error("Internal lock error")]
    LockPoisoned,
}

struct SessionState {
    users: Vec<User>,
    patients: Vec<Patient>,
    logged_in: bool,
}

/// Owner of the session snapshot and its mutation operations.
pub struct SessionManager {
    state: RwLock<SessionState>,
    store: Arc<dyn KvStore>,
}

impl SessionManager {
    /// Rehydrate a session from the store, falling back to the built-in
    /// seeds where slices are absent or malformed. The default clinician
    /// account is guaranteed to exist afterwards.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let mut users = snapshot::load_users(store.as_ref(), snapshot::default_users());
        if !users
            .iter()
            .any(|u| u.email == snapshot::DEFAULT_USER_EMAIL)
        {
            users.push(User::new(
                snapshot::DEFAULT_USER_NAME,
                snapshot::DEFAULT_USER_EMAIL,
                snapshot::DEFAULT_USER_PASSWORD,
            ));
            snapshot::save_users(store.as_ref(), &users);
        }
        let patients = snapshot::load_patients(store.as_ref(), snapshot::default_patients());
        let logged_in = snapshot::load_logged_in(store.as_ref(), false);

        tracing::info!(
            users = users.len(),
            patients = patients.len(),
            "Session rehydrated"
        );

        Self {
            state: RwLock::new(SessionState {
                users,
                patients,
                logged_in,
            }),
            store,
        }
    }

    // ── Users ───────────────────────────────────────────────

    /// Register a new account. Email collision is an exact-string match;
    /// casing is deliberately not normalized.
    pub fn add_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        if state.users.iter().any(|u| u.email == email) {
            return Err(SessionError::DuplicateEmail);
        }
        let user = User::new(name, email, password);
        let mut users = state.users.clone();
        users.push(user.clone());
        state.users = users;
        snapshot::save_users(self.store.as_ref(), &state.users);
        tracing::info!(email, "User registered");
        Ok(user)
    }

    /// Exact match on email and password; marks the session logged in.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        let user = state
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .cloned()
            .ok_or(SessionError::InvalidCredentials)?;
        state.logged_in = true;
        snapshot::save_logged_in(self.store.as_ref(), true);
        Ok(user)
    }

    pub fn log_out(&self) {
        if let Ok(mut state) = self.state.write() {
            state.logged_in = false;
            snapshot::save_logged_in(self.store.as_ref(), false);
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().map(|s| s.logged_in).unwrap_or(false)
    }

    pub fn users(&self) -> Vec<User> {
        self.state.read().map(|s| s.users.clone()).unwrap_or_default()
    }

    // ── Patients ────────────────────────────────────────────

    /// Create a patient from intake data. Name and dob are mandatory;
    /// the new patient is prepended (newest first).
    pub fn add_patient(&self, data: NewPatient) -> Result<Patient, SessionError> {
        if data.name.trim().is_empty() {
            return Err(SessionError::MissingField("name"));
        }
        if data.dob.trim().is_empty() {
            return Err(SessionError::MissingField("dob"));
        }

        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        let patient = Patient::new(data);
        let mut patients = Vec::with_capacity(state.patients.len() + 1);
        patients.push(patient.clone());
        patients.extend(state.patients.iter().cloned());
        state.patients = patients;
        snapshot::save_patients(self.store.as_ref(), &state.patients);
        tracing::info!(patient = %patient.id, "Patient added");
        Ok(patient)
    }

    /// Prepend an image to a patient's history. The only mutation path
    /// for history: the upload workflow never reaches this step when
    /// analysis failed, so a persisted image without a result marks an
    /// analysis that was never merged, not a dropped failure.
    pub fn append_image(
        &self,
        patient_id: Uuid,
        image: LesionImage,
    ) -> Result<Patient, SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        let mut patients = state.patients.clone();
        let patient = patients
            .iter_mut()
            .find(|p| p.id == patient_id)
            .ok_or(SessionError::PatientNotFound(patient_id))?;
        patient.lesion_images.insert(0, image);
        let updated = patient.clone();
        state.patients = patients;
        snapshot::save_patients(self.store.as_ref(), &state.patients);
        tracing::info!(patient = %patient_id, "Lesion image appended");
        Ok(updated)
    }

    /// Snapshot of the patient sequence (newest first).
    pub fn patients(&self) -> Vec<Patient> {
        self.state
            .read()
            .map(|s| s.patients.clone())
            .unwrap_or_default()
    }

    pub fn patient(&self, patient_id: &Uuid) -> Option<Patient> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.patients.iter().find(|p| &p.id == patient_id).cloned())
    }
}
