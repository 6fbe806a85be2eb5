//! Session-snapshot persistence adapter.
//!
//! Serializes the three snapshot slices (users, patients, login flag) to
//! the key-value store and rehydrates them at startup. Persistence is
//! best-effort: a failed save is logged and swallowed so durability
//! problems never interrupt the interactive session. Loads fall back to
//! built-in seeds when the store is empty or a payload is malformed.
//!
//! Two format obligations live here (via the models' serde contracts):
//! images lose their binary handles on save (`#[serde(skip)]`), and image
//! timestamps persist as RFC 3339 strings and come back as `DateTime<Utc>`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{NewPatient, Patient, User};

use super::{KvStore, LOGGED_IN_KEY, PATIENTS_KEY, USERS_KEY};

/// Seeded clinician account, guaranteed to exist at session start.
pub const DEFAULT_USER_NAME: &str = "Dr. Demo";
pub const DEFAULT_USER_EMAIL: &str = "doctor@dermatrack.local";
pub const DEFAULT_USER_PASSWORD: &str = "demo1234";

fn save<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(key, "Could not serialize snapshot slice: {e}");
            return;
        }
    };
    if let Err(e) = store.set(key, &json) {
        tracing::warn!(key, "Could not persist snapshot slice: {e}");
    }
}

fn load<T: DeserializeOwned>(store: &dyn KvStore, key: &str, fallback: T) -> T {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return fallback,
        Err(e) => {
            tracing::warn!(key, "Could not read snapshot slice: {e}");
            return fallback;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, "Malformed snapshot slice, using fallback: {e}");
            fallback
        }
    }
}

pub fn save_users(store: &dyn KvStore, users: &[User]) {
    save(store, USERS_KEY, &users);
}

pub fn load_users(store: &dyn KvStore, fallback: Vec<User>) -> Vec<User> {
    load(store, USERS_KEY, fallback)
}

/// Binary handles are absent from the serialized form, so every image in a
/// saved patient sequence is storable as-is.
pub fn save_patients(store: &dyn KvStore, patients: &[Patient]) {
    save(store, PATIENTS_KEY, &patients);
}

pub fn load_patients(store: &dyn KvStore, fallback: Vec<Patient>) -> Vec<Patient> {
    load(store, PATIENTS_KEY, fallback)
}

pub fn save_logged_in(store: &dyn KvStore, logged_in: bool) {
    save(store, LOGGED_IN_KEY, &logged_in);
}

pub fn load_logged_in(store: &dyn KvStore, fallback: bool) -> bool {
    load(store, LOGGED_IN_KEY, fallback)
}

/// Seed users for a fresh store.
pub fn default_users() -> Vec<User> {
    vec![User::new(
        DEFAULT_USER_NAME,
        DEFAULT_USER_EMAIL,
        DEFAULT_USER_PASSWORD,
    )]
}

/// Seed patients for a fresh store: one demo patient with no history.
pub fn default_patients() -> Vec<Patient> {
    vec![Patient::new(NewPatient {
        name: "Amara Fall".into(),
        dob: "1983-06-02".into(),
        patient_number: Some("P-0001".into()),
        gender: Some("Female".into()),
        blood_type: Some("O+".into()),
        existing_conditions: Some("None reported".into()),
    })]
}
