use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clinician account.
///
/// Uniqueness is by exact-match email. The password is a plain session
/// gate, not a security boundary, and is stored and compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
}

impl User {
    /// Create a new account with a fresh id.
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}
