//! Caller identity yielded by token verification.

use serde::{Deserialize, Serialize};

/// Opaque identity of an authenticated caller.
///
/// `subject` is the identity provider's subject id. It is matched against
/// `user.auth_subject` to find the account acting on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Identity provider subject.
    pub subject: String,
}

impl CallerIdentity {
    /// Wrap a verified subject id.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}
