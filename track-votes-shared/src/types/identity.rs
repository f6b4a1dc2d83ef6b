use serde::{Deserialize, Serialize};

/// A verified user identity, as yielded by the identity provider.
///
/// The email is the identity key of a `User` record. Requests for which the
/// provider yields no identity are unauthenticated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    pub email: String,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}
