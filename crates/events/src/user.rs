use serde::{Deserialize, Serialize};

use naslet_core::{Entity, UserId};

/// A registered user. Any user may create events and participate in others'.
///
/// Users are identified externally by email or phone; the token subject is
/// one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: String,
    pub password_hash: String,
}

impl User {
    /// Whether `identity` names this user (email or phone, exact match).
    pub fn matches_identity(&self, identity: &str) -> bool {
        self.email.as_deref() == Some(identity) || self.phone.as_deref() == Some(identity)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}
