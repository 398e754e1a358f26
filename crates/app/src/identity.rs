//! Request identity.
//!
//! Authentication itself lives upstream; what reaches this crate is an
//! explicit [`Shopper`] value carried into every cart, pricing and checkout
//! call. There are no ambient session lookups.

use thiserror::Error;

use crate::uuids::TypedUuid;

/// Marker for authenticated user identifiers.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// Marker for anonymous browser-session identifiers.
#[derive(Debug)]
pub struct Session;

/// Session UUID
pub type SessionUuid = TypedUuid<Session>;

/// The identity attached to a request: an authenticated user, an anonymous
/// session, or both (during the login merge window).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shopper {
    pub user: Option<UserUuid>,
    pub session: Option<SessionUuid>,
}

impl Shopper {
    #[must_use]
    pub const fn for_user(user: UserUuid) -> Self {
        Self {
            user: Some(user),
            session: None,
        }
    }

    #[must_use]
    pub const fn for_session(session: SessionUuid) -> Self {
        Self {
            user: None,
            session: Some(session),
        }
    }

    /// The key carts are looked up by: the user when authenticated,
    /// otherwise the anonymous session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Anonymous`] when the shopper carries
    /// neither identity.
    pub fn owner_key(&self) -> Result<OwnerKey, IdentityError> {
        self.user
            .map(OwnerKey::User)
            .or(self.session.map(OwnerKey::Session))
            .ok_or(IdentityError::Anonymous)
    }
}

/// The identity a cart is owned by — exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKey {
    User(UserUuid),
    Session(SessionUuid),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("request carries neither a user nor a session identity")]
    Anonymous,
}
