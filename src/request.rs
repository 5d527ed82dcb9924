use crate::error::Error;
use crate::model::UserId;

/// Metadata about an incoming request.
///
/// Contains the request identifier and the principal resolved by the
/// token-based auth middleware, if any.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Authenticated principal, if any
    pub principal: Option<Principal>,
}

/// An authenticated user, as resolved by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Id of the user record
    pub id: UserId,
    /// Login email, for log context only
    pub email: String,
}

impl RequestMeta {
    /// Turns the metadata into a [`Caller`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] if no principal is present.
    pub fn authenticate(self) -> Result<Caller, Error> {
        let principal = self.principal.ok_or(Error::Unauthenticated)?;
        Ok(Caller {
            request_id: self.request_id,
            user_id: principal.id,
        })
    }
}

/// The authenticated caller of a conduit operation.
///
/// Every service operation takes a `Caller`; reads and writes are scoped to
/// `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    request_id: String,
    user_id: UserId,
}

impl Caller {
    /// Builds a caller directly, for trusted in-process use.
    pub fn new(request_id: impl Into<String>, user_id: UserId) -> Self {
        Self {
            request_id: request_id.into(),
            user_id,
        }
    }

    /// The request id, attached to every log event.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The calling user's id.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
