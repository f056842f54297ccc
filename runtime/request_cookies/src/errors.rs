//! Errors that can occur when working with a [`CookieStore`](crate::CookieStore).
use http::StatusCode;

use crate::state::ReadOnlyReason;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
#[error("Cannot {operation} cookies: {reason}")]
/// A write was attempted while the store was read-only.
///
/// The store is read-only either because it was created for a rendering
/// context, or because the response headers have already been sent.
pub struct StateError {
    /// The operation that was rejected (e.g. `set`, `delete`).
    pub operation: &'static str,
    /// Why the store doesn't accept writes.
    pub reason: ReadOnlyReason,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
#[error(
    "Cannot delete the `{name}` cookie: it belongs to `{cookie_origin}`, \
    but the request comes from `{request_origin}`"
)]
/// A deletion was attempted from an origin that doesn't own the cookie.
pub struct OriginMismatchError {
    /// The name of the cookie.
    pub name: String,
    /// The origin the cookie is scoped to.
    pub cookie_origin: String,
    /// The origin of the incoming request.
    pub request_origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
/// A cookie that can't be serialized into a legal `Set-Cookie` header.
pub enum ValidationError {
    #[error("`{name}` is not a valid cookie name: it must be a non-empty HTTP token")]
    /// The name contains separators, whitespace or control characters.
    InvalidName {
        /// The rejected name.
        name: String,
    },
    #[error(
        "The value of the `{name}` cookie contains characters that can't appear in a `Set-Cookie` header"
    )]
    /// The value (after encoding) contains characters outside of the cookie-octet range.
    InvalidValue {
        /// The name of the cookie.
        name: String,
        /// The rejected value, as it would have been sent on the wire.
        value: String,
    },
    #[error("`{value}` is not a valid value for the `{attribute}` cookie attribute")]
    /// One of the cookie attributes is malformed.
    InvalidAttribute {
        /// The attribute name, as it appears on the wire.
        attribute: &'static str,
        /// The rejected value.
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`CookieStore::set`](crate::CookieStore::set).
pub enum SetCookieError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`CookieStore::delete`](crate::CookieStore::delete)
/// and [`CookieStore::clear`](crate::CookieStore::clear).
pub enum DeleteCookieError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    OriginMismatch(#[from] OriginMismatchError),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error type returned by [`inject_response_cookies`](crate::inject_response_cookies).
pub enum InjectResponseCookiesError {
    #[error("The response cookies have already been flushed")]
    AlreadyFinalized(#[from] StateError),
    #[error("Some characters in the `Set-Cookie` header value are not printable ASCII characters.")]
    InvalidHeaderValue {
        /// The invalid header value.
        invalid_header_value: String,
    },
}

impl InjectResponseCookiesError {
    /// Convert an [`InjectResponseCookiesError`] into an HTTP response.
    ///
    /// It returns a `500 Internal Server Error` to the caller,
    /// since failure is likely due to mismanagement on the server side.
    pub fn into_response<B: Default>(&self) -> http::Response<B> {
        let mut response = http::Response::new(B::default());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to load the cookie configuration")]
/// The error returned by [`CookieStoreConfig::load`](crate::config::CookieStoreConfig::load).
pub struct ConfigLoadError(#[source] pub(crate) anyhow::Error);
