use std::fmt;
use std::sync::Arc;

use cookie::SameSite;
use jiff::Timestamp;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::errors::ValidationError;

/// A name/value pair visible through a [`CookieStore`](crate::CookieStore).
///
/// Entries parsed out of the incoming `Cookie` header carry no attributes.
/// Entries queued for the response carry the [`CookieOptions`] they were set with.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieEntry {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) options: CookieOptions,
}

impl CookieEntry {
    /// Create a new entry with default options.
    ///
    /// Nothing is validated until the entry is handed to
    /// [`CookieStore::set_entry`](crate::CookieStore::set_entry).
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options: CookieOptions::default(),
        }
    }

    /// Replace the options attached to this entry.
    pub fn set_options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    /// The cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw cookie value, before any [`CookieEncoder`] is applied.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The attributes that will be sent alongside this cookie.
    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    /// Returns `true` if this entry instructs the client to drop the cookie.
    pub fn is_removal(&self) -> bool {
        self.value.is_empty() && self.options.max_age.is_some_and(|max_age| max_age <= 0)
    }
}

impl<N, V> From<(N, V)> for CookieEntry
where
    N: Into<String>,
    V: Into<String>,
{
    fn from((name, value): (N, V)) -> Self {
        CookieEntry::new(name, value)
    }
}

/// The attributes of an outgoing cookie.
///
/// Every field is optional: an absent attribute is omitted from the
/// `Set-Cookie` header. Fields left unset are filled in from
/// [`DefaultCookieAttributes`](crate::config::DefaultCookieAttributes)
/// when the cookie is queued.
///
/// ```rust
/// use request_cookies::{CookieOptions, Priority, SameSite};
///
/// let options = CookieOptions::new()
///     .set_path("/account")
///     .set_http_only(true)
///     .set_same_site(SameSite::Lax)
///     .set_priority(Priority::High)
///     .set_max_age(60 * 60);
/// assert_eq!(options.max_age, Some(3600));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct CookieOptions {
    /// `Expires`: the absolute point in time after which the cookie is dropped.
    pub expires: Option<Timestamp>,
    /// `Max-Age`, in seconds. Zero or negative values expire the cookie immediately.
    ///
    /// Clients give it precedence over `Expires` when both are present.
    pub max_age: Option<i64>,
    /// `Domain`.
    pub domain: Option<String>,
    /// `Path`.
    pub path: Option<String>,
    /// `Secure`.
    pub secure: Option<bool>,
    /// `HttpOnly`.
    pub http_only: Option<bool>,
    /// `SameSite`.
    pub same_site: Option<SameSite>,
    /// `Priority`.
    pub priority: Option<Priority>,
    /// `Partitioned`.
    pub partitioned: Option<bool>,
    /// A transformation applied to the value right before it is written
    /// to the `Set-Cookie` header.
    pub encode: Option<CookieEncoder>,
}

impl CookieOptions {
    /// Options with every attribute unset.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_expires(mut self, expires: Timestamp) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn set_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn set_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn set_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn set_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn set_http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    pub fn set_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Boolean shorthand for `SameSite`: `true` is `Strict`,
    /// `false` leaves the attribute out.
    pub fn set_same_site_flag(mut self, enabled: bool) -> Self {
        self.same_site = enabled.then_some(SameSite::Strict);
        self
    }

    pub fn set_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn set_partitioned(mut self, partitioned: bool) -> Self {
        self.partitioned = Some(partitioned);
        self
    }

    pub fn set_encode(mut self, encode: CookieEncoder) -> Self {
        self.encode = Some(encode);
        self
    }

    /// Check that every attribute can be written to a `Set-Cookie` header.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(domain) = &self.domain {
            let bare = domain.strip_prefix('.').unwrap_or(domain);
            if bare.is_empty() || !is_attribute_value(domain) {
                return Err(ValidationError::InvalidAttribute {
                    attribute: "Domain",
                    value: domain.clone(),
                });
            }
        }
        if let Some(path) = &self.path {
            if !path.starts_with('/') || !is_attribute_value(path) {
                return Err(ValidationError::InvalidAttribute {
                    attribute: "Path",
                    value: path.clone(),
                });
            }
        }
        Ok(())
    }

    /// The value as it will appear on the wire.
    pub(crate) fn encoded_value(&self, value: &str) -> String {
        match &self.encode {
            Some(encoder) => encoder.encode(value),
            None => value.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The `Priority` cookie attribute.
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => f.write_str("Low"),
            Priority::Medium => f.write_str("Medium"),
            Priority::High => f.write_str("High"),
        }
    }
}

/// The characters `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A value transformation applied when a cookie is serialized
/// into a `Set-Cookie` header.
///
/// Reads through the store always return the raw value.
#[derive(Clone)]
pub struct CookieEncoder(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl CookieEncoder {
    pub fn new<F>(encode: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(encode))
    }

    /// Percent-encode every character outside of the URI component set.
    pub fn percent_encoding() -> Self {
        Self::new(|value| utf8_percent_encode(value, URI_COMPONENT).to_string())
    }

    pub fn encode(&self, value: &str) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for CookieEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CookieEncoder(..)")
    }
}

impl PartialEq for CookieEncoder {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Which cookie to delete, and the scope the removal applies to.
///
/// A removal only reaches the client's cookie if `domain` and `path`
/// match the ones the cookie was set with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOptions {
    pub(crate) name: String,
    pub(crate) domain: Option<String>,
    pub(crate) path: Option<String>,
}

impl DeleteOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: None,
            path: None,
        }
    }

    pub fn set_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn set_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for DeleteOptions {
    fn from(name: &str) -> Self {
        DeleteOptions::new(name)
    }
}

impl From<String> for DeleteOptions {
    fn from(name: String) -> Self {
        DeleteOptions::new(name)
    }
}

/// `token` as defined in RFC 7230, section 3.2.6.
pub(crate) fn validate_name(name: &str) -> Result<(), ValidationError> {
    let is_tchar = |b: u8| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b);
    if name.is_empty() || !name.bytes().all(is_tchar) {
        return Err(ValidationError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// `cookie-value` as defined in RFC 6265, section 4.1.1.
pub(crate) fn validate_value(name: &str, value: &str) -> Result<(), ValidationError> {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    let is_cookie_octet =
        |b: u8| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E);
    if !inner.bytes().all(is_cookie_octet) {
        return Err(ValidationError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        });
    }
    Ok(())
}

/// A raw value must survive a trip through the `Cookie` header syntax,
/// whatever encoding is applied on the wire.
pub(crate) fn validate_raw_value(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.contains(';') || value.chars().any(char::is_control) || value.trim() != value {
        return Err(ValidationError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        });
    }
    Ok(())
}

fn is_attribute_value(value: &str) -> bool {
    value.bytes().all(|b| (0x21..=0x7E).contains(&b) && b != b';')
}
