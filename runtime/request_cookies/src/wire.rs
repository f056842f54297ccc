//! Serialization of outgoing cookies into `Set-Cookie` header values.
use cookie::Cookie;
use jiff::Timestamp;
use time::OffsetDateTime;

use crate::entry::CookieEntry;

/// Render `entry` as the value of a `Set-Cookie` header.
///
/// The value goes through the entry's encoder, if any.
/// Attributes that are unset, or explicitly set to `false`, are left out,
/// with one exception: `SameSite=None` and `Partitioned` cookies always carry
/// `Secure`, even when `secure` is `false`, since clients reject them otherwise.
pub(crate) fn set_cookie_header_value(entry: &CookieEntry) -> String {
    let options = entry.options();
    let value = options.encoded_value(entry.value());
    let mut cookie = Cookie::build((entry.name().to_owned(), value));
    if let Some(path) = &options.path {
        cookie = cookie.path(path.clone());
    }
    if let Some(domain) = &options.domain {
        cookie = cookie.domain(domain.clone());
    }
    if let Some(expires) = options.expires {
        cookie = cookie.expires(to_offset_date_time(expires));
    }
    if let Some(max_age) = options.max_age {
        cookie = cookie.max_age(time::Duration::seconds(max_age.max(0)));
    }
    if options.secure == Some(true) {
        cookie = cookie.secure(true);
    }
    if options.http_only == Some(true) {
        cookie = cookie.http_only(true);
    }
    if let Some(same_site) = options.same_site {
        cookie = cookie.same_site(same_site);
    }
    if options.partitioned == Some(true) {
        cookie = cookie.partitioned(true);
    }

    let mut rendered = cookie.build().to_string();
    if let Some(priority) = options.priority {
        rendered.push_str(&format!("; Priority={priority}"));
    }
    rendered
}

/// Timestamps before the Unix epoch are clamped to it: they're
/// in the past either way.
fn to_offset_date_time(timestamp: Timestamp) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(timestamp.as_second().max(0))
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
