//! Parsing of the `Cookie` request header.
use cookie::Cookie;
use http::HeaderMap;
use http::header::COOKIE;
use tracing::Level;
use tracing_log_error::log_error;

use crate::entry::CookieEntry;

/// Parse the pairs in a `Cookie` header, in order.
///
/// Parsing is lenient: pairs without a `=` or with an empty name are skipped.
/// Values are kept as sent by the client, no decoding is performed.
pub(crate) fn parse_cookie_header(header: &str, cookies: &mut Vec<CookieEntry>) {
    for pair in Cookie::split_parse(header) {
        match pair {
            Ok(cookie) => cookies.push(CookieEntry::new(cookie.name(), cookie.value())),
            Err(e) => {
                tracing::debug!(
                    error.message = %e,
                    "Skipping a malformed pair in the `Cookie` header"
                );
            }
        }
    }
}

/// Parse every `Cookie` header attached to a request.
///
/// Headers that aren't valid visible ASCII are skipped.
pub(crate) fn parse_cookie_headers(headers: &HeaderMap) -> Vec<CookieEntry> {
    let mut cookies = Vec::new();
    for header in headers.get_all(COOKIE) {
        match header.to_str() {
            Ok(header) => parse_cookie_header(header, &mut cookies),
            Err(e) => {
                log_error!(
                    e,
                    level: Level::WARN,
                    "Ignoring a `Cookie` header that contains non-printable characters"
                );
            }
        }
    }
    cookies
}
