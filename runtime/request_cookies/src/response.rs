use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue};

use crate::errors::InjectResponseCookiesError;
use crate::store::CookieStore;

/// Attach the cookies queued in `store` to the outgoing response.
///
/// The store is finalized: no more cookies can be set or deleted afterwards.
pub fn inject_response_cookies<B>(
    mut response: http::Response<B>,
    store: &mut CookieStore,
) -> Result<http::Response<B>, InjectResponseCookiesError> {
    append_set_cookie_headers(response.headers_mut(), store)?;
    Ok(response)
}

/// Append one `Set-Cookie` header to `headers` for each cookie queued in `store`.
///
/// On success the store is finalized: no more cookies can be set or deleted afterwards.
/// If any of the values can't be converted into a header, both `headers` and
/// `store` are left untouched.
pub fn append_set_cookie_headers(
    headers: &mut HeaderMap,
    store: &mut CookieStore,
) -> Result<(), InjectResponseCookiesError> {
    store.ensure_not_finalized()?;
    let header_values = store
        .header_values()
        .into_iter()
        .map(|value| {
            HeaderValue::from_str(&value).map_err(|_| {
                InjectResponseCookiesError::InvalidHeaderValue {
                    invalid_header_value: value,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    store.mark_finalized();
    for value in header_values {
        headers.append(SET_COOKIE, value);
    }
    Ok(())
}
