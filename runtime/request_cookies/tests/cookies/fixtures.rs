use request_cookies::{
    CookieEntry, CookieStore, ExecutionContext, RequestOrigin, Scheme, config::CookieStoreConfig,
};

/// The origin used by most tests.
pub fn secure_origin() -> RequestOrigin {
    RequestOrigin::new(Scheme::Https, "shop.example.com")
}

/// A mutable store for a route handler served over HTTPS.
pub fn store(cookie_header: &str) -> CookieStore {
    store_in(ExecutionContext::RouteHandler, cookie_header)
}

/// A store for the given execution context, served over HTTPS.
pub fn store_in(context: ExecutionContext, cookie_header: &str) -> CookieStore {
    CookieStore::builder()
        .origin(secure_origin())
        .context(context)
        .parse(cookie_header)
}

/// A mutable store with a custom configuration and origin.
pub fn configured_store(
    config: CookieStoreConfig,
    origin: RequestOrigin,
    cookie_header: &str,
) -> CookieStore {
    CookieStore::builder()
        .origin(origin)
        .config(config)
        .parse(cookie_header)
}

/// Extract the `(name, value)` pairs, in order.
pub fn pairs(entries: &[CookieEntry]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|entry| (entry.name().to_owned(), entry.value().to_owned()))
        .collect()
}
