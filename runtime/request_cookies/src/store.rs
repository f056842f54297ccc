use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use http::request::Parts;
use indexmap::{IndexMap, IndexSet};
use jiff::Timestamp;
use tracing::Level;
use tracing_log_error::log_error;

use crate::config::CookieStoreConfig;
use crate::entry::{
    CookieEntry, CookieOptions, DeleteOptions, validate_name, validate_raw_value, validate_value,
};
use crate::errors::{DeleteCookieError, OriginMismatchError, SetCookieError, StateError};
use crate::incoming::{parse_cookie_header, parse_cookie_headers};
use crate::origin::RequestOrigin;
use crate::state::{ExecutionContext, ReadOnlyReason, StoreState};
use crate::wire::set_cookie_header_value;

/// The cookies attached to the current request, plus the ones queued for the response.
///
/// A store is created once per request and passed to every handler that
/// needs it. It combines two views:
///
/// - an immutable snapshot of the cookies the client sent in the `Cookie` header
/// - an overlay of the cookies set or deleted while handling the request
///
/// Reads ([`get`](Self::get), [`get_all`](Self::get_all), [`has`](Self::has),
/// [`to_string`](ToString::to_string)) observe the overlay merged over the snapshot.
/// Writes ([`set`](Self::set), [`delete`](Self::delete), [`clear`](Self::clear))
/// only touch the overlay, and are rejected with a [`StateError`] once the
/// store is read-only.
///
/// # Example
///
/// ```rust
/// use request_cookies::{CookieOptions, CookieStore};
///
/// let mut store = CookieStore::parse("theme=dark; lang=en");
/// assert_eq!(store.get("theme").unwrap().value(), "dark");
///
/// store.set("theme", "light", CookieOptions::new()).unwrap();
/// assert_eq!(store.get("theme").unwrap().value(), "light");
/// assert_eq!(store.to_string(), "theme=light; lang=en");
///
/// // The overlay is what will be sent back to the client.
/// assert_eq!(store.header_values(), vec!["theme=light; Path=/".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct CookieStore {
    incoming: Vec<CookieEntry>,
    outgoing: IndexMap<String, CookieEntry>,
    state: StoreState,
    origin: RequestOrigin,
    config: Arc<CookieStoreConfig>,
}

/// Configure a [`CookieStore`] before parsing the incoming cookies.
///
/// Built via [`CookieStore::builder`].
#[derive(Debug, Clone, Default)]
pub struct CookieStoreBuilder {
    origin: Option<RequestOrigin>,
    context: ExecutionContext,
    config: Arc<CookieStoreConfig>,
}

impl CookieStoreBuilder {
    /// The origin of the request.
    ///
    /// Defaults to `http://localhost`, unless the store is built
    /// via [`from_request_parts`](Self::from_request_parts).
    pub fn origin(mut self, origin: RequestOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The context the request is handled in.
    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// The defaults applied to outgoing cookies, and whether deletions are origin-checked.
    pub fn config(mut self, config: impl Into<Arc<CookieStoreConfig>>) -> Self {
        self.config = config.into();
        self
    }

    /// A store with no incoming cookies.
    pub fn empty(self) -> CookieStore {
        self.build(Vec::new())
    }

    /// Build a store out of the raw value of a `Cookie` header.
    pub fn parse(self, header: &str) -> CookieStore {
        let mut incoming = Vec::new();
        parse_cookie_header(header, &mut incoming);
        self.build(incoming)
    }

    /// Build a store out of every `Cookie` header in `headers`.
    pub fn from_headers(self, headers: &HeaderMap) -> CookieStore {
        self.build(parse_cookie_headers(headers))
    }

    /// Build a store out of the head of the incoming request.
    ///
    /// The origin is derived from the request, unless it was set explicitly.
    pub fn from_request_parts(mut self, parts: &Parts) -> CookieStore {
        if self.origin.is_none() {
            self.origin = Some(RequestOrigin::from_request_parts(parts));
        }
        self.from_headers(&parts.headers)
    }

    fn build(self, incoming: Vec<CookieEntry>) -> CookieStore {
        tracing::trace!(
            cookies.incoming = incoming.len(),
            context = ?self.context,
            "Created a cookie store for the current request"
        );
        CookieStore {
            incoming,
            outgoing: IndexMap::new(),
            state: self.context.into(),
            origin: self.origin.unwrap_or_default(),
            config: self.config,
        }
    }
}

impl CookieStore {
    /// Start configuring a store: origin, execution context and configuration.
    pub fn builder() -> CookieStoreBuilder {
        CookieStoreBuilder::default()
    }

    /// Build a store out of the raw value of a `Cookie` header, with the
    /// default origin, context and configuration.
    pub fn parse(header: &str) -> Self {
        Self::builder().parse(header)
    }

    /// Build a store out of every `Cookie` header in `headers`, with the
    /// default origin, context and configuration.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::builder().from_headers(headers)
    }

    /// Retrieve the cookie named `name`.
    ///
    /// A cookie set (or deleted) while handling the request shadows the
    /// one sent by the client.
    /// If the client sent several cookies named `name`, the first one is returned.
    pub fn get(&self, name: &str) -> Option<CookieEntry> {
        self.lookup(name).cloned()
    }

    /// Retrieve every cookie named `name` or, if `name` is `None`, every
    /// visible cookie.
    ///
    /// The returned vector is a snapshot: later writes don't affect it.
    pub fn get_all(&self, name: Option<&str>) -> Vec<CookieEntry> {
        match name {
            Some(name) => match self.outgoing.get(name) {
                Some(entry) => vec![entry.clone()],
                None => self
                    .incoming
                    .iter()
                    .filter(|entry| entry.name == name)
                    .cloned()
                    .collect(),
            },
            None => self.merged().cloned().collect(),
        }
    }

    /// Returns `true` if [`get`](Self::get) would return a cookie.
    pub fn has(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Queue a cookie for the response.
    ///
    /// It replaces any cookie with the same name that was queued earlier in
    /// the request, and shadows the one sent by the client.
    /// The value is stored as-is: [`CookieOptions::encode`] is only
    /// applied when the `Set-Cookie` header is rendered.
    /// Raw values containing `;`, control characters or surrounding
    /// whitespace are rejected even when an encoder would make them legal
    /// on the wire, since they can't be read back from a `Cookie` header.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        options: CookieOptions,
    ) -> Result<(), SetCookieError> {
        self.set_entry(CookieEntry::new(name, value).set_options(options))
    }

    /// Queue a fully-formed [`CookieEntry`] for the response.
    ///
    /// Check out [`set`](Self::set) for more details.
    pub fn set_entry(&mut self, entry: CookieEntry) -> Result<(), SetCookieError> {
        self.try_set(entry).inspect_err(|e| {
            log_error!(e, level: Level::WARN, "Failed to set a cookie");
        })
    }

    fn try_set(&mut self, mut entry: CookieEntry) -> Result<(), SetCookieError> {
        self.ensure_writable("set")?;
        validate_name(&entry.name)?;
        validate_raw_value(&entry.name, &entry.value)?;
        self.config.defaults.apply(&mut entry.options);
        entry.options.validate()?;
        validate_value(&entry.name, &entry.options.encoded_value(&entry.value))?;

        tracing::trace!(cookie.name = %entry.name, "Queued an outgoing cookie");
        self.outgoing.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Instruct the client to remove the cookie named `name`.
    ///
    /// The cookie isn't dropped from the store: it is replaced by a removal
    /// cookie (empty value, `Max-Age=0`, `Expires` at the Unix epoch)
    /// that will be sent with the response.
    pub fn delete(&mut self, name: &str) -> Result<(), DeleteCookieError> {
        self.delete_with(DeleteOptions::new(name))
    }

    /// Remove several cookies at once.
    ///
    /// Either all removals are queued or, if any of them is rejected, none is.
    pub fn delete_many<I, O>(&mut self, names: I) -> Result<(), DeleteCookieError>
    where
        I: IntoIterator<Item = O>,
        O: Into<DeleteOptions>,
    {
        self.try_delete("delete", names.into_iter().map(Into::into))
            .inspect_err(|e| {
                log_error!(e, level: Level::WARN, "Failed to delete cookies");
            })
    }

    /// Remove a cookie set with a specific `Domain` and/or `Path`.
    ///
    /// Unset scope attributes fall back to the configured defaults.
    pub fn delete_with(&mut self, options: DeleteOptions) -> Result<(), DeleteCookieError> {
        self.delete_many([options])
    }

    /// Remove every cookie visible through the store.
    ///
    /// Calling it more than once has the same effect as calling it once.
    pub fn clear(&mut self) -> Result<(), DeleteCookieError> {
        let names: IndexSet<String> = self.merged().map(|entry| entry.name.clone()).collect();
        self.try_delete("clear", names.into_iter().map(DeleteOptions::new))
            .inspect_err(|e| {
                log_error!(e, level: Level::WARN, "Failed to clear cookies");
            })
    }

    fn try_delete(
        &mut self,
        operation: &'static str,
        removals: impl Iterator<Item = DeleteOptions>,
    ) -> Result<(), DeleteCookieError> {
        self.ensure_writable(operation)?;
        let tombstones = removals
            .map(|removal| self.tombstone(removal))
            .collect::<Result<Vec<_>, _>>()?;
        for tombstone in tombstones {
            tracing::trace!(cookie.name = %tombstone.name, "Queued a removal cookie");
            self.outgoing.insert(tombstone.name.clone(), tombstone);
        }
        Ok(())
    }

    fn tombstone(&self, removal: DeleteOptions) -> Result<CookieEntry, DeleteCookieError> {
        let DeleteOptions { name, domain, path } = removal;
        validate_name(&name)?;

        let mut options = CookieOptions {
            domain,
            path,
            max_age: Some(0),
            expires: Some(Timestamp::UNIX_EPOCH),
            ..Default::default()
        };
        let defaults = &self.config.defaults;
        if options.path.is_none() {
            options.path.clone_from(&defaults.path);
        }
        if options.domain.is_none() {
            options.domain.clone_from(&defaults.domain);
        }
        // Clients ignore removals of prefixed cookies that don't honour the prefix rules.
        if is_secure_prefixed(&name) {
            options.secure = Some(true);
        }
        if name.starts_with("__Host-") {
            options.path = Some("/".into());
            options.domain = None;
        }
        options.validate()?;
        self.check_origin(&name, &options)?;

        Ok(CookieEntry {
            name,
            value: String::new(),
            options,
        })
    }

    fn check_origin(&self, name: &str, options: &CookieOptions) -> Result<(), OriginMismatchError> {
        if !self.config.strict_origin {
            return Ok(());
        }
        let cookie_host = options
            .domain
            .as_deref()
            .map(|d| d.strip_prefix('.').unwrap_or(d))
            .unwrap_or(self.origin.host());
        let set_as_secure = self
            .outgoing
            .get(name)
            .is_some_and(|entry| entry.options.secure == Some(true) && !entry.is_removal());
        let requires_secure = is_secure_prefixed(name) || set_as_secure;

        let domain_mismatch = options
            .domain
            .as_deref()
            .is_some_and(|domain| !self.origin.domain_matches(domain));
        let scheme_mismatch = requires_secure && !self.origin.is_secure();
        if domain_mismatch || scheme_mismatch {
            let cookie_scheme = if requires_secure {
                "https"
            } else {
                self.origin.scheme().as_str()
            };
            return Err(OriginMismatchError {
                name: name.to_owned(),
                cookie_origin: format!("{cookie_scheme}://{cookie_host}"),
                request_origin: self.origin.to_string(),
            });
        }
        Ok(())
    }

    /// Render the overlay as `Set-Cookie` header values, one per cookie.
    ///
    /// The store is left untouched: use [`finalize`](Self::finalize)
    /// when the response headers are actually sent.
    pub fn header_values(&self) -> Vec<String> {
        self.outgoing.values().map(set_cookie_header_value).collect()
    }

    /// Mark the response headers as sent and return the `Set-Cookie`
    /// header values for the overlay.
    ///
    /// The store becomes read-only: every later write fails with a [`StateError`].
    /// Finalizing twice is an error, since the cookies have already been flushed.
    pub fn finalize(&mut self) -> Result<Vec<String>, StateError> {
        self.ensure_not_finalized()?;
        let values = self.header_values();
        self.mark_finalized();
        Ok(values)
    }

    pub(crate) fn ensure_not_finalized(&self) -> Result<(), StateError> {
        match self.state {
            StoreState::ReadOnly(ReadOnlyReason::HeadersFinalized) => Err(StateError {
                operation: "finalize",
                reason: ReadOnlyReason::HeadersFinalized,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn mark_finalized(&mut self) {
        self.state = StoreState::ReadOnly(ReadOnlyReason::HeadersFinalized);
        tracing::trace!(
            cookies.outgoing = self.outgoing.len(),
            "Flushed outgoing cookies"
        );
    }

    /// Queue an entry bypassing every check, to exercise failure paths
    /// that validation makes unreachable.
    #[cfg(test)]
    pub(crate) fn queue_unchecked(&mut self, entry: CookieEntry) {
        self.outgoing.insert(entry.name.clone(), entry);
    }

    /// Iterate over every visible cookie, in order.
    ///
    /// Cookies sent by the client come first, in the order they appeared in the
    /// `Cookie` header, with their value replaced by the overlay's when the
    /// same name was set during the request.
    /// Cookies that only exist in the overlay follow, in the order they were first set.
    pub fn iter(&self) -> impl Iterator<Item = &CookieEntry> + '_ {
        self.merged()
    }

    /// The cookies queued for the response, in the order they were first set.
    pub fn pending(&self) -> impl Iterator<Item = &CookieEntry> + '_ {
        self.outgoing.values()
    }

    /// The number of visible cookies.
    pub fn len(&self) -> usize {
        self.merged().count()
    }

    /// Returns `true` if no cookie is visible, removal cookies included.
    pub fn is_empty(&self) -> bool {
        self.merged().next().is_none()
    }

    /// Whether the store currently accepts writes.
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// The origin deletions are checked against.
    pub fn origin(&self) -> &RequestOrigin {
        &self.origin
    }

    fn ensure_writable(&self, operation: &'static str) -> Result<(), StateError> {
        match self.state {
            StoreState::Mutable => Ok(()),
            StoreState::ReadOnly(reason) => Err(StateError { operation, reason }),
        }
    }

    fn lookup(&self, name: &str) -> Option<&CookieEntry> {
        self.outgoing
            .get(name)
            .or_else(|| self.incoming.iter().find(|entry| entry.name == name))
    }

    fn merged(&self) -> impl Iterator<Item = &CookieEntry> + '_ {
        let mut shadowed = HashSet::new();
        let incoming = self
            .incoming
            .iter()
            .filter_map(move |entry| match self.outgoing.get(&entry.name) {
                Some(overlay) => shadowed.insert(entry.name.as_str()).then_some(overlay),
                None => Some(entry),
            });
        let overlay_only = self
            .outgoing
            .values()
            .filter(move |entry| !self.incoming.iter().any(|c| c.name == entry.name));
        incoming.chain(overlay_only)
    }
}

impl fmt::Display for CookieStore {
    /// The merged view in `Cookie` header syntax, using raw values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.merged().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}={}", entry.name, entry.value)?;
        }
        Ok(())
    }
}

fn is_secure_prefixed(name: &str) -> bool {
    name.starts_with("__Secure-") || name.starts_with("__Host-")
}
