//! The execution contexts a store can be created for, and the read/write
//! state machine they drive.
use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Where the request is being handled.
///
/// It determines whether the [`CookieStore`](crate::CookieStore) starts out
/// mutable or read-only.
pub enum ExecutionContext {
    /// A form action or a mutation invoked by the client.
    /// Cookies can be written.
    ServerAction,
    /// A route handler producing a response directly.
    /// Cookies can be written.
    #[default]
    RouteHandler,
    /// Rendering of a server component.
    /// Cookies can only be read.
    ServerComponent,
}

impl ExecutionContext {
    /// Returns `true` if a store created for this context accepts writes.
    pub fn allows_writes(self) -> bool {
        match self {
            ExecutionContext::ServerAction | ExecutionContext::RouteHandler => true,
            ExecutionContext::ServerComponent => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Whether a [`CookieStore`](crate::CookieStore) accepts writes.
///
/// Reads are always allowed.
/// Once a store has transitioned to [`ReadOnlyReason::HeadersFinalized`]
/// it never goes back.
pub enum StoreState {
    Mutable,
    ReadOnly(ReadOnlyReason),
}

impl StoreState {
    /// Returns `true` if the store accepts `set`, `delete` and `clear`.
    pub fn is_mutable(self) -> bool {
        matches!(self, StoreState::Mutable)
    }
}

impl From<ExecutionContext> for StoreState {
    fn from(context: ExecutionContext) -> Self {
        if context.allows_writes() {
            StoreState::Mutable
        } else {
            StoreState::ReadOnly(ReadOnlyReason::RenderingContext)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Why a [`CookieStore`](crate::CookieStore) is read-only.
pub enum ReadOnlyReason {
    /// The store was created for a server component.
    RenderingContext,
    /// The response headers have been sent to the client.
    HeadersFinalized,
}

impl fmt::Display for ReadOnlyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadOnlyReason::RenderingContext => {
                f.write_str("cookies are read-only while rendering a server component")
            }
            ReadOnlyReason::HeadersFinalized => {
                f.write_str("the response headers have already been sent to the client")
            }
        }
    }
}
