/*!
Request-scoped cookie access for server-rendered HTTP applications.

# Overview

Each incoming request gets its own [`CookieStore`]. It exposes the cookies
sent by the client in the `Cookie` header and collects the cookies the server
wants to set, or remove, in the response.

The store has two states:

- **mutable**, while a server action or a route handler is running.
  Cookies can be read, set and deleted.
- **read-only**, while a server component is being rendered or once the
  response headers have been sent. Cookies can only be read: any write
  fails with a [`StateError`](errors::StateError) rather than being silently
  dropped, since the client would never receive it.

# Lifecycle

1. Build the store when the request comes in, with
   [`CookieStoreBuilder::from_request_parts`].
2. Pass it, by reference, to whatever needs to read or write cookies.
3. Flush it into the response with [`inject_response_cookies`] right before
   the headers are sent.

```rust
use request_cookies::{CookieOptions, CookieStore, ExecutionContext, inject_response_cookies};

let request = http::Request::get("https://example.com/settings")
    .header("cookie", "theme=dark; lang=en")
    .body(())
    .unwrap();
let (parts, _body) = request.into_parts();

let mut store = CookieStore::builder()
    .context(ExecutionContext::ServerAction)
    .from_request_parts(&parts);
store.set("theme", "light", CookieOptions::new()).unwrap();

let response = inject_response_cookies(http::Response::new(()), &mut store).unwrap();
assert_eq!(response.headers()["set-cookie"], "theme=light; Path=/");

// The headers are gone: further writes are rejected.
assert!(store.set("lang", "it", CookieOptions::new()).is_err());
```

# Configuration

[`CookieStoreConfig`](config::CookieStoreConfig) controls the attributes applied
to outgoing cookies by default and whether deletions are checked against the
request origin. It can be loaded from a YAML file and environment variables.
*/
pub mod config;
mod entry;
pub mod errors;
mod incoming;
mod origin;
mod response;
mod shared;
mod state;
mod store;
mod wire;

pub use cookie::SameSite;
pub use entry::{CookieEncoder, CookieEntry, CookieOptions, DeleteOptions, Priority};
pub use origin::{RequestOrigin, Scheme};
pub use response::{append_set_cookie_headers, inject_response_cookies};
pub use shared::SharedCookieStore;
pub use state::{ExecutionContext, ReadOnlyReason, StoreState};
pub use store::{CookieStore, CookieStoreBuilder};
