use std::fmt;

use http::header::HOST;
use http::request::Parts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The protocol the request was received over.
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scheme and host of the incoming request.
///
/// It scopes which cookies the request is allowed to delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestOrigin {
    scheme: Scheme,
    host: String,
}

impl RequestOrigin {
    /// The host is normalized to lowercase, without port.
    pub fn new(scheme: Scheme, host: &str) -> Self {
        Self {
            scheme,
            host: strip_port(host).to_ascii_lowercase(),
        }
    }

    /// Determine the origin of a request from its head.
    ///
    /// The scheme comes from the request URI, falling back to the
    /// `X-Forwarded-Proto` header and then to `http`.
    /// The host comes from the request URI, falling back to the `Host` header
    /// and then to `localhost`.
    pub fn from_request_parts(parts: &Parts) -> Self {
        let forwarded_proto = || {
            parts
                .headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().eq_ignore_ascii_case("https"))
        };
        let scheme = match parts.uri.scheme_str() {
            Some(scheme) if scheme.eq_ignore_ascii_case("https") => Scheme::Https,
            Some(_) => Scheme::Http,
            None if forwarded_proto().unwrap_or(false) => Scheme::Https,
            None => Scheme::Http,
        };
        let host = parts
            .uri
            .host()
            .or_else(|| parts.headers.get(HOST).and_then(|v| v.to_str().ok()))
            .unwrap_or("localhost");
        Self::new(scheme, host)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns `true` if the request was received over a secure channel.
    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// Domain matching, as defined in RFC 6265, section 5.1.3.
    ///
    /// A leading dot in `domain` is ignored.
    pub fn domain_matches(&self, domain: &str) -> bool {
        let domain = domain.strip_prefix('.').unwrap_or(domain).to_ascii_lowercase();
        if self.host == domain {
            return true;
        }
        if self.is_ip_address() {
            return false;
        }
        self.host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
    }

    fn is_ip_address(&self) -> bool {
        self.host.starts_with('[') || self.host.parse::<std::net::Ipv4Addr>().is_ok()
    }
}

impl Default for RequestOrigin {
    fn default() -> Self {
        Self::new(Scheme::Http, "localhost")
    }
}

impl fmt::Display for RequestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        // IPv6 literal, e.g. `[::1]:8080`
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}
