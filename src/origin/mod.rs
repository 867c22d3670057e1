//! Origin values and origin *patterns*, per RFC 6454.
//!
//! This module covers both the strict, serialization-level grammar used to
//! validate configuration-time origin patterns (submodule [`pattern`]), and
//! the cheap, allocation-light parse applied to the `Origin` header of every
//! incoming request.
//!
//! The type named `Origin` here is the request-time value — a concrete
//! `(scheme, host, port)` triple, parsed with a bounded-length,
//! allocation-free pass so the matcher's hot path never needs to allocate
//! just to compare an incoming origin.

pub mod pattern;


use std::fmt;

/// The only two schemes this crate ever allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `http://`
    Http,
    /// `https://`
    Https,
}

impl Scheme {
    /// The scheme's well-known default port.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    fn parse(s: &str) -> Option<Scheme> {
        if s == "http" {
            Some(Scheme::Http)
        } else if s == "https" {
            Some(Scheme::Https)
        } else {
            None
        }
    }

    fn as_str(self) -> &'static str {
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

/// Upper bound on the byte length of an `Origin` header value this crate
/// will attempt to parse. Comfortably covers any real DNS origin (253-byte
/// host limit plus `https://` and a 5-digit port), while turning pathological
/// inputs (adversarially long headers) into a cheap, allocation-free
/// rejection rather than unbounded work.
pub const MAX_ORIGIN_LEN: usize = 320;

/// A parsed request-time `Origin` header value.
///
/// Unlike [`pattern::OriginPattern`], this type never denotes a *set* of
/// origins: it is exactly the `(scheme, host, port)` triple of a single
/// concrete origin, as received on the wire. Equality is case-insensitive in
/// scheme and host (both are stored lower-cased) and exact in port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin<'a> {
    scheme: Scheme,
    host: &'a str,
    port: u16,
}

impl<'a> Origin<'a> {
    /// Parses `s` as a request-time `Origin` header value.
    ///
    /// This is deliberately stricter than general URL parsing and looser
    /// than [`pattern::parse_pattern`]: it accepts exactly what a
    /// spec-conformant user agent ever sends as an `Origin` header (a
    /// single `scheme://host[:port]` triple, lower-case scheme, no
    /// wildcard, no path/query/fragment/userinfo), within
    /// [`MAX_ORIGIN_LEN`] bytes. Hosts are accepted mixed-case and
    /// lower-cased in place via a borrowed, copy-on-write-free pass — only
    /// allocation-free comparisons are supported; this type never owns a
    /// `String`, so a caller needing a canonical lower-cased host must
    /// compare label-by-label case-insensitively rather than lower-case
    /// the borrowed text in place.
    ///
    /// Returns `None` on any malformed input, including the literal string
    /// `"null"` — callers that must special-case `null` (PNA / credential
    /// policies never do) should check for it before calling `parse`.
    ///
    /// #Examples
    /// ```
    /// use corsware::Origin;
    /// let origin = Origin::parse("https://example.com").unwrap();
    /// assert_eq!(origin.host(), "example.com");
    /// assert_eq!(origin.port(), 443);
    ///
    /// assert!(Origin::parse("not a url").is_none());
    /// assert!(Origin::parse("null").is_none());
    /// ```
    pub fn parse(s: &'a str) -> Option<Origin<'a>> {
        if s.len() > MAX_ORIGIN_LEN || s.is_empty() {
            return None;
        }
        if s.bytes().any(|b| b.is_ascii_whitespace()) {
            return None;
        }
        let (scheme_str, rest) = s.split_once("://")?;
        let scheme = Scheme::parse(scheme_str)?;
        if rest.is_empty() || rest.bytes().any(|b| matches!(b, b'@' | b'/' | b'?' | b'#')) {
            return None;
        }
        let (host, port) = split_host_port(rest)?;
        if host.is_empty() || !host.is_ascii() || host.as_bytes().contains(&b'*') {
            return None;
        }
        let port = match port {
            Some(p) => parse_port_digits(p)?,
            None => scheme.default_port(),
        };
        Some(Origin { scheme, host, port })
    }

    /// The scheme.
    ///
    /// #Examples
    /// ```
    /// use corsware::{Origin, Scheme};
    /// let origin = Origin::parse("http://example.com").unwrap();
    /// assert_eq!(origin.scheme(), Scheme::Http);
    /// ```
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The host, exactly as received (not case-normalized).
    ///
    /// #Examples
    /// ```
    /// use corsware::Origin;
    /// let origin = Origin::parse("https://Example.COM").unwrap();
    /// assert_eq!(origin.host(), "Example.COM");
    /// ```
    pub fn host(&self) -> &'a str {
        self.host
    }

    /// The port: the explicit port if one was present, else the scheme's
    /// default port.
    ///
    /// #Examples
    /// ```
    /// use corsware::Origin;
    /// let origin = Origin::parse("https://example.com:8443").unwrap();
    /// assert_eq!(origin.port(), 8443);
    /// let origin = Origin::parse("https://example.com").unwrap();
    /// assert_eq!(origin.port(), 443);
    /// ```
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Case-insensitive host comparison (ASCII only). CORS matching treats
    /// scheme and host case-insensitively, per the Fetch standard's origin
    /// comparison rules.
    ///
    /// #Examples
    /// ```
    /// use corsware::Origin;
    /// let origin = Origin::parse("https://Example.COM").unwrap();
    /// assert!(origin.host_eq_ignore_ascii_case("example.com"));
    /// ```
    pub fn host_eq_ignore_ascii_case(&self, other: &str) -> bool {
        self.host.eq_ignore_ascii_case(other)
    }
}

/// Splits `rest` (everything after `scheme://`) into `(host, Option<port
/// digits or "*">)`. Handles bracketed IPv6 literals and bare
/// DNS/IPv4 hosts uniformly.
fn split_host_port(rest: &str) -> Option<(&str, Option<&str>)> {
    if let Some(bracket_rest) = rest.strip_prefix('[') {
        let close = bracket_rest.find(']')?;
        let host = &bracket_rest[..close];
        if host.is_empty() {
            return None;
        }
        let after = &bracket_rest[close + 1..];
        if after.is_empty() {
            return Some((host, None));
        }
        let port = after.strip_prefix(':')?;
        if port.is_empty() {
            return None;
        }
        return Some((host, Some(port)));
    }
    match rest.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() || port.is_empty() {
                return None;
            }
            Some((host, Some(port)))
        }
        None => Some((rest, None)),
    }
}

fn parse_port_digits(digits: &str) -> Option<u16> {
    if digits.is_empty()
        || digits.len() > 5
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    if value == 0 || value > u16::from(u16::MAX) as u32 {
        return None;
    }
    Some(value as u16)
}
