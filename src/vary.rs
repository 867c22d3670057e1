//! `Vary` header management.
//!
//! A response may already carry a `Vary` value written by upstream
//! middleware; this module only ever **appends** to it, never replaces it.
//! The common case — no prior `Vary` — is a single `HeaderMap::append` of a
//! `'static` value and allocates nothing. Only when a prior value exists does
//! combining it with this crate's contribution cost one allocation.

use http::{HeaderMap, HeaderValue};

/// The single token actual (non-preflight) responses vary on, when the
/// policy requires it at all (multi-origin / subdomain-wildcard policies).
pub const VARY_ORIGIN: HeaderValue = HeaderValue::from_static("Origin");

/// The fixed four-token Vary set every preflight response carries,
/// regardless of outcome. Order is part of the cache-key contract and must
/// never change.
pub const VARY_PREFLIGHT: HeaderValue = HeaderValue::from_static(
    "Access-Control-Request-Headers, Access-Control-Request-Method, Access-Control-Request-Private-Network, Origin",
);

/// Appends `addition` to `headers`' `Vary` value, preserving whatever was
/// already there.
pub fn extend_vary(headers: &mut HeaderMap, addition: HeaderValue) {
    match headers.get(http::header::VARY) {
        None => {
            headers.append(http::header::VARY, addition);
        }
        Some(existing) => {
            let mut combined = Vec::with_capacity(existing.len() + 2 + addition.len());
            combined.extend_from_slice(existing.as_bytes());
            combined.extend_from_slice(b", ");
            combined.extend_from_slice(addition.as_bytes());
            // A Vary value built by appending two already-valid HeaderValues
            // with a ", " separator is itself always a valid HeaderValue.
            let value = HeaderValue::from_bytes(&combined)
                .expect("concatenation of two valid header values stays valid");
            headers.insert(http::header::VARY, value);
        }
    }
}
