//! Static tables and token validation for method and header names.
//!
//! The forbidden-header and safelisted-header lists mirror a snapshot of the
//! Fetch Living Standard; as that standard evolves these tables may need to
//! change, but that is a deliberate policy decision, not a bug.

use unicase::UniCase;

use crate::error::BuildErrorKind;

/// `GET`, `HEAD`, `POST` — methods every policy allows without needing to be
/// named explicitly.
pub const SAFELISTED_METHODS: &[&str] = &["GET", "HEAD", "POST"];

const FORBIDDEN_METHODS: &[&str] = &["CONNECT", "TRACE", "TRACK"];

/// Response headers a client may always read without `Access-Control-Expose-Headers`.
pub const SAFELISTED_RESPONSE_HEADERS: &[&str] = &[
    "cache-control",
    "content-language",
    "content-length",
    "content-type",
    "expires",
    "last-modified",
    "pragma",
];

const FORBIDDEN_REQUEST_HEADER_PREFIXES: &[&str] = &["sec-", "proxy-"];

const FORBIDDEN_REQUEST_HEADERS: &[&str] = &[
    "accept-charset",
    "accept-encoding",
    "access-control-request-headers",
    "access-control-request-method",
    "access-control-request-private-network",
    "connection",
    "content-length",
    "cookie",
    "cookie2",
    "date",
    "dnt",
    "expect",
    "host",
    "keep-alive",
    "origin",
    "referer",
    "set-cookie",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "via",
];

const FORBIDDEN_RESPONSE_HEADERS: &[&str] = &["set-cookie", "set-cookie2"];

const ACCESS_CONTROL_HEADERS: &[&str] = &[
    "access-control-allow-origin",
    "access-control-allow-credentials",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "access-control-allow-private-network",
    "access-control-max-age",
    "access-control-expose-headers",
    "access-control-request-method",
    "access-control-request-headers",
    "access-control-request-private-network",
];

fn header_eq(a: &str, b: &str) -> bool {
    UniCase::ascii(a) == UniCase::ascii(b)
}

fn is_in_table(name: &str, table: &[&str]) -> bool {
    table.iter().any(|entry| header_eq(name, entry))
}

fn has_forbidden_prefix(name: &str) -> bool {
    FORBIDDEN_REQUEST_HEADER_PREFIXES
        .iter()
        .any(|prefix| name.len() >= prefix.len() && header_eq(&name[..prefix.len()], prefix))
}

/// Whether `c` is a legal HTTP token character (RFC 7230 §3.2.6).
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Validates a method name supplied to `WithMethods`.
///
/// Case-sensitive: `get` and `GET` are different tokens as far as this check
/// is concerned (though `GET` is already safelisted regardless of case the
/// caller used elsewhere).
pub fn validate_method_name(name: &str) -> Result<(), BuildErrorKind> {
    if name == "*" {
        return Err(BuildErrorKind::ProhibitedMethodName);
    }
    if !is_token(name) {
        return Err(BuildErrorKind::InvalidMethodName(name.to_owned()));
    }
    if FORBIDDEN_METHODS.contains(&name) {
        return Err(BuildErrorKind::ForbiddenMethodName(name.to_owned()));
    }
    Ok(())
}

/// Validates a header name supplied to `WithRequestHeaders`, returning its
/// lowercase canonical form on success.
pub fn validate_request_header_name(name: &str) -> Result<String, BuildErrorKind> {
    if name == "*" || !is_token(name) {
        return Err(BuildErrorKind::InvalidHeaderName(name.to_owned()));
    }
    if has_forbidden_prefix(name) || is_in_table(name, FORBIDDEN_REQUEST_HEADERS) {
        return Err(BuildErrorKind::ForbiddenHeaderName(name.to_owned()));
    }
    if is_in_table(name, ACCESS_CONTROL_HEADERS) {
        return Err(BuildErrorKind::ProhibitedHeaderName(name.to_owned()));
    }
    Ok(name.to_ascii_lowercase())
}

/// Validates a header name supplied to `ExposeResponseHeaders`, returning
/// its lowercase canonical form on success.
pub fn validate_exposed_response_header_name(name: &str) -> Result<String, BuildErrorKind> {
    if name == "*" || !is_token(name) {
        return Err(BuildErrorKind::InvalidHeaderName(name.to_owned()));
    }
    if is_in_table(name, FORBIDDEN_RESPONSE_HEADERS) {
        return Err(BuildErrorKind::ProhibitedHeaderName(name.to_owned()));
    }
    if is_in_table(name, ACCESS_CONTROL_HEADERS) {
        return Err(BuildErrorKind::ProhibitedHeaderName(name.to_owned()));
    }
    if is_in_table(name, SAFELISTED_RESPONSE_HEADERS) {
        return Err(BuildErrorKind::SafelistedResponseHeaderNotExposable(
            name.to_owned(),
        ));
    }
    Ok(name.to_ascii_lowercase())
}

/// Whether `method` is one of the three safelisted methods, compared
/// case-sensitively (as the Fetch spec requires: a lowercase `get` is not
/// the safelisted method `GET`).
pub fn is_safelisted_method(method: &str) -> bool {
    SAFELISTED_METHODS.contains(&method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_forbidden_methods() {
        assert!(matches!(
            validate_method_name("TRACE"),
            Err(BuildErrorKind::ForbiddenMethodName(_))
        ));
    }

    #[test]
    fn rejects_wildcard_method() {
        assert!(matches!(
            validate_method_name("*"),
            Err(BuildErrorKind::ProhibitedMethodName)
        ));
    }

    #[test]
    fn accepts_ordinary_method() {
        assert!(validate_method_name("PUT").is_ok());
    }

    #[test]
    fn rejects_forbidden_request_header_by_prefix() {
        assert!(matches!(
            validate_request_header_name("Sec-Fetch-Mode"),
            Err(BuildErrorKind::ForbiddenHeaderName(_))
        ));
    }

    #[test]
    fn rejects_access_control_header_as_request_header() {
        assert!(matches!(
            validate_request_header_name("Access-Control-Allow-Origin"),
            Err(BuildErrorKind::ProhibitedHeaderName(_))
        ));
    }

    #[test]
    fn lowercases_valid_request_header() {
        assert_eq!(
            validate_request_header_name("X-Custom-Header").unwrap(),
            "x-custom-header"
        );
    }

    #[test]
    fn rejects_safelisted_response_header_as_exposed() {
        assert!(matches!(
            validate_exposed_response_header_name("Content-Type"),
            Err(BuildErrorKind::SafelistedResponseHeaderNotExposable(_))
        ));
    }

    #[test]
    fn rejects_set_cookie_as_exposed() {
        assert!(matches!(
            validate_exposed_response_header_name("Set-Cookie"),
            Err(BuildErrorKind::ProhibitedHeaderName(_))
        ));
    }
}
