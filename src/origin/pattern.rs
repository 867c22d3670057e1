//! Strict, serialization-level parsing of configuration-time origin
//! *patterns*, loosely in the shape of an RFC 6454 origin but extended with
//! subdomain and port wildcards.
//!
//! An [`OriginPattern`] denotes a *set* of concrete origins: an exact
//! pattern denotes exactly one, a subdomain-wildcard pattern denotes every
//! origin under some base domain, and a port-wildcard pattern denotes every
//! port of a given scheme+host. Parsing is deliberately pickier than
//! [`super::Origin::parse`]: every non-canonical spelling (trailing dots,
//! userinfo, default-port suffixes, uppercase hosts, misplaced wildcards,
//! non-canonical IPv6) is rejected, so that a pattern's text always equals
//! its own canonical re-serialization.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::Scheme;
use crate::error::BuildErrorKind;

/// How the host portion of a pattern denotes a set of hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// A single, fully-qualified DNS name.
    ExactDns,
    /// `*.base.domain` — every strict subdomain of `base.domain`.
    SubdomainWildcardDns,
    /// `127.0.0.0/8`.
    LoopbackIpv4,
    /// `::1`.
    LoopbackIpv6,
    /// Any other IPv4 literal.
    OtherIpv4,
    /// Any other IPv6 literal.
    OtherIpv6,
    /// The literal host `localhost`.
    Localhost,
}

impl HostKind {
    fn is_dns(self) -> bool {
        matches!(
            self,
            HostKind::ExactDns | HostKind::SubdomainWildcardDns | HostKind::Localhost
        )
    }

    fn is_loopback_or_localhost(self) -> bool {
        matches!(
            self,
            HostKind::Localhost | HostKind::LoopbackIpv4 | HostKind::LoopbackIpv6
        )
    }
}

/// How the port portion of a pattern denotes a set of ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSpec {
    /// No explicit port was written; matches the scheme's default port.
    Default,
    /// One explicit port.
    Explicit(u16),
    /// `:*` — matches every port.
    Wildcard,
}

/// The parsed, validated, canonical form of one origin pattern.
///
/// Host labels are stored right-to-left (most-significant label first, so
/// `foo.example.com` is stored as `["com", "example", "foo"]`) since that is
/// the order the compiled matcher's trie walks in; it also happens to be the
/// order in which two domains first diverge, which is what makes
/// label-boundary-respecting suffix matching correct in the first place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
    scheme: Scheme,
    host_kind: HostKind,
    /// Reversed DNS labels (see struct docs), empty for IP host kinds.
    host_labels_rev: Vec<String>,
    /// Lower-case textual host, as written, for IP host kinds and for
    /// building the exact-origin canonical key; empty for DNS host kinds
    /// (reconstructed on demand from `host_labels_rev` instead).
    host_text: String,
    port: PortSpec,
    insecure: bool,
    encompasses_subdomains_of_public_suffix: bool,
}

impl OriginPattern {
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host_kind(&self) -> HostKind {
        self.host_kind
    }

    pub fn port(&self) -> PortSpec {
        self.port
    }

    /// `true` if this pattern denotes at least one `http://` origin that is
    /// neither loopback nor `localhost`.
    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn encompasses_subdomains_of_public_suffix(&self) -> bool {
        self.encompasses_subdomains_of_public_suffix
    }

    /// Reversed DNS labels of the pattern's base domain (for DNS host
    /// kinds only — the `*.` prefix, if any, is not included).
    pub fn host_labels_rev(&self) -> &[String] {
        &self.host_labels_rev
    }

    /// Lower-case textual host for IP host kinds (`ExactDns`/
    /// `SubdomainWildcardDns`/`Localhost` return an empty string; use
    /// [`Self::host_labels_rev`] instead).
    pub fn host_text(&self) -> &str {
        &self.host_text
    }

    /// Whether this pattern has a `*.` subdomain-wildcard prefix.
    pub fn is_subdomain_wildcard(&self) -> bool {
        self.host_kind == HostKind::SubdomainWildcardDns
    }

    /// The explicit port number this pattern would bind to for
    /// exact-origin matching, resolving `PortSpec::Default` to the
    /// scheme's default port. Panics if called on a port-wildcard
    /// pattern — callers must check [`Self::port`] first.
    pub fn resolved_port(&self) -> u16 {
        match self.port {
            PortSpec::Default => self.scheme.default_port(),
            PortSpec::Explicit(p) => p,
            PortSpec::Wildcard => {
                unreachable!("resolved_port called on a port-wildcard pattern")
            }
        }
    }

    /// Re-serializes the pattern to its canonical textual form. Used both
    /// to build exact-match keys and to verify the round-trip invariant
    /// during parsing.
    pub fn canonical_text(&self) -> String {
        let mut s = String::with_capacity(32);
        s.push_str(self.scheme.as_str());
        s.push_str("://");
        if self.host_kind == HostKind::SubdomainWildcardDns {
            s.push_str("*.");
        }
        match self.host_kind {
            HostKind::ExactDns | HostKind::SubdomainWildcardDns | HostKind::Localhost => {
                let mut first = true;
                for label in self.host_labels_rev.iter().rev() {
                    if !first {
                        s.push('.');
                    }
                    first = false;
                    s.push_str(label);
                }
            }
            HostKind::OtherIpv6 | HostKind::LoopbackIpv6 => {
                s.push('[');
                s.push_str(&self.host_text);
                s.push(']');
            }
            HostKind::OtherIpv4 | HostKind::LoopbackIpv4 => {
                s.push_str(&self.host_text);
            }
        }
        match self.port {
            PortSpec::Default => {}
            PortSpec::Explicit(p) => {
                s.push(':');
                s.push_str(&p.to_string());
            }
            PortSpec::Wildcard => s.push_str(":*"),
        }
        s
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_text())
    }
}

/// Parses and strictly validates `text` as an origin pattern.
///
/// Does **not** special-case the literal strings `"null"` or `"*"` — the
/// policy builder rejects those before ever calling this function, since
/// whether they're errors (and which error) depends on which option they
/// were supplied to.
pub fn parse_pattern(text: &str) -> Result<OriginPattern, BuildErrorKind> {
    let invalid = || BuildErrorKind::InvalidOriginPattern(text.to_owned());

    if text.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(invalid());
    }
    let (scheme_str, rest) = text.split_once("://").ok_or_else(invalid)?;
    let scheme = match scheme_str {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        _ => return Err(BuildErrorKind::InvalidOriginPattern(text.to_owned())),
    };
    if rest.is_empty() || rest.bytes().any(|b| matches!(b, b'@' | b'/' | b'?' | b'#')) {
        return Err(invalid());
    }

    let (host_part, port_part) = split_host_port_strict(rest).ok_or_else(invalid)?;
    if host_part.is_empty() {
        return Err(invalid());
    }
    if scheme == Scheme::Https
        && (host_part.contains(':') || is_all_numeric_with_dots(host_part))
    {
        return Err(BuildErrorKind::SchemeIncompatibleWithIpHost(text.to_owned()));
    }

    let (host_kind, host_labels_rev, host_text) =
        parse_host(host_part).map_err(|_| invalid())?;

    // Wildcard DNS hosts and port wildcards are mutually exclusive.
    let port = parse_port(scheme, port_part).ok_or_else(invalid)?;
    if port == PortSpec::Wildcard && host_kind == HostKind::SubdomainWildcardDns {
        return Err(invalid());
    }

    let insecure = scheme == Scheme::Http && !host_kind.is_loopback_or_localhost();
    let encompasses_subdomains_of_public_suffix = host_kind == HostKind::SubdomainWildcardDns
        && crate::public_suffix::is_public_suffix(&host_labels_rev);

    let pattern = OriginPattern {
        scheme,
        host_kind,
        host_labels_rev,
        host_text,
        port,
        insecure,
        encompasses_subdomains_of_public_suffix,
    };

    // The pattern text must equal its own canonical re-serialization. This
    // is the final, catch-all check.
    if pattern.canonical_text() != text {
        return Err(invalid());
    }

    Ok(pattern)
}

fn split_host_port_strict(rest: &str) -> Option<(&str, Option<&str>)> {
    if let Some(bracket_rest) = rest.strip_prefix('[') {
        let close = bracket_rest.find(']')?;
        let host = &bracket_rest[..close];
        let after = &bracket_rest[close + 1..];
        if after.is_empty() {
            return Some((host, None));
        }
        let port = after.strip_prefix(':')?;
        return Some((host, Some(port)));
    }
    // Hosts never legally contain ':' outside of bracketed IPv6, so the
    // rightmost ':' (if any) is always the port separator.
    match rest.rfind(':') {
        Some(idx) => Some((&rest[..idx], Some(&rest[idx + 1..]))),
        None => Some((rest, None)),
    }
}

fn parse_port(scheme: Scheme, port_part: Option<&str>) -> Option<PortSpec> {
    let digits = match port_part {
        None => return Some(PortSpec::Default),
        Some(d) => d,
    };
    if digits.is_empty() {
        return None;
    }
    if digits == "*" {
        return Some(PortSpec::Wildcard);
    }
    if digits.len() > 5
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    if value == 0 || value > 65535 {
        return None;
    }
    let port = value as u16;
    // Default-port elision: writing out the scheme's own default port
    // explicitly is rejected, to keep exactly one canonical spelling.
    if port == scheme.default_port() {
        return None;
    }
    Some(PortSpec::Explicit(port))
}

/// Returns `(host_kind, reversed DNS labels (empty for IP kinds), lower-case
/// host text (empty for DNS kinds))`.
fn parse_host(host_part: &str) -> Result<(HostKind, Vec<String>, String), ()> {
    // `split_host_port_strict` already stripped the brackets off a `[...]`
    // IPv6 literal; a DNS label or IPv4 octet group never legally contains
    // ':', so any remaining colon means this was (and must still look like)
    // a bracketed IPv6 host.
    if host_part.contains(':') {
        return parse_ipv6(host_part);
    }
    if is_all_numeric_with_dots(host_part) {
        return parse_ipv4(host_part);
    }
    parse_dns(host_part)
}

fn is_all_numeric_with_dots(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

fn parse_ipv4(host_part: &str) -> Result<(HostKind, Vec<String>, String), ()> {
    let addr: Ipv4Addr = host_part.parse().map_err(|_| ())?;
    // Reject non-canonical spellings (leading zeros etc.) by round-trip.
    if addr.to_string() != host_part {
        return Err(());
    }
    let kind = if addr.octets()[0] == 127 {
        HostKind::LoopbackIpv4
    } else {
        HostKind::OtherIpv4
    };
    Ok((kind, Vec::new(), host_part.to_owned()))
}

fn parse_ipv6(v6_text: &str) -> Result<(HostKind, Vec<String>, String), ()> {
    if v6_text.is_empty() || !v6_text.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b':') {
        return Err(());
    }
    let addr: Ipv6Addr = v6_text.parse().map_err(|_| ())?;
    // Reject non-canonical forms (e.g. "0:0:0:0:0:0:0:1" instead of "::1")
    // by requiring the RFC 5952 canonical Display round-trips exactly.
    if addr.to_string() != v6_text {
        return Err(());
    }
    let kind = if addr == Ipv6Addr::LOCALHOST {
        HostKind::LoopbackIpv6
    } else {
        HostKind::OtherIpv6
    };
    Ok((kind, Vec::new(), v6_text.to_owned()))
}

fn parse_dns(host_part: &str) -> Result<(HostKind, Vec<String>, String), ()> {
    let star_count = host_part.bytes().filter(|&b| b == b'*').count();
    let (is_wildcard, base) = match star_count {
        0 => (false, host_part),
        1 => {
            let base = host_part.strip_prefix("*.").ok_or(())?;
            if base.is_empty() || base.starts_with('*') {
                return Err(());
            }
            (true, base)
        }
        _ => return Err(()),
    };

    if base.ends_with('.') || base.is_empty() {
        return Err(());
    }

    let labels: Vec<&str> = base.split('.').collect();
    for label in &labels {
        if label.is_empty() {
            return Err(());
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(());
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(());
        }
    }

    let host_kind = if !is_wildcard && labels.len() == 1 && labels[0] == "localhost" {
        HostKind::Localhost
    } else if is_wildcard {
        HostKind::SubdomainWildcardDns
    } else {
        HostKind::ExactDns
    };

    let labels_rev: Vec<String> = labels.iter().rev().map(|s| s.to_string()).collect();
    Ok((host_kind, labels_rev, String::new()))
}
