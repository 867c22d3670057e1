//! Compiles validated [`OriginPattern`]s into a structure a hot-path
//! `match()` call can query without allocating.
//!
//! Subdomain-wildcard patterns are compiled into a trie keyed by DNS label,
//! walked right-to-left (most significant label first) against the
//! incoming `Origin` header's own `str::rsplit('.')` iterator. This is what
//! keeps `barfoo.com` from matching `*.foo.com`: the trie only ever compares
//! whole labels, never byte suffixes, so a false partial match at a label
//! boundary is structurally impossible rather than merely tested against.

use std::collections::{HashMap, HashSet};

use crate::origin::pattern::{HostKind, OriginPattern, PortSpec};
use crate::origin::{Origin, Scheme, MAX_ORIGIN_LEN};

/// The outcome of matching a request's `Origin` against a compiled policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether the origin is allowed.
    pub matched: bool,
    /// When `matched` is `true`: whether it matched an exact-origin entry
    /// (a literal pattern or an IP literal) as opposed to a subdomain
    /// wildcard. Meaningless when `matched` is `false`.
    pub is_exact: bool,
}

impl MatchResult {
    fn no_match() -> Self {
        MatchResult {
            matched: false,
            is_exact: false,
        }
    }
}

/// The set of every port an allowed origin may use under some scheme.
#[derive(Debug, Clone, Default)]
struct PortSet {
    default: bool,
    wildcard: bool,
    explicit: HashSet<u16>,
}

impl PortSet {
    fn insert(&mut self, port: PortSpec) {
        match port {
            PortSpec::Default => self.default = true,
            PortSpec::Wildcard => self.wildcard = true,
            PortSpec::Explicit(p) => {
                self.explicit.insert(p);
            }
        }
    }

    fn matches(&self, scheme_default_port: u16, port: u16) -> bool {
        self.wildcard || (self.default && port == scheme_default_port) || self.explicit.contains(&port)
    }
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<String, TrieNode>,
    exact: HashMap<Scheme, PortSet>,
    wildcard: HashMap<Scheme, PortSet>,
}

/// A compiled, queryable origin allowlist.
#[derive(Debug, Default)]
pub struct CompiledOrigins {
    dns: TrieNode,
    ip: HashMap<Scheme, HashMap<String, PortSet>>,
}

/// The overall shape of a policy's allowed origins: either every origin
/// (`FromAnyOrigin`), or a compiled set of patterns (`FromOrigins`).
#[derive(Debug)]
pub enum OriginMatcher {
    /// `FromAnyOrigin` — every origin matches.
    Any,
    /// `FromOrigins(..)` — only origins matching one of the compiled
    /// patterns match.
    Compiled(CompiledOrigins),
}

impl OriginMatcher {
    /// Compiles a validated pattern list into a queryable matcher.
    pub fn compile(patterns: &[OriginPattern]) -> CompiledOrigins {
        let mut dns = TrieNode::default();
        let mut ip: HashMap<Scheme, HashMap<String, PortSet>> = HashMap::new();

        for pattern in patterns {
            match pattern.host_kind() {
                HostKind::ExactDns | HostKind::Localhost => {
                    let node = descend(&mut dns, pattern.host_labels_rev());
                    node.exact
                        .entry(pattern.scheme())
                        .or_default()
                        .insert(pattern.port());
                }
                HostKind::SubdomainWildcardDns => {
                    let node = descend(&mut dns, pattern.host_labels_rev());
                    node.wildcard
                        .entry(pattern.scheme())
                        .or_default()
                        .insert(pattern.port());
                }
                HostKind::LoopbackIpv4
                | HostKind::OtherIpv4
                | HostKind::LoopbackIpv6
                | HostKind::OtherIpv6 => {
                    ip.entry(pattern.scheme())
                        .or_default()
                        .entry(pattern.host_text().to_owned())
                        .or_default()
                        .insert(pattern.port());
                }
            }
        }

        CompiledOrigins { dns, ip }
    }

    /// Matches a request-time origin against this matcher.
    pub fn matches(&self, origin: &Origin<'_>) -> MatchResult {
        match self {
            OriginMatcher::Any => MatchResult {
                matched: true,
                is_exact: false,
            },
            OriginMatcher::Compiled(compiled) => compiled.matches(origin),
        }
    }
}

fn descend<'n>(root: &'n mut TrieNode, labels_rev: &[String]) -> &'n mut TrieNode {
    let mut node = root;
    for label in labels_rev {
        node = node.children.entry(label.clone()).or_default();
    }
    node
}

impl CompiledOrigins {
    fn matches(&self, origin: &Origin<'_>) -> MatchResult {
        let scheme = origin.scheme();
        let port = origin.port();
        let mut buf = [0u8; MAX_ORIGIN_LEN];
        let host = lowercase_if_needed(origin.host(), &mut buf);

        if is_ip_literal(host) {
            let Some(set) = self.ip.get(&scheme).and_then(|m| m.get(host)) else {
                return MatchResult::no_match();
            };
            return if set.matches(scheme.default_port(), port) {
                MatchResult {
                    matched: true,
                    is_exact: true,
                }
            } else {
                MatchResult::no_match()
            };
        }

        let mut node = &self.dns;
        let mut labels = host.rsplit('.').peekable();
        while let Some(label) = labels.next() {
            let Some(next) = node.children.get(label) else {
                return MatchResult::no_match();
            };
            node = next;
            if labels.peek().is_some() {
                if let Some(set) = node.wildcard.get(&scheme) {
                    if set.matches(scheme.default_port(), port) {
                        return MatchResult {
                            matched: true,
                            is_exact: false,
                        };
                    }
                }
            } else if let Some(set) = node.exact.get(&scheme) {
                if set.matches(scheme.default_port(), port) {
                    return MatchResult {
                        matched: true,
                        is_exact: true,
                    };
                }
            }
        }
        MatchResult::no_match()
    }
}

fn is_ip_literal(host: &str) -> bool {
    host.contains(':') || (!host.is_empty() && host.bytes().all(|b| b.is_ascii_digit() || b == b'.'))
}

fn lowercase_into<'b>(host: &str, buf: &'b mut [u8]) -> &'b str {
    let bytes = host.as_bytes();
    for (dst, src) in buf.iter_mut().zip(bytes.iter()) {
        *dst = src.to_ascii_lowercase();
    }
    std::str::from_utf8(&buf[..bytes.len()]).expect("ascii input stays valid utf-8 when lower-cased")
}

fn lowercase_if_needed<'a>(host: &'a str, buf: &'a mut [u8; MAX_ORIGIN_LEN]) -> &'a str {
    if host.bytes().any(|b| b.is_ascii_uppercase()) {
        lowercase_into(host, buf)
    } else {
        host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::pattern::parse_pattern;

    fn compile(patterns: &[&str]) -> CompiledOrigins {
        let parsed: Vec<OriginPattern> = patterns.iter().map(|p| parse_pattern(p).unwrap()).collect();
        OriginMatcher::compile(&parsed)
    }

    #[test]
    fn exact_pattern_matches_only_itself() {
        let compiled = compile(&["https://example.com"]);
        let allowed = Origin::parse("https://example.com").unwrap();
        let denied = Origin::parse("https://other.com").unwrap();
        assert!(compiled.matches(&allowed).matched);
        assert!(compiled.matches(&allowed).is_exact);
        assert!(!compiled.matches(&denied).matched);
    }

    #[test]
    fn wildcard_matches_strict_subdomains_only() {
        let compiled = compile(&["https://*.example.com"]);
        let sub = Origin::parse("https://sub.example.com").unwrap();
        let deep = Origin::parse("https://a.b.example.com").unwrap();
        let base = Origin::parse("https://example.com").unwrap();
        assert!(compiled.matches(&sub).matched);
        assert!(!compiled.matches(&sub).is_exact);
        assert!(compiled.matches(&deep).matched);
        assert!(!compiled.matches(&base).matched);
    }

    #[test]
    fn wildcard_does_not_leak_across_label_boundary() {
        let compiled = compile(&["https://*.foo.com"]);
        let lookalike = Origin::parse("https://barfoo.com").unwrap();
        assert!(!compiled.matches(&lookalike).matched);
    }

    #[test]
    fn port_wildcard_matches_every_port() {
        let compiled = compile(&["http://localhost:*"]);
        let p1 = Origin::parse("http://localhost:3000").unwrap();
        let p2 = Origin::parse("http://localhost:9999").unwrap();
        assert!(compiled.matches(&p1).matched);
        assert!(compiled.matches(&p2).matched);
    }

    #[test]
    fn ip_literal_patterns_match_exactly() {
        let compiled = compile(&["http://127.0.0.1:8080"]);
        let allowed = Origin::parse("http://127.0.0.1:8080").unwrap();
        let wrong_port = Origin::parse("http://127.0.0.1:8081").unwrap();
        assert!(compiled.matches(&allowed).matched);
        assert!(!compiled.matches(&wrong_port).matched);
    }

    #[test]
    fn host_comparison_is_case_insensitive() {
        let compiled = compile(&["https://example.com"]);
        let mixed_case = Origin::parse("https://EXAMPLE.com").unwrap();
        assert!(compiled.matches(&mixed_case).matched);
    }

    #[test]
    fn any_matcher_matches_everything() {
        let matcher = OriginMatcher::Any;
        let origin = Origin::parse("https://anything.example").unwrap();
        let result = matcher.matches(&origin);
        assert!(result.matched);
        assert!(!result.is_exact);
    }
}
