//! The public-suffix oracle behind `*.<public-suffix>` rejection.
//!
//! A wildcard pattern such as `https://*.com` or `https://*.co.uk` would grant
//! every registrable domain under that suffix — almost certainly not what the
//! caller meant, and dangerous enough that the builder refuses it unless
//! `DangerouslyTolerateSubdomainsOfPublicSuffixes` is set.
//!
//! This module is not a mirror of the Mozilla Public Suffix List: it is a
//! small, frozen, ICANN-section-only snapshot, bundled at compile time and
//! never fetched over the network (see `DESIGN.md`). It is enough to catch
//! the common, obviously-dangerous cases; it is not a substitute for a full
//! PSL client and makes no attempt to track PSL updates.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Suffixes are stored as reversed label sequences (`"co.uk"` ->
/// `["uk", "co"]`) so they line up with [`crate::origin::pattern`]'s
/// `host_labels_rev` representation and can be compared without
/// re-splitting or re-joining anything.
static PUBLIC_SUFFIXES: Lazy<HashSet<Vec<&'static str>>> = Lazy::new(|| {
    const SUFFIXES: &[&str] = &[
        // generic TLDs
        "com", "net", "org", "info", "biz", "dev", "app", "io", "me", "co",
        "xyz", "site", "online", "tech", "cloud", "shop",
        // a sample of country-code TLDs
        "us", "uk", "de", "fr", "jp", "cn", "au", "ca", "nl", "se", "no",
        "fi", "dk", "ru", "br", "in", "eu",
        // widely-used multi-label public suffixes
        "co.uk", "org.uk", "ac.uk", "gov.uk",
        "co.jp", "ne.jp",
        "com.au", "net.au", "org.au",
        "com.br",
        "com.cn",
        // well-known "private" dynamic-DNS / PaaS suffixes treated as public
        "github.io", "gitlab.io", "herokuapp.com", "vercel.app",
        "netlify.app", "pages.dev", "workers.dev", "amazonaws.com",
        "cloudfront.net", "azurewebsites.net", "ngrok.io", "ngrok-free.app",
    ];
    SUFFIXES
        .iter()
        .map(|s| s.split('.').rev().collect::<Vec<_>>())
        .collect()
});

/// Returns `true` if the reversed labels of a wildcard pattern's base host
/// (everything after the stripped `*.`) are themselves exactly a known
/// public suffix.
///
/// `host_labels_rev` is the *base* host only — the wildcard's own `*.` label
/// has already been removed by the caller, so for `*.example.co.uk` this is
/// asked about `["uk", "co", "example"]`, which is not a public suffix (only
/// `["uk", "co"]` is); for `*.co.uk` it is asked about `["uk", "co"]`, which
/// is.
pub fn is_public_suffix(host_labels_rev: &[String]) -> bool {
    let borrowed: Vec<&str> = host_labels_rev.iter().map(String::as_str).collect();
    PUBLIC_SUFFIXES.contains(&borrowed)
}

#[cfg(test)]
mod tests {
    use super::is_public_suffix;

    fn labels(rev: &[&str]) -> Vec<String> {
        rev.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_gtld_is_public_suffix() {
        assert!(is_public_suffix(&labels(&["com"])));
        assert!(is_public_suffix(&labels(&["io"])));
    }

    #[test]
    fn two_label_suffix_is_public_suffix() {
        assert!(is_public_suffix(&labels(&["uk", "co"])));
        assert!(is_public_suffix(&labels(&["com", "herokuapp"])));
    }

    #[test]
    fn registrable_domain_is_not_a_public_suffix() {
        assert!(!is_public_suffix(&labels(&["com", "example"])));
        assert!(!is_public_suffix(&labels(&["uk", "co", "example"])));
    }
}
