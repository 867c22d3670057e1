//! Integration-level boundary checks for the validating policy builders:
//! the edges of numeric ranges, host-literal canonicalization, and the
//! escape hatches that accept otherwise-prohibited patterns.

use corsware::{build_anonymous, build_credentialed, BuildErrorKind, CorsOption};

fn kinds_of(err: corsware::BuildError) -> Vec<BuildErrorKind> {
    err.kinds().to_vec()
}

#[test]
fn max_age_upper_bound() {
    assert!(build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::MaxAgeInSeconds(86400),
    ])
    .is_ok());

    let err = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::MaxAgeInSeconds(86401),
    ])
    .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::MaxAgeExceedsUpperBound(86401, 86400))));
}

#[test]
fn preflight_status_must_be_2xx() {
    for ok in [200u16, 204, 279, 299] {
        assert!(
            build_anonymous(vec![
                CorsOption::FromOrigins(vec!["https://example.com".into()]),
                CorsOption::PreflightSuccessStatus(ok),
            ])
            .is_ok(),
            "expected {ok} to be accepted"
        );
    }
    for bad in [0u16, 100, 199, 300, 404] {
        let err = build_anonymous(vec![
            CorsOption::FromOrigins(vec!["https://example.com".into()]),
            CorsOption::PreflightSuccessStatus(bad),
        ])
        .unwrap_err();
        assert!(
            kinds_of(err)
                .iter()
                .any(|k| matches!(k, BuildErrorKind::PreflightStatusOutsideTwoXx(s) if *s == bad)),
            "expected {bad} to be rejected"
        );
    }
}

#[test]
fn port_boundaries_in_origin_patterns() {
    assert!(build_anonymous(vec![CorsOption::FromOrigins(vec![
        "http://example.com:1".into()
    ])])
    .is_ok());
    assert!(build_anonymous(vec![CorsOption::FromOrigins(vec![
        "http://example.com:65535".into()
    ])])
    .is_ok());

    for bad in ["http://example.com:0", "http://example.com:66536", "http://example.com:06060"] {
        let err =
            build_anonymous(vec![CorsOption::FromOrigins(vec![bad.into()])]).unwrap_err();
        assert!(kinds_of(err)
            .iter()
            .any(|k| matches!(k, BuildErrorKind::InvalidOriginPattern(_))));
    }
}

#[test]
fn ipv6_loopback_must_be_canonical() {
    assert!(build_anonymous(vec![CorsOption::FromOrigins(vec![
        "http://[::1]:9090".into()
    ])])
    .is_ok());

    let err = build_anonymous(vec![CorsOption::FromOrigins(vec![
        "http://[0:0:0:0:0:0:0:0001]:9090".into(),
    ])])
    .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::InvalidOriginPattern(_))));
}

#[test]
fn https_with_ip_host_is_rejected() {
    let err = build_anonymous(vec![CorsOption::FromOrigins(vec!["https://127.0.0.1".into()])])
        .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::SchemeIncompatibleWithIpHost(_))));
}

#[test]
fn credentialed_requires_secure_origins_unless_tolerated() {
    let err = build_credentialed(vec![CorsOption::FromOrigins(vec!["http://example.com".into()])])
        .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::InsecureOriginProhibited(_))));

    assert!(build_credentialed(vec![
        CorsOption::FromOrigins(vec!["http://example.com".into()]),
        CorsOption::DangerouslyTolerateInsecureOrigins,
    ])
    .is_ok());

    // loopback/localhost are never considered insecure, even credentialed.
    assert!(build_credentialed(vec![CorsOption::FromOrigins(vec![
        "http://localhost:3000".into()
    ])])
    .is_ok());
    assert!(build_credentialed(vec![CorsOption::FromOrigins(vec![
        "http://127.0.0.1:3000".into()
    ])])
    .is_ok());
}

#[test]
fn public_suffix_subdomain_wildcards_are_rejected_unless_tolerated() {
    let err = build_anonymous(vec![CorsOption::FromOrigins(vec!["https://*.co.uk".into()])])
        .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::PublicSuffixSubdomainProhibited(_))));

    assert!(build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://*.co.uk".into()]),
        CorsOption::DangerouslyTolerateSubdomainsOfPublicSuffixes,
    ])
    .is_ok());

    // A non-public-suffix base domain is always fine.
    assert!(build_anonymous(vec![CorsOption::FromOrigins(vec![
        "https://*.example.com".into()
    ])])
    .is_ok());
}

#[test]
fn forbidden_method_and_header_names_are_rejected() {
    let err = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::WithMethods(vec!["TRACE".into()]),
    ])
    .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::ForbiddenMethodName(_))));

    let err = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::WithRequestHeaders(vec!["Host".into()]),
    ])
    .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::ForbiddenHeaderName(_))));

    let err = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::ExposeResponseHeaders(vec!["Set-Cookie".into()]),
    ])
    .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::ForbiddenHeaderName(_) | BuildErrorKind::ProhibitedHeaderName(_))));
}

#[test]
fn safelisted_response_header_need_not_be_exposed() {
    let err = build_anonymous(vec![
        CorsOption::FromOrigins(vec!["https://example.com".into()]),
        CorsOption::ExposeResponseHeaders(vec!["Content-Type".into()]),
    ])
    .unwrap_err();
    assert!(kinds_of(err)
        .iter()
        .any(|k| matches!(k, BuildErrorKind::SafelistedResponseHeaderNotExposable(_))));
}
