//! Policy configuration and the validating builder.
//!
//! Configuration is expressed as a list of [`CorsOption`] values folded into
//! a [`PolicyDraft`], then validated into an immutable [`Policy`]. The
//! builder never fails fast: every error encountered — duplicate options,
//! invalid patterns, forbidden names, out-of-range values, incompatible
//! option pairs — is collected into a single [`BuildError`], in the order
//! the options were supplied, with cross-option checks appended last.

use http::HeaderValue;

use crate::error::{BuildError, BuildErrorKind};
use crate::headers;
use crate::matcher::OriginMatcher;
use crate::origin::pattern::{parse_pattern, OriginPattern, PortSpec};

/// One configuration option passed to [`build_anonymous`] or
/// [`build_credentialed`].
///
/// A handful of variants only make sense for one of the two builders
/// (`FromAnyOrigin` and `ExposeAllResponseHeaders` are anonymous-only); the
/// incompatibility surfaces as a validation error rather than as a type-level
/// split, per the "two-kind builder" design (one shared option type, a
/// `credentialed: bool` flag on the builder).
#[derive(Debug, Clone)]
pub enum CorsOption {
    /// Supply explicit origin patterns. Required unless
    /// [`CorsOption::FromAnyOrigin`] is used.
    FromOrigins(Vec<String>),
    /// Allow every origin. Rejected by `build_credentialed`.
    FromAnyOrigin,
    /// Allow the listed methods beyond the safelist.
    WithMethods(Vec<String>),
    /// Allow any method.
    WithAnyMethod,
    /// Allow the listed request headers in preflights.
    WithRequestHeaders(Vec<String>),
    /// Allow any request headers.
    WithAnyRequestHeaders,
    /// Cache duration for preflight responses, in `0..=86400` seconds.
    MaxAgeInSeconds(u32),
    /// Headers the client may read on actual responses.
    ExposeResponseHeaders(Vec<String>),
    /// Wildcard exposure. Rejected by `build_credentialed`.
    ExposeAllResponseHeaders,
    /// The 2xx status used for successful preflights (default 204).
    PreflightSuccessStatus(u16),
    /// Enable Private-Network-Access opt-in for all requests.
    PrivateNetworkAccess,
    /// Enable Private-Network-Access opt-in only for no-cors-mode requests.
    PrivateNetworkAccessInNoCorsModeOnly,
    /// Escape hatch: tolerate `http://` non-loopback origin patterns.
    DangerouslyTolerateInsecureOrigins,
    /// Escape hatch: tolerate `*.<public-suffix>` origin patterns.
    DangerouslyTolerateSubdomainsOfPublicSuffixes,
}

/// How a policy treats the `Access-Control-Request-Method`/allowed-methods
/// axis.
#[derive(Debug)]
pub enum MethodsPolicy {
    /// Only `GET`, `HEAD`, `POST` are allowed (the default).
    SafelistedOnly,
    /// The listed methods are allowed, in addition to the safelist.
    Explicit(Vec<String>),
    /// Any method is allowed.
    Any,
}

/// How a policy treats the allowed-request-headers axis.
#[derive(Debug)]
pub enum RequestHeadersPolicy {
    /// No extra request headers are allowed beyond the safelisted ones.
    NoneExtra,
    /// The listed (lowercase) request headers are allowed.
    Explicit(Vec<String>),
    /// Any request header is allowed.
    Any,
}

/// How a policy treats the exposed-response-headers axis.
#[derive(Debug)]
pub enum ExposeHeadersPolicy {
    /// No response headers beyond the safelisted ones are exposed.
    None,
    /// The listed (lowercase) response headers are exposed, in this order.
    Explicit(Vec<String>),
    /// Every response header is exposed.
    All,
}

/// Private-Network-Access opt-in mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnaMode {
    /// PNA is not acknowledged; preflights never set ACAPN.
    Off,
    /// PNA is acknowledged unconditionally.
    On,
    /// PNA is acknowledged only for preflights that look like no-cors-mode
    /// requests (a documented heuristic; see `DESIGN.md`).
    NoCorsOnly,
}

#[derive(Default)]
struct PolicyDraft {
    from_origins: Option<Vec<OriginPattern>>,
    from_any_origin: Option<()>,
    methods: Option<Vec<String>>,
    any_method: Option<()>,
    request_headers: Option<Vec<String>>,
    any_request_headers: Option<()>,
    max_age: Option<u32>,
    expose_headers: Option<Vec<String>>,
    expose_all_response_headers: Option<()>,
    preflight_status: Option<u16>,
    private_network_access: Option<()>,
    private_network_access_no_cors_only: Option<()>,
    tolerate_insecure: Option<()>,
    tolerate_public_suffix_subdomains: Option<()>,
}

fn check_dup<T>(slot: &Option<T>, name: &'static str, errors: &mut Vec<BuildErrorKind>) -> bool {
    if slot.is_some() {
        errors.push(BuildErrorKind::OptionUsedMultipleTimes(name));
        true
    } else {
        false
    }
}

/// Validates and dedups a list of header names through `validate`,
/// collecting errors rather than bailing on the first one. Duplicate names
/// within the same option call are silently folded together; there is no
/// dedicated error kind for that case.
fn validate_header_list(
    names: Vec<String>,
    validate: fn(&str) -> Result<String, BuildErrorKind>,
    errors: &mut Vec<BuildErrorKind>,
) -> Vec<String> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        match validate(&name) {
            Ok(canonical) => {
                if !out.contains(&canonical) {
                    out.push(canonical);
                }
            }
            Err(e) => errors.push(e),
        }
    }
    out
}

fn fold_options(options: Vec<CorsOption>, errors: &mut Vec<BuildErrorKind>) -> PolicyDraft {
    let mut draft = PolicyDraft::default();

    for option in options {
        match option {
            CorsOption::FromOrigins(patterns) => {
                if check_dup(&draft.from_origins, "FromOrigins", errors) {
                    continue;
                }
                let mut parsed = Vec::with_capacity(patterns.len());
                for text in &patterns {
                    if text == "null" {
                        errors.push(BuildErrorKind::NullOriginProhibited);
                    } else if text == "*" {
                        errors.push(BuildErrorKind::WildcardOriginProhibited);
                    } else {
                        match parse_pattern(text) {
                            Ok(p) => parsed.push(p),
                            Err(e) => errors.push(e),
                        }
                    }
                }
                draft.from_origins = Some(parsed);
            }
            CorsOption::FromAnyOrigin => {
                if check_dup(&draft.from_any_origin, "FromAnyOrigin", errors) {
                    continue;
                }
                draft.from_any_origin = Some(());
            }
            CorsOption::WithMethods(methods) => {
                if check_dup(&draft.methods, "WithMethods", errors) {
                    continue;
                }
                let mut validated = Vec::with_capacity(methods.len());
                for method in &methods {
                    match headers::validate_method_name(method) {
                        Ok(()) => {
                            if !validated.contains(method) {
                                validated.push(method.clone());
                            }
                        }
                        Err(e) => errors.push(e),
                    }
                }
                draft.methods = Some(validated);
            }
            CorsOption::WithAnyMethod => {
                if check_dup(&draft.any_method, "WithAnyMethod", errors) {
                    continue;
                }
                draft.any_method = Some(());
            }
            CorsOption::WithRequestHeaders(headers_) => {
                if check_dup(&draft.request_headers, "WithRequestHeaders", errors) {
                    continue;
                }
                let validated =
                    validate_header_list(headers_, headers::validate_request_header_name, errors);
                draft.request_headers = Some(validated);
            }
            CorsOption::WithAnyRequestHeaders => {
                if check_dup(&draft.any_request_headers, "WithAnyRequestHeaders", errors) {
                    continue;
                }
                draft.any_request_headers = Some(());
            }
            CorsOption::MaxAgeInSeconds(seconds) => {
                if check_dup(&draft.max_age, "MaxAgeInSeconds", errors) {
                    continue;
                }
                if seconds > 86400 {
                    errors.push(BuildErrorKind::MaxAgeExceedsUpperBound(seconds, 86400));
                } else {
                    draft.max_age = Some(seconds);
                }
            }
            CorsOption::ExposeResponseHeaders(headers_) => {
                if check_dup(&draft.expose_headers, "ExposeResponseHeaders", errors) {
                    continue;
                }
                let validated = validate_header_list(
                    headers_,
                    headers::validate_exposed_response_header_name,
                    errors,
                );
                draft.expose_headers = Some(validated);
            }
            CorsOption::ExposeAllResponseHeaders => {
                if check_dup(
                    &draft.expose_all_response_headers,
                    "ExposeAllResponseHeaders",
                    errors,
                ) {
                    continue;
                }
                draft.expose_all_response_headers = Some(());
            }
            CorsOption::PreflightSuccessStatus(status) => {
                if check_dup(&draft.preflight_status, "PreflightSuccessStatus", errors) {
                    continue;
                }
                if !(200..=299).contains(&status) {
                    errors.push(BuildErrorKind::PreflightStatusOutsideTwoXx(status));
                } else {
                    draft.preflight_status = Some(status);
                }
            }
            CorsOption::PrivateNetworkAccess => {
                if check_dup(&draft.private_network_access, "PrivateNetworkAccess", errors) {
                    continue;
                }
                draft.private_network_access = Some(());
            }
            CorsOption::PrivateNetworkAccessInNoCorsModeOnly => {
                if check_dup(
                    &draft.private_network_access_no_cors_only,
                    "PrivateNetworkAccessInNoCORSModeOnly",
                    errors,
                ) {
                    continue;
                }
                draft.private_network_access_no_cors_only = Some(());
            }
            CorsOption::DangerouslyTolerateInsecureOrigins => {
                if check_dup(
                    &draft.tolerate_insecure,
                    "DangerouslyTolerateInsecureOrigins",
                    errors,
                ) {
                    continue;
                }
                draft.tolerate_insecure = Some(());
            }
            CorsOption::DangerouslyTolerateSubdomainsOfPublicSuffixes => {
                if check_dup(
                    &draft.tolerate_public_suffix_subdomains,
                    "DangerouslyTolerateSubdomainsOfPublicSuffixes",
                    errors,
                ) {
                    continue;
                }
                draft.tolerate_public_suffix_subdomains = Some(());
            }
        }
    }

    draft
}

/// An immutable, fully validated CORS policy produced by [`build_anonymous`]
/// or [`build_credentialed`].
///
/// Built once, never mutated, and safe to share across arbitrarily many
/// concurrent request handlings without locking. Does not implement
/// `Clone`: a compiled policy owns a trie and is meant to be built once and
/// shared by reference (or inside an `Arc`) by the host, not copied.
#[derive(Debug)]
pub struct Policy {
    credentialed: bool,
    matcher: OriginMatcher,
    methods: MethodsPolicy,
    request_headers: RequestHeadersPolicy,
    expose_headers: ExposeHeadersPolicy,
    max_age_seconds: Option<u32>,
    preflight_success_status: u16,
    pna_mode: PnaMode,
    tolerate_insecure: bool,
    tolerate_public_suffix_subdomains: bool,
    vary_on_origin_for_actual: bool,
    /// Precomputed `Access-Control-Allow-Origin` value for the
    /// single-exact-origin fast path: when `Some`, actual-request handling
    /// writes this value unconditionally instead of parsing and matching the
    /// request's `Origin` header at all. Safe because a browser only honors
    /// an ACAO that equals its own origin, so stamping the one allowed
    /// origin regardless of what was requested can never grant access to a
    /// different origin; it merely skips work that would always resolve to
    /// the same output either way.
    single_exact_origin_header: Option<HeaderValue>,
}

impl Policy {
    pub fn credentialed(&self) -> bool {
        self.credentialed
    }

    pub fn matcher(&self) -> &OriginMatcher {
        &self.matcher
    }

    pub fn methods(&self) -> &MethodsPolicy {
        &self.methods
    }

    pub fn request_headers(&self) -> &RequestHeadersPolicy {
        &self.request_headers
    }

    pub fn expose_headers(&self) -> &ExposeHeadersPolicy {
        &self.expose_headers
    }

    pub fn max_age_seconds(&self) -> Option<u32> {
        self.max_age_seconds
    }

    pub fn preflight_success_status(&self) -> u16 {
        self.preflight_success_status
    }

    pub fn pna_mode(&self) -> PnaMode {
        self.pna_mode
    }

    pub fn tolerate_insecure(&self) -> bool {
        self.tolerate_insecure
    }

    pub fn tolerate_public_suffix_subdomains(&self) -> bool {
        self.tolerate_public_suffix_subdomains
    }

    /// Whether actual (non-preflight) responses must add `Origin` to
    /// `Vary`. `false` only for the single-exact-origin case, where the
    /// response is invariant in `Origin`.
    pub fn vary_on_origin_for_actual(&self) -> bool {
        self.vary_on_origin_for_actual
    }

    /// The fixed `Access-Control-Allow-Origin` value for the
    /// single-exact-origin fast path, if this policy qualifies.
    pub fn single_exact_origin_header(&self) -> Option<&HeaderValue> {
        self.single_exact_origin_header.as_ref()
    }
}

fn cross_option_checks(draft: &PolicyDraft, credentialed: bool, builder_name: &'static str, errors: &mut Vec<BuildErrorKind>) {
    if draft.from_origins.is_some() && draft.from_any_origin.is_some() {
        errors.push(BuildErrorKind::IncompatibleOptions("FromOrigins", "FromAnyOrigin"));
    }
    if draft.methods.is_some() && draft.any_method.is_some() {
        errors.push(BuildErrorKind::IncompatibleOptions("WithMethods", "WithAnyMethod"));
    }
    if draft.request_headers.is_some() && draft.any_request_headers.is_some() {
        errors.push(BuildErrorKind::IncompatibleOptions(
            "WithRequestHeaders",
            "WithAnyRequestHeaders",
        ));
    }
    if draft.expose_headers.is_some() && draft.expose_all_response_headers.is_some() {
        errors.push(BuildErrorKind::IncompatibleOptions(
            "ExposeResponseHeaders",
            "ExposeAllResponseHeaders",
        ));
    }
    if draft.private_network_access.is_some() && draft.private_network_access_no_cors_only.is_some() {
        errors.push(BuildErrorKind::IncompatibleOptions(
            "PrivateNetworkAccess",
            "PrivateNetworkAccessInNoCORSModeOnly",
        ));
    }
    let any_pna = draft.private_network_access.is_some() || draft.private_network_access_no_cors_only.is_some();
    if draft.from_any_origin.is_some() && any_pna {
        errors.push(BuildErrorKind::IncompatibleOptions("FromAnyOrigin", "PrivateNetworkAccess"));
    }
    if credentialed && draft.from_any_origin.is_some() {
        errors.push(BuildErrorKind::IncompatibleOptions(builder_name, "FromAnyOrigin"));
    }
    if credentialed && draft.expose_all_response_headers.is_some() {
        errors.push(BuildErrorKind::IncompatibleOptions(
            builder_name,
            "ExposeAllResponseHeaders",
        ));
    }

    if draft.from_origins.is_none() && draft.from_any_origin.is_none() {
        errors.push(BuildErrorKind::MissingOriginSource(builder_name));
    }

    if let Some(patterns) = &draft.from_origins {
        let must_be_secure = credentialed || any_pna;
        if must_be_secure && draft.tolerate_insecure.is_none() {
            let insecure: Vec<String> = patterns
                .iter()
                .filter(|p| p.insecure())
                .map(|p| p.canonical_text())
                .collect();
            if !insecure.is_empty() {
                errors.push(BuildErrorKind::InsecureOriginProhibited(insecure));
            }
        }
        if draft.tolerate_public_suffix_subdomains.is_none() {
            for pattern in patterns {
                if pattern.encompasses_subdomains_of_public_suffix() {
                    errors.push(BuildErrorKind::PublicSuffixSubdomainProhibited(
                        pattern.canonical_text(),
                    ));
                }
            }
        }
    }
}

fn build(options: Vec<CorsOption>, credentialed: bool, builder_name: &'static str) -> Result<Policy, BuildError> {
    let mut errors = Vec::new();
    let draft = fold_options(options, &mut errors);
    cross_option_checks(&draft, credentialed, builder_name, &mut errors);

    if let Some(err) = BuildError::from_many(errors) {
        #[cfg(feature = "tracing")]
        tracing::warn!(errors = err.kinds().len(), "cors policy build failed");
        return Err(err);
    }

    #[cfg(feature = "tracing")]
    {
        if draft.tolerate_insecure.is_some() {
            tracing::warn!("DangerouslyTolerateInsecureOrigins escape hatch in use");
        }
        if draft.tolerate_public_suffix_subdomains.is_some() {
            tracing::warn!("DangerouslyTolerateSubdomainsOfPublicSuffixes escape hatch in use");
        }
    }

    let single_exact_origin = match (&draft.from_any_origin, &draft.from_origins) {
        (None, Some(patterns)) if patterns.len() == 1 => {
            !patterns[0].is_subdomain_wildcard() && patterns[0].port() != PortSpec::Wildcard
        }
        _ => false,
    };
    let single_exact_origin_header = if single_exact_origin {
        draft
            .from_origins
            .as_ref()
            .and_then(|patterns| HeaderValue::from_str(&patterns[0].canonical_text()).ok())
    } else {
        None
    };

    let matcher = match &draft.from_any_origin {
        Some(()) => OriginMatcher::Any,
        None => {
            let patterns = draft.from_origins.unwrap_or_default();
            OriginMatcher::Compiled(OriginMatcher::compile(&patterns))
        }
    };

    let methods = if draft.any_method.is_some() {
        MethodsPolicy::Any
    } else {
        match draft.methods {
            Some(m) if !m.is_empty() => MethodsPolicy::Explicit(m),
            _ => MethodsPolicy::SafelistedOnly,
        }
    };

    let request_headers = if draft.any_request_headers.is_some() {
        RequestHeadersPolicy::Any
    } else {
        match draft.request_headers {
            Some(h) if !h.is_empty() => RequestHeadersPolicy::Explicit(h),
            _ => RequestHeadersPolicy::NoneExtra,
        }
    };

    let expose_headers = if draft.expose_all_response_headers.is_some() {
        ExposeHeadersPolicy::All
    } else {
        match draft.expose_headers {
            Some(h) if !h.is_empty() => ExposeHeadersPolicy::Explicit(h),
            _ => ExposeHeadersPolicy::None,
        }
    };

    let pna_mode = if draft.private_network_access.is_some() {
        PnaMode::On
    } else if draft.private_network_access_no_cors_only.is_some() {
        PnaMode::NoCorsOnly
    } else {
        PnaMode::Off
    };

    Ok(Policy {
        credentialed,
        matcher,
        methods,
        request_headers,
        expose_headers,
        max_age_seconds: draft.max_age,
        preflight_success_status: draft.preflight_status.unwrap_or(204),
        pna_mode,
        tolerate_insecure: draft.tolerate_insecure.is_some(),
        tolerate_public_suffix_subdomains: draft.tolerate_public_suffix_subdomains.is_some(),
        vary_on_origin_for_actual: !single_exact_origin,
        single_exact_origin_header,
    })
}

/// Builds an anonymous (non-credentialed) policy from `options`.
///
/// #Errors
/// Returns every problem found with the configuration — duplicate options,
/// invalid or prohibited origin patterns, forbidden method/header names,
/// incompatible option pairs — collected into a single [`BuildError`] rather
/// than failing on the first one found.
///
/// #Examples
/// ```
/// use corsware::{build_anonymous, CorsOption};
///
/// let policy = build_anonymous(vec![
///     CorsOption::FromOrigins(vec!["https://example.com".into()]),
///     CorsOption::MaxAgeInSeconds(600),
/// ])
/// .unwrap();
/// assert!(!policy.credentialed());
/// ```
pub fn build_anonymous(options: Vec<CorsOption>) -> Result<Policy, BuildError> {
    build(options, false, "build_anonymous")
}

/// Builds a credentialed policy from `options`. Rejects `FromAnyOrigin` and
/// `ExposeAllResponseHeaders`, since a wildcard origin or wildcard header
/// exposure is never a safe combination with credentialed access.
pub fn build_credentialed(options: Vec<CorsOption>) -> Result<Policy, BuildError> {
    build(options, true, "build_credentialed")
}
