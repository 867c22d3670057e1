//! Error kinds produced while building a [`Policy`](crate::policy::Policy).
//!
//! Builder errors are never returned as a single opaque string: each failure
//! is a distinct [`BuildErrorKind`] carrying the offending input, and a
//! single build invocation accumulates every error it finds into a
//! [`BuildError`] rather than bailing out on the first one.

use thiserror::Error;

/// One reason a policy failed to build.
///
/// The offending pattern/value is always carried along so callers (and
/// tests) can report precisely what was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildErrorKind {
    /// An origin pattern failed to parse: bad scheme, whitespace, userinfo,
    /// path/query/fragment, malformed host, bad port, trailing dot,
    /// non-ASCII, or a misplaced wildcard.
    #[error("invalid origin pattern '{0}'")]
    InvalidOriginPattern(String),

    /// `https://` was paired with a literal IP host (IPv4 or IPv6).
    #[error("scheme 'https' is incompatible with IP host in '{0}'")]
    SchemeIncompatibleWithIpHost(String),

    /// The literal pattern `"null"` was supplied to `FromOrigins`.
    #[error("the literal origin 'null' is never a valid pattern")]
    NullOriginProhibited,

    /// The literal pattern `"*"` was supplied to `FromOrigins`.
    #[error("the literal origin '*' is never a valid pattern; use FromAnyOrigin instead")]
    WildcardOriginProhibited,

    /// One or more insecure (`http://`, non-loopback) origin patterns were
    /// supplied while credentials or PNA were enabled, without the escape
    /// hatch.
    #[error("insecure origin pattern(s) prohibited without DangerouslyTolerateInsecureOrigins: {}", .0.join(", "))]
    InsecureOriginProhibited(Vec<String>),

    /// A `*.<public-suffix>` pattern was supplied without the escape hatch.
    #[error("'{0}' grants every subdomain of a public suffix; prohibited without DangerouslyTolerateSubdomainsOfPublicSuffixes")]
    PublicSuffixSubdomainProhibited(String),

    /// A method name failed basic HTTP-token validation.
    #[error("invalid method name '{0}'")]
    InvalidMethodName(String),

    /// A method name is on the forbidden list (`CONNECT`, `TRACE`, `TRACK`).
    #[error("method name '{0}' is forbidden")]
    ForbiddenMethodName(String),

    /// The literal method name `"*"` was supplied to `WithMethods`.
    #[error("the literal method name '*' is prohibited; use WithAnyMethod instead")]
    ProhibitedMethodName,

    /// A header name failed basic HTTP-token validation.
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    /// A header name is on the forbidden request-header list
    /// (`Connection`, `Host`, every `Sec-*`/`Proxy-*`, ...).
    #[error("header name '{0}' is forbidden")]
    ForbiddenHeaderName(String),

    /// A header name has no place in the position it was supplied in (e.g.
    /// `Set-Cookie` as an exposed response header, or an
    /// `Access-Control-*` header supplied as an allowed request header).
    #[error("header name '{0}' is prohibited in this position")]
    ProhibitedHeaderName(String),

    /// A safelisted response header (`Cache-Control`, `Content-Language`,
    /// `Content-Length`, `Content-Type`, `Expires`, `Last-Modified`,
    /// `Pragma`) was supplied to `ExposeResponseHeaders`: it needs not be
    /// explicitly exposed.
    #[error("'{0}' is a safelisted response header and needs not be explicitly exposed")]
    SafelistedResponseHeaderNotExposable(String),

    /// `MaxAgeInSeconds` exceeded the 86400-second upper bound.
    #[error("max-age {0} exceeds the upper bound of {1} seconds")]
    MaxAgeExceedsUpperBound(u32, u32),

    /// `PreflightSuccessStatus` was outside `200..=299`.
    #[error("preflight success status {0} is outside 200..=299")]
    PreflightStatusOutsideTwoXx(u16),

    /// The same option kind was supplied more than once to a single build
    /// invocation.
    #[error("option '{0}' was used more than once")]
    OptionUsedMultipleTimes(&'static str),

    /// Two mutually-exclusive options were both supplied.
    #[error("options '{0}' and '{1}' are mutually exclusive")]
    IncompatibleOptions(&'static str, &'static str),

    /// Neither `FromOrigins` nor `FromAnyOrigin` was supplied.
    #[error("{0} requires FromOrigins(..) or FromAnyOrigin")]
    MissingOriginSource(&'static str),
}

/// The result of a failed policy build: either a single error, or every
/// error encountered, in the order the options were supplied (cross-option
/// checks appended at the end). Never flattened into a single string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Exactly one error was found.
    #[error("{0}")]
    One(BuildErrorKind),
    /// More than one error was found.
    #[error("{} errors building CORS policy: {}", .0.len(), format_many(.0))]
    Many(Vec<BuildErrorKind>),
}

fn format_many(errors: &[BuildErrorKind]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BuildError {
    /// Builds a `BuildError` from an accumulated, possibly-empty error list.
    /// Returns `None` if `errors` is empty (i.e. the build actually
    /// succeeded).
    pub(crate) fn from_many(mut errors: Vec<BuildErrorKind>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => Some(BuildError::One(errors.pop().expect("len == 1"))),
            _ => Some(BuildError::Many(errors)),
        }
    }

    /// All the individual error kinds, flattened, in order.
    pub fn kinds(&self) -> &[BuildErrorKind] {
        match self {
            BuildError::One(kind) => std::slice::from_ref(kind),
            BuildError::Many(kinds) => kinds,
        }
    }
}
