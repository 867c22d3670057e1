//! A framework-agnostic CORS middleware, built strictly to the Fetch and
//! Private-Network-Access specifications rather than to any one web
//! framework's conventions.
//!
//! ```no_run
//! use corsware::{build_anonymous, CorsOption};
//!
//! let policy = build_anonymous(vec![
//!     CorsOption::FromOrigins(vec!["https://example.com".into()]),
//!     CorsOption::MaxAgeInSeconds(600),
//! ])
//! .expect("valid policy");
//!
//! // `handler` is anything implementing `Handler<Req, Resp>` for your
//! // framework's request/response types.
//! // let decorated = policy.decorate(handler);
//! ```
//!
//! The crate is organized around the seven components a CORS middleware
//! needs: a strict origin/pattern parser, a public-suffix oracle, a
//! compiled origin matcher, a validating policy builder, a request
//! classifier, a preflight state machine, and a `Vary` manager. See
//! `DESIGN.md` in the repository for how each maps to a module.

mod error;
mod headers;
mod matcher;
mod middleware;
mod origin;
mod policy;
mod preflight;
mod public_suffix;
mod vary;

pub use error::{BuildError, BuildErrorKind};
pub use matcher::{MatchResult, OriginMatcher};
pub use middleware::{CorsMiddleware, CorsRequestParts, CorsResponseParts, Handler};
pub use origin::{Origin, Scheme, MAX_ORIGIN_LEN};
pub use origin::pattern::{HostKind, OriginPattern, PortSpec};
pub use policy::{
    build_anonymous, build_credentialed, CorsOption, ExposeHeadersPolicy, MethodsPolicy, PnaMode,
    Policy, RequestHeadersPolicy,
};
