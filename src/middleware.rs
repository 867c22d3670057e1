//! The host contract and request classifier.
//!
//! The core never depends on any particular web framework. A host
//! implements [`CorsRequestParts`] and [`CorsResponseParts`] over whatever
//! request/response types its framework uses, and wraps its innermost
//! handler — any `H: Handler<Req, Resp>` — with [`Policy::decorate`] to get
//! back a handler with the exact same contract, CORS-aware.

use http::{HeaderName, HeaderValue};

use crate::origin::Origin;
use crate::policy::{ExposeHeadersPolicy, Policy};
use crate::preflight;
use crate::vary::{self, VARY_ORIGIN};

/// The parts of an incoming request the core needs to read.
///
/// Implemented by the host over its own request type. Only read access is
/// required — the core never needs to consume or rebuild the request body.
pub trait CorsRequestParts {
    /// The request method (`GET`, `OPTIONS`, ...).
    fn method(&self) -> &http::Method;

    /// Looks up a single request header by name, case-insensitively (as
    /// `http::HeaderMap` already does).
    fn header(&self, name: &HeaderName) -> Option<&HeaderValue>;
}

/// The parts of an outgoing response the core needs to write.
///
/// Implemented by the host over its own response type.
pub trait CorsResponseParts {
    /// Mutable access to the response status.
    fn status_mut(&mut self) -> &mut http::StatusCode;

    /// Mutable access to the response headers.
    fn headers_mut(&mut self) -> &mut http::HeaderMap;
}

/// A request handler: given a request, produces a response.
///
/// Any `Fn(Req) -> Resp` implements this automatically, so a plain closure
/// can be wrapped directly; frameworks with their own handler trait can add
/// a thin impl bridging to theirs.
pub trait Handler<Req, Resp> {
    fn handle(&self, request: Req) -> Resp;
}

impl<Req, Resp, F> Handler<Req, Resp> for F
where
    F: Fn(Req) -> Resp,
{
    fn handle(&self, request: Req) -> Resp {
        self(request)
    }
}

impl Policy {
    /// Wraps `handler` with this policy's CORS enforcement, producing a
    /// handler with the same `Handler<Req, Resp>` contract.
    ///
    /// #Examples
    /// ```
    /// use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
    /// use corsware::{build_anonymous, CorsOption, CorsRequestParts, CorsResponseParts, Handler};
    ///
    /// struct Req { method: Method, headers: HeaderMap }
    /// impl CorsRequestParts for Req {
    ///     fn method(&self) -> &Method { &self.method }
    ///     fn header(&self, name: &HeaderName) -> Option<&HeaderValue> { self.headers.get(name) }
    /// }
    ///
    /// struct Resp { status: StatusCode, headers: HeaderMap }
    /// impl Default for Resp {
    ///     fn default() -> Self { Resp { status: StatusCode::OK, headers: HeaderMap::new() } }
    /// }
    /// impl CorsResponseParts for Resp {
    ///     fn status_mut(&mut self) -> &mut StatusCode { &mut self.status }
    ///     fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    /// }
    ///
    /// let policy = build_anonymous(vec![
    ///     CorsOption::FromOrigins(vec!["https://example.com".into()]),
    /// ])
    /// .unwrap();
    ///
    /// let app = policy.decorate(|_req: Req| Resp { status: StatusCode::OK, headers: HeaderMap::new() });
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert(http::header::ORIGIN, HeaderValue::from_static("https://example.com"));
    /// let response = app.handle(Req { method: Method::GET, headers });
    ///
    /// assert_eq!(
    ///     response.headers.get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
    ///     "https://example.com"
    /// );
    /// ```
    pub fn decorate<H>(&self, handler: H) -> CorsMiddleware<'_, H> {
        CorsMiddleware {
            policy: self,
            handler,
        }
    }
}

/// A request handler decorated with CORS enforcement. Returned by
/// [`Policy::decorate`]; borrows the policy it was built from, so it cannot
/// outlive it.
pub struct CorsMiddleware<'p, H> {
    policy: &'p Policy,
    handler: H,
}

impl<'p, H, Req, Resp> Handler<Req, Resp> for CorsMiddleware<'p, H>
where
    H: Handler<Req, Resp>,
    Req: CorsRequestParts,
    Resp: CorsResponseParts + Default,
{
    fn handle(&self, request: Req) -> Resp {
        if is_preflight(&request) {
            let mut response = Resp::default();
            preflight::handle(self.policy, &request, &mut response);
            return response;
        }

        // The wrapped handler consumes `request`; anything the CORS
        // header pass still needs must be captured before that happens.
        let origin_header = request.header(&http::header::ORIGIN).cloned();
        let mut response = self.handler.handle(request);
        apply_actual_request_headers(self.policy, origin_header.as_ref(), &mut response);
        response
    }
}

fn is_preflight<Req: CorsRequestParts>(request: &Req) -> bool {
    request.method() == http::Method::OPTIONS
        && request
            .header(&http::header::ACCESS_CONTROL_REQUEST_METHOD)
            .is_some()
}

fn apply_actual_request_headers<Resp>(
    policy: &Policy,
    origin_header: Option<&HeaderValue>,
    response: &mut Resp,
) where
    Resp: CorsResponseParts,
{
    // Single-exact-origin fast path: there is only one origin this policy
    // could ever allow, so ACAO is stamped unconditionally without parsing
    // or matching the request's Origin at all. A browser only honors an
    // ACAO equal to its own origin, so this can never grant access beyond
    // what real matching would have granted.
    if let Some(fixed) = policy.single_exact_origin_header() {
        let headers = response.headers_mut();
        headers.insert(http::header::ACCESS_CONTROL_ALLOW_ORIGIN, fixed.clone());
        if policy.credentialed() {
            headers.insert(
                http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if let Some(value) = expose_headers_value(policy) {
            headers.insert(http::header::ACCESS_CONTROL_EXPOSE_HEADERS, value);
        }
        return;
    }

    if let Some(origin_value) = origin_header {
        if let Ok(origin_str) = origin_value.to_str() {
            if let Some(origin) = Origin::parse(origin_str) {
                if policy.matcher().matches(&origin).matched {
                    let headers = response.headers_mut();
                    headers.insert(
                        http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
                        origin_value.clone(),
                    );
                    if policy.credentialed() {
                        headers.insert(
                            http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                            HeaderValue::from_static("true"),
                        );
                    }
                    if let Some(value) = expose_headers_value(policy) {
                        headers.insert(http::header::ACCESS_CONTROL_EXPOSE_HEADERS, value);
                    }
                } else {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(origin = origin_str, "actual request origin mismatch");
                }
            }
        }
    }

    if policy.vary_on_origin_for_actual() {
        vary::extend_vary(response.headers_mut(), VARY_ORIGIN);
    }
}

fn expose_headers_value(policy: &Policy) -> Option<HeaderValue> {
    match policy.expose_headers() {
        ExposeHeadersPolicy::None => None,
        ExposeHeadersPolicy::All => Some(HeaderValue::from_static("*")),
        ExposeHeadersPolicy::Explicit(names) => {
            if names.is_empty() {
                return None;
            }
            let joined = names.join(", ");
            HeaderValue::from_str(&joined).ok()
        }
    }
}
