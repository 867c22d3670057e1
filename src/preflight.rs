//! The preflight state machine:
//! `Start -> OriginCheck -> MethodCheck -> HeadersCheck -> PNACheck -> Emit`.

use once_cell::sync::Lazy;

use http::{HeaderName, HeaderValue, StatusCode};

use crate::headers::is_safelisted_method;
use crate::middleware::{CorsRequestParts, CorsResponseParts};
use crate::origin::Origin;
use crate::policy::{MethodsPolicy, PnaMode, Policy, RequestHeadersPolicy};
use crate::vary::{self, VARY_PREFLIGHT};

static ACCESS_CONTROL_REQUEST_PRIVATE_NETWORK: Lazy<HeaderName> =
    Lazy::new(|| HeaderName::from_static("access-control-request-private-network"));
static ACCESS_CONTROL_ALLOW_PRIVATE_NETWORK: Lazy<HeaderName> =
    Lazy::new(|| HeaderName::from_static("access-control-allow-private-network"));

const HEADER_TOKEN_MAX_LEN: usize = 512;

/// Evaluates a preflight request against `policy` and writes the result
/// directly into `response`. Never invokes the wrapped handler — every
/// preflight, success or failure, is answered by the middleware itself.
pub fn handle<Req, Resp>(policy: &Policy, request: &Req, response: &mut Resp)
where
    Req: CorsRequestParts,
    Resp: CorsResponseParts,
{
    // OriginCheck
    let Some(origin_value) = request.header(&http::header::ORIGIN) else {
        reject(response);
        return;
    };
    let Ok(origin_str) = origin_value.to_str() else {
        reject(response);
        return;
    };
    let Some(origin) = Origin::parse(origin_str) else {
        reject(response);
        return;
    };
    if !policy.matcher().matches(&origin).matched {
        reject(response);
        return;
    }

    // MethodCheck
    let Some(acrm_value) = request.header(&http::header::ACCESS_CONTROL_REQUEST_METHOD) else {
        reject(response);
        return;
    };
    let Ok(requested_method) = acrm_value.to_str() else {
        reject(response);
        return;
    };
    if requested_method.is_empty() || requested_method.contains(char::is_whitespace) {
        reject(response);
        return;
    }

    let needs_acam = !is_safelisted_method(requested_method);
    let acam: Option<HeaderValue> = if needs_acam {
        match policy.methods() {
            MethodsPolicy::Any => {
                if policy.credentialed() {
                    match HeaderValue::from_str(requested_method) {
                        Ok(v) => Some(v),
                        Err(_) => {
                            reject(response);
                            return;
                        }
                    }
                } else {
                    Some(HeaderValue::from_static("*"))
                }
            }
            MethodsPolicy::SafelistedOnly => {
                reject(response);
                return;
            }
            MethodsPolicy::Explicit(allowed) => {
                if allowed.iter().any(|m| m == requested_method) {
                    match HeaderValue::from_str(requested_method) {
                        Ok(v) => Some(v),
                        Err(_) => {
                            reject(response);
                            return;
                        }
                    }
                } else {
                    reject(response);
                    return;
                }
            }
        }
    } else {
        None
    };

    // HeadersCheck
    let acrh = request
        .header(&http::header::ACCESS_CONTROL_REQUEST_HEADERS)
        .map(|v| v.to_str().unwrap_or(""));
    let acah: Option<HeaderValue> = match policy.request_headers() {
        RequestHeadersPolicy::Any => {
            if policy.credentialed() {
                Some(HeaderValue::from_static("*,authorization"))
            } else {
                Some(HeaderValue::from_static("*"))
            }
        }
        RequestHeadersPolicy::NoneExtra => {
            if let Some(acrh) = acrh {
                if tokens(acrh).next().is_some() {
                    reject(response);
                    return;
                }
            }
            None
        }
        RequestHeadersPolicy::Explicit(allowed) => match acrh {
            None => None,
            Some(acrh) => match echo_allowed_headers(acrh, allowed) {
                Some(echoed) if echoed.is_empty() => None,
                Some(echoed) => match HeaderValue::from_str(&echoed) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        reject(response);
                        return;
                    }
                },
                None => {
                    reject(response);
                    return;
                }
            },
        },
    };

    // PNACheck
    let acapn: Option<HeaderValue> = match request.header(&ACCESS_CONTROL_REQUEST_PRIVATE_NETWORK) {
        Some(v) if v.to_str().map(|s| s.eq_ignore_ascii_case("true")).unwrap_or(false) => {
            match policy.pna_mode() {
                PnaMode::Off => None,
                PnaMode::On => Some(HeaderValue::from_static("true")),
                PnaMode::NoCorsOnly => {
                    let looks_no_cors = is_safelisted_method(requested_method)
                        && acrh.map(|h| tokens(h).next().is_none()).unwrap_or(true);
                    if looks_no_cors {
                        Some(HeaderValue::from_static("true"))
                    } else {
                        None
                    }
                }
            }
        }
        _ => None,
    };

    // Emit(Success)
    *response.status_mut() = StatusCode::from_u16(policy.preflight_success_status())
        .unwrap_or(StatusCode::NO_CONTENT);
    let headers = response.headers_mut();
    headers.insert(http::header::ACCESS_CONTROL_ALLOW_ORIGIN, origin_value.clone());
    if policy.credentialed() {
        headers.insert(
            http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    if let Some(acam) = acam {
        headers.insert(http::header::ACCESS_CONTROL_ALLOW_METHODS, acam);
    }
    if let Some(acah) = acah {
        headers.insert(http::header::ACCESS_CONTROL_ALLOW_HEADERS, acah);
    }
    if let Some(acapn) = acapn {
        headers.insert(ACCESS_CONTROL_ALLOW_PRIVATE_NETWORK.clone(), acapn);
    }
    if let Some(max_age) = policy.max_age_seconds() {
        if let Ok(value) = HeaderValue::from_str(&max_age.to_string()) {
            headers.insert(http::header::ACCESS_CONTROL_MAX_AGE, value);
        }
    }
    vary::extend_vary(headers, VARY_PREFLIGHT);
    #[cfg(feature = "tracing")]
    tracing::debug!(origin = origin_str, "preflight admitted");
}

fn reject<Resp: CorsResponseParts>(response: &mut Resp) {
    #[cfg(feature = "tracing")]
    tracing::debug!("rejecting preflight request");
    *response.status_mut() = StatusCode::FORBIDDEN;
    vary::extend_vary(response.headers_mut(), VARY_PREFLIGHT);
}

/// A lazy, allocation-free tokenizer over a comma-separated header value,
/// trimming whitespace and skipping empty tokens. Used so an adversarial
/// `Access-Control-Request-Headers` value (thousands of tokens) is walked
/// once without ever being collected into an intermediate `Vec`.
fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Validates every token of `acrh` against `allowed` (already lowercase),
/// returning the lowercased, comma-joined echo on success. Bails out at the
/// first disallowed token without finishing the scan.
fn echo_allowed_headers(acrh: &str, allowed: &[String]) -> Option<String> {
    let mut echo = String::with_capacity(acrh.len());
    let mut first = true;
    for token in tokens(acrh) {
        if token.len() > HEADER_TOKEN_MAX_LEN {
            return None;
        }
        let mut buf = [0u8; HEADER_TOKEN_MAX_LEN];
        for (dst, src) in buf.iter_mut().zip(token.bytes()) {
            *dst = src.to_ascii_lowercase();
        }
        let lower = std::str::from_utf8(&buf[..token.len()]).ok()?;
        if !allowed.iter().any(|a| a == lower) {
            return None;
        }
        if !first {
            echo.push_str(", ");
        }
        echo.push_str(lower);
        first = false;
    }
    Some(echo)
}
