use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use corsware::{CorsRequestParts, CorsResponseParts};

pub struct FakeRequest {
    pub method: Method,
    pub headers: HeaderMap,
}

impl FakeRequest {
    pub fn get(origin: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(origin) = origin {
            headers.insert(http::header::ORIGIN, HeaderValue::from_str(origin).unwrap());
        }
        FakeRequest {
            method: Method::GET,
            headers,
        }
    }

    pub fn preflight(origin: &str, acrm: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::ORIGIN, HeaderValue::from_str(origin).unwrap());
        headers.insert(
            http::header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_str(acrm).unwrap(),
        );
        FakeRequest {
            method: Method::OPTIONS,
            headers,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        self.headers.insert(name, HeaderValue::from_str(value).unwrap());
        self
    }
}

impl CorsRequestParts for FakeRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }
}

pub struct FakeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl FakeResponse {
    pub fn with_status(status: u16) -> Self {
        FakeResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
        }
    }
}

impl Default for FakeResponse {
    fn default() -> Self {
        FakeResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

impl CorsResponseParts for FakeResponse {
    fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.status
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}
