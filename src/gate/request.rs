//! Per-request metadata the gate decides on

use hyper::header::{HeaderValue, COOKIE, ORIGIN};
use hyper::{Method, Request};

/// Everything the gate looks at, lifted out of the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: Method,
    pub path: String,
    /// Raw `Origin` header, kept as-is so it can be echoed back verbatim
    pub origin: Option<HeaderValue>,
    /// Session cookie value, if one was sent
    pub session_token: Option<String>,
}

impl RequestMeta {
    pub fn from_request<B>(req: &Request<B>, cookie_name: &str) -> Self {
        let headers = req.headers();
        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            origin: headers.get(ORIGIN).cloned(),
            session_token: headers
                .get_all(COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find_map(|cookies| extract_cookie(cookies, cookie_name))
                .map(str::to_string),
        }
    }

    /// Origin as text. Non-UTF-8 origins count as absent.
    pub fn origin_str(&self) -> Option<&str> {
        self.origin.as_ref().and_then(|v| v.to_str().ok())
    }

    pub fn is_preflight(&self) -> bool {
        self.method == Method::OPTIONS
    }
}

/// Find `name` in a `Cookie` header value. Empty values count as absent.
pub fn extract_cookie<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        let value = value.trim().trim_matches('"');
        (key.trim() == name && !value.is_empty()).then_some(value)
    })
}
