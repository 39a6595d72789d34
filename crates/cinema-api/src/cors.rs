//! Origin policy for cross-origin requests.
//!
//! Every handler asks the policy which headers to attach instead of checking
//! the `Origin` header itself. Two rules exist because the routes disagree on
//! what a request without an `Origin` deserves: listing only answers origins
//! on the allow-list, while single-movie reads, deletes and preflights also
//! answer requests that declare no origin at all.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue};
use tracing::debug;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:1234",
    "http://localhost:3001",
    "http://localhost:3002",
    "http://127.0.0.1:5500",
];

/// Methods advertised by `OPTIONS /movies/{id}`.
pub const PREFLIGHT_METHODS: &str = "GET, DELETE, PATCH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginRule {
    /// Only origins on the allow-list are granted.
    AllowListed,
    /// Allow-listed origins are granted, and so are requests with no origin.
    AllowListedOrAbsent,
}

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: Vec<HeaderValue>,
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
        }
    }
}

impl OriginPolicy {
    pub fn new(allowed_origins: Vec<HeaderValue>) -> Self {
        Self { allowed_origins }
    }

    pub fn allowed_origins(&self) -> &[HeaderValue] {
        &self.allowed_origins
    }

    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }

    /// The `Access-Control-Allow-Origin` value to send, if any.
    pub fn grant(&self, origin: Option<&HeaderValue>, rule: OriginRule) -> Option<HeaderValue> {
        match (origin, rule) {
            (Some(origin), _) if self.is_allowed(origin) => Some(origin.clone()),
            (None, OriginRule::AllowListedOrAbsent) => Some(HeaderValue::from_static("*")),
            _ => None,
        }
    }

    pub fn headers(&self, origin: Option<&HeaderValue>, rule: OriginRule) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self.grant(origin, rule) {
            Some(value) => {
                debug!(origin = ?origin, ?rule, "granting cross-origin access");
                if value != "*" {
                    headers.insert(VARY, HeaderValue::from_static("Origin"));
                }
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
            }
            None => {
                debug!(origin = ?origin, ?rule, "origin not granted");
            }
        }
        headers
    }

    /// Headers for `OPTIONS /movies/{id}`: the lenient rule plus the allowed
    /// methods, both only when the origin is granted.
    pub fn preflight_headers(&self, origin: Option<&HeaderValue>) -> HeaderMap {
        let mut headers = self.headers(origin, OriginRule::AllowListedOrAbsent);
        if headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(PREFLIGHT_METHODS),
            );
        }
        headers
    }
}

/// The declared `Origin` of a request. An empty header counts as absent.
pub fn request_origin(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers.get(ORIGIN).filter(|v| !v.is_empty())
}
