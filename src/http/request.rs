//! Transport-independent request.
//!
//! # Responsibilities
//! - Carry method, URI, headers and the buffered body into dispatch
//! - Answer query and form lookups
//!
//! # Design Decisions
//! - Body is fully buffered by the transport binding before dispatch,
//!   so handlers run synchronously with no I/O on the request side
//! - Form values: urlencoded body first, then query string

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};

pub const X_REQUEST_ID: &str = "x-request-id";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// An already-parsed inbound request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Build from the parts produced by the HTTP stack.
    pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Add a header, ignoring names or values that are not valid HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Ignoring invalid request header"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// First value of header `name` if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Correlation id assigned by the transport layer.
    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// First value of query parameter `name`.
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.uri.query().and_then(|q| first_value(q.as_bytes(), name))
    }

    /// First value of form field `name`.
    ///
    /// Reads the urlencoded body when the content type says so, then falls
    /// back to the query string.
    pub fn form_value(&self, name: &str) -> Option<String> {
        if self.is_form() {
            if let Some(value) = first_value(&self.body, name) {
                return Some(value);
            }
        }
        self.query_value(name)
    }

    fn is_form(&self) -> bool {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                ct.split(';')
                    .next()
                    .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
            })
            .unwrap_or(false)
    }
}

fn first_value(encoded: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
