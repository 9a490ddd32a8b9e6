//! Per-request context and chain execution.
//!
//! # Responsibilities
//! - Carry the request, extracted params and the response being written
//! - Drive the middleware + handler chain via `next()`
//! - Provide the response helpers, all funnelled through one status commit
//!
//! # Chain Protocol
//! ```text
//! cursor = -1
//! next():  cursor += 1; while cursor < len { chain[cursor](ctx); cursor += 1 }
//! abort(): cursor = len   (frames already on the stack still finish)
//!
//! [recovery pre] → [logger pre] → handler → [logger post] → [recovery post]
//! ```
//!
//! # Design Decisions
//! - A context is owned by exactly one worker; it is never shared
//! - Status is committed once; later commits are no-ops with a warning
//! - Headers set after the commit are ignored with a warning
//! - Body bytes written before a status implicitly commit 200

use std::fmt;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;

use crate::dispatch::engine::Shared;
use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::lifecycle::{InFlightGuard, ShutdownSignal};
use crate::observability::{LogRecord, RequestLogger};
use crate::routing::Params;

/// A route handler or middleware. Both share this signature and differ
/// only in whether they call [`Context::next`].
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";
const TEXT_HTML: &str = "text/html; charset=utf-8";

pub struct Context {
    request: Request,
    path: String,
    params: Params,
    pattern: Option<String>,

    response: Response,
    status_committed: bool,

    handlers: Vec<HandlerFunc>,
    index: isize,
    error: Option<DispatchError>,

    shared: Arc<Shared>,
}

impl Context {
    pub(crate) fn new(
        request: Request,
        params: Params,
        pattern: Option<String>,
        handlers: Vec<HandlerFunc>,
        shared: Arc<Shared>,
    ) -> Self {
        let path = request.path().to_string();
        Self {
            request,
            path,
            params,
            pattern,
            response: Response::default(),
            status_committed: false,
            handlers,
            index: -1,
            error: None,
            shared,
        }
    }

    // ── Request side ──────────────────────────────────────────────────────

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Matched route pattern, `None` for unmatched requests.
    pub fn route_pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Value bound to `:name` or `*name` in the matched pattern.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn form_value(&self, name: &str) -> Option<String> {
        self.request.form_value(name)
    }

    pub fn query_value(&self, name: &str) -> Option<String> {
        self.request.query_value(name)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request.request_id()
    }

    // ── Chain control ─────────────────────────────────────────────────────

    /// Run the remaining chain from the next position.
    ///
    /// Middleware calls this to run everything downstream; code after the
    /// call runs once the downstream frames have returned.
    pub fn next(&mut self) {
        self.index += 1;
        while let Some(handler) = self.current() {
            handler(self);
            self.index += 1;
        }
    }

    fn current(&self) -> Option<HandlerFunc> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.handlers.get(i))
            .cloned()
    }

    /// Stop any further handler from starting.
    ///
    /// Frames already paused inside `next()` still run their post logic.
    pub fn abort(&mut self) {
        self.index = self.handlers.len() as isize;
    }

    pub fn is_aborted(&self) -> bool {
        self.index >= self.handlers.len() as isize
    }

    /// Abort the chain and answer with `{"message": message}`.
    pub fn fail(&mut self, status: StatusCode, message: impl Into<String>) {
        let message = message.into();
        self.fail_with(status, &message, &message);
        self.error = Some(DispatchError::HandlerFailure {
            status: status.as_u16(),
            message,
        });
    }

    /// `fail` with separate public and logged messages.
    ///
    /// Produces exactly one `error` record: on the status commit, or on its
    /// own when a status was already committed.
    pub(crate) fn fail_with(&mut self, status: StatusCode, public: &str, logged: &str) {
        self.abort();
        let body = serde_json::json!({ "message": public }).to_string();
        self.set_header(header::CONTENT_TYPE.as_str(), APPLICATION_JSON);
        if !self.commit(status, Some(logged)) {
            self.shared.logger.error(
                &LogRecord::new(self.request.method().as_str(), &self.path)
                    .status(status.as_u16())
                    .message(logged),
            );
        }
        self.response.body.extend_from_slice(body.as_bytes());
    }

    /// What went wrong with this request, if anything.
    pub fn error(&self) -> Option<&DispatchError> {
        self.error.as_ref()
    }

    pub(crate) fn set_error(&mut self, error: DispatchError) {
        self.error = Some(error);
    }

    // ── Response side ─────────────────────────────────────────────────────

    /// Set a response header. Ignored once the status is committed.
    pub fn set_header(&mut self, key: &str, value: &str) {
        if self.status_committed {
            tracing::warn!(
                header = %key,
                path = %self.path,
                "Header set after status commit, ignored"
            );
            return;
        }
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.response.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %key, "Invalid response header, ignored"),
        }
    }

    /// Commit the response status.
    ///
    /// Only the first call takes effect; later calls are no-ops and log a
    /// warning. Returns whether this call committed the status.
    pub fn set_status(&mut self, status: StatusCode) -> bool {
        self.commit(status, None)
    }

    fn commit(&mut self, status: StatusCode, message: Option<&str>) -> bool {
        if self.status_committed {
            tracing::warn!(
                path = %self.path,
                committed = self.response.status.as_u16(),
                requested = status.as_u16(),
                "Status already committed, ignoring"
            );
            return false;
        }

        self.status_committed = true;
        self.response.status = status;

        let mut record = LogRecord::new(self.request.method().as_str(), &self.path).status(status.as_u16());
        if let Some(message) = message {
            record = record.message(message);
        }
        if status.is_success() || status.is_redirection() {
            self.shared.logger.info(&record);
        } else {
            self.shared.logger.error(&record);
        }
        true
    }

    /// Drop everything written so far. Only the recovery boundary uses
    /// this; the response is still buffered, so nothing has been sent.
    pub(crate) fn reset_response(&mut self) {
        self.response = Response::default();
        self.status_committed = false;
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    pub fn status_committed(&self) -> bool {
        self.status_committed
    }

    /// Append raw body bytes, committing `200 OK` if nothing was committed.
    pub fn write_body(&mut self, data: &[u8]) {
        if !self.status_committed {
            self.set_status(StatusCode::OK);
        }
        self.response.body.extend_from_slice(data);
    }

    pub fn write_text(&mut self, status: StatusCode, text: impl fmt::Display) {
        self.set_header(header::CONTENT_TYPE.as_str(), TEXT_PLAIN);
        self.set_status(status);
        self.write_body(text.to_string().as_bytes());
    }

    pub fn write_json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set_header(header::CONTENT_TYPE.as_str(), APPLICATION_JSON);
                self.set_status(status);
                self.write_body(&body);
            }
            Err(e) => {
                tracing::error!(path = %self.path, error = %e, "Failed to encode JSON response");
                self.fail(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode response");
            }
        }
    }

    pub fn write_bytes(&mut self, status: StatusCode, data: &[u8]) {
        self.set_status(status);
        self.write_body(data);
    }

    /// Render template `name` through the configured renderer.
    pub fn write_html<T: Serialize + ?Sized>(&mut self, status: StatusCode, name: &str, data: &T) {
        let rendered = match (&self.shared.renderer, serde_json::to_value(data)) {
            (None, _) => Err("no template renderer configured".to_string()),
            (Some(_), Err(e)) => Err(format!("failed to encode template data: {e}")),
            (Some(renderer), Ok(value)) => renderer.render(name, &value).map_err(|e| e.to_string()),
        };

        match rendered {
            Ok(html) => {
                self.set_header(header::CONTENT_TYPE.as_str(), TEXT_HTML);
                self.set_status(status);
                self.write_body(html.as_bytes());
            }
            Err(message) => self.fail(StatusCode::INTERNAL_SERVER_ERROR, message),
        }
    }

    // ── Collaborators ─────────────────────────────────────────────────────

    pub fn logger(&self) -> &dyn RequestLogger {
        self.shared.logger.as_ref()
    }

    /// Register background work that must finish before shutdown completes.
    pub fn track_work(&self) -> InFlightGuard {
        self.shared.in_flight.track()
    }

    /// Manually register `n` units of background work.
    pub fn add_wait(&self, n: usize) {
        self.shared.in_flight.add(n);
    }

    /// Complete one unit registered with [`add_wait`](Self::add_wait).
    pub fn done(&self) {
        self.shared.in_flight.done();
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shared.shutdown.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.shutdown.is_triggered()
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }
}
