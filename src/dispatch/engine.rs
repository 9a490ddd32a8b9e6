//! Top-level dispatcher.
//!
//! # Responsibilities
//! - Own the route table and the flat list of groups
//! - Own the collaborators handlers reach through the Context
//!   (request logger, template renderer, in-flight counter, shutdown)
//! - Turn one `Request` into one `Response`
//!
//! # Design Decisions
//! - Recovery is installed first on the root group at construction, so it
//!   is the outermost frame of every chain
//! - Collaborators are configured before serving; there is no way to
//!   change them through a shared `Arc<Engine>`
//! - Group prefixes match as plain string prefixes (`/api` also covers
//!   `/apix`)

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::error::{DispatchError, RouteError};
use crate::http::context::{Context, HandlerFunc};
use crate::http::middleware::recovery;
use crate::http::render::TemplateRenderer;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::lifecycle::{InFlight, Shutdown};
use crate::observability::{LogRecord, RequestLogger, TracingLogger};
use crate::routing::{Params, Router};

use super::group::RouterGroup;

/// Collaborators shared by every Context of one Engine.
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) logger: Arc<dyn RequestLogger>,
    pub(crate) renderer: Option<Arc<dyn TemplateRenderer>>,
    pub(crate) in_flight: InFlight,
    pub(crate) shutdown: Shutdown,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            logger: Arc::new(TracingLogger),
            renderer: None,
            in_flight: InFlight::new(),
            shutdown: Shutdown::new(),
        }
    }
}

/// A group as stored by the engine.
pub(crate) struct GroupEntry {
    pub(crate) prefix: String,
    pub(crate) middlewares: Vec<HandlerFunc>,
    pub(crate) parent: Option<usize>,
}

/// Index of the root group; its prefix is empty and matches every path.
pub(crate) const ROOT_GROUP: usize = 0;

pub struct Engine {
    pub(crate) router: Router<HandlerFunc>,
    pub(crate) groups: Vec<GroupEntry>,
    not_found: HandlerFunc,
    shared: Arc<Shared>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with the recovery middleware installed.
    pub fn new() -> Self {
        let mut engine = Self {
            router: Router::new(),
            groups: vec![GroupEntry {
                prefix: String::new(),
                middlewares: Vec::new(),
                parent: None,
            }],
            not_found: Arc::new(not_found),
            shared: Arc::new(Shared::default()),
        };
        engine.use_middleware(recovery());
        engine
    }

    // ── Configuration (before serving) ────────────────────────────────────

    /// Replace the request logger. Must happen before serving begins.
    pub fn set_logger(&mut self, logger: Arc<dyn RequestLogger>) -> &mut Self {
        Arc::make_mut(&mut self.shared).logger = logger;
        self
    }

    /// Install the renderer used by `Context::write_html`.
    pub fn set_renderer(&mut self, renderer: Arc<dyn TemplateRenderer>) -> &mut Self {
        Arc::make_mut(&mut self.shared).renderer = Some(renderer);
        self
    }

    /// Use `shutdown` as the signal handlers observe through the Context.
    pub fn set_shutdown(&mut self, shutdown: Shutdown) -> &mut Self {
        Arc::make_mut(&mut self.shared).shutdown = shutdown;
        self
    }

    /// Replace the terminal handler used when no route matches.
    pub fn set_not_found<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.not_found = Arc::new(handler);
        self
    }

    /// Counter of outstanding handler work, awaited on shutdown.
    pub fn in_flight(&self) -> InFlight {
        self.shared.in_flight.clone()
    }

    pub fn shutdown(&self) -> Shutdown {
        self.shared.shutdown.clone()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Handle to the root group (empty prefix).
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup::new(self, ROOT_GROUP)
    }

    /// Create a top-level group.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let index = self.push_group(ROOT_GROUP, prefix);
        RouterGroup::new(self, index)
    }

    pub(crate) fn push_group(&mut self, parent: usize, prefix: &str) -> usize {
        let prefix = format!("{}{}", self.groups[parent].prefix, prefix);
        tracing::debug!(prefix = %prefix, "Group created");
        self.groups.push(GroupEntry {
            prefix,
            middlewares: Vec::new(),
            parent: Some(parent),
        });
        self.groups.len() - 1
    }

    /// Append middleware to the root group (applies to every request).
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root().use_middleware(middleware);
        self
    }

    /// Append several middleware to the root group.
    pub fn use_all<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.root().use_all(middlewares);
        self
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.request(Method::GET, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.request(Method::POST, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.request(Method::PUT, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.request(Method::DELETE, pattern, handler)
    }

    /// Register `handler` for an arbitrary method.
    pub fn request<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root().request(method, pattern, handler)?;
        Ok(self)
    }

    /// Serve files under `root_dir` at `relative_path/*filepath`.
    pub fn static_files(&mut self, relative_path: &str, root_dir: impl Into<std::path::PathBuf>) -> Result<&mut Self, RouteError> {
        self.root().static_files(relative_path, root_dir)?;
        Ok(self)
    }

    /// Registered (method, pattern) pairs.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.router.routes()
    }

    /// Group prefixes in creation order, root first.
    pub fn group_prefixes(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.prefix.as_str()).collect()
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Dispatch one request through middleware and the matched handler.
    ///
    /// Runs synchronously to completion on the calling thread.
    pub fn serve(&self, request: Request) -> Response {
        let path = request.path().to_string();
        self.shared
            .logger
            .debug(&LogRecord::new(request.method().as_str(), &path));

        let mut chain = self.middlewares_for(&path);

        let (params, pattern) = match self.router.resolve(request.method(), &path) {
            Some(matched) => {
                chain.push(Arc::clone(matched.value));
                (matched.params, Some(matched.pattern.to_string()))
            }
            None => {
                chain.push(Arc::clone(&self.not_found));
                (Params::new(), None)
            }
        };

        let mut ctx = Context::new(request, params, pattern, chain, Arc::clone(&self.shared));
        ctx.next();
        ctx.into_response()
    }

    /// Middleware of every group whose prefix starts `path`, in group order.
    fn middlewares_for(&self, path: &str) -> Vec<HandlerFunc> {
        self.groups
            .iter()
            .filter(|group| path.starts_with(&group.prefix))
            .flat_map(|group| group.middlewares.iter().cloned())
            .collect()
    }
}

/// Default terminal responder for unmatched routes.
fn not_found(ctx: &mut Context) {
    ctx.set_error(DispatchError::RouteNotFound);
    let body = format!("404 NOT FOUND: {}\n", ctx.path());
    ctx.write_text(StatusCode::NOT_FOUND, body);
}
