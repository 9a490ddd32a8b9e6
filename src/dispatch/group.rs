//! Route groups.
//!
//! # Responsibilities
//! - Derive the full prefix from the parent group
//! - Collect group middleware (append-only)
//! - Prefix patterns and forward registrations to the engine's router
//!
//! # Design Decisions
//! - A group handle borrows the engine mutably; groups therefore only exist
//!   during the registration phase
//! - Nested groups are registered in the engine's flat list at creation

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;

use crate::dispatch::engine::Engine;
use crate::error::RouteError;
use crate::http::context::{Context, HandlerFunc};
use crate::http::static_files::{static_handler, FileServer, FsFileServer, FILEPATH_PARAM};

/// Registration handle for one group of an [`Engine`].
pub struct RouterGroup<'a> {
    engine: &'a mut Engine,
    index: usize,
}

impl<'a> RouterGroup<'a> {
    pub(crate) fn new(engine: &'a mut Engine, index: usize) -> Self {
        Self { engine, index }
    }

    /// Full prefix, including every ancestor's.
    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.index].prefix
    }

    /// Prefix of the parent group, `None` for the root group.
    pub fn parent_prefix(&self) -> Option<&str> {
        self.engine.groups[self.index]
            .parent
            .map(|p| self.engine.groups[p].prefix.as_str())
    }

    /// Create a child group whose prefix is `self.prefix() + prefix`.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let index = self.engine.push_group(self.index, prefix);
        RouterGroup::new(self.engine, index)
    }

    /// Append middleware to this group.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.engine.groups[self.index]
            .middlewares
            .push(Arc::new(middleware));
        self
    }

    /// Append several already-boxed middleware, in iteration order.
    pub fn use_all<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.engine.groups[self.index].middlewares.extend(middlewares);
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

    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.request(Method::PATCH, pattern, handler)
    }

    pub fn head<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.request(Method::HEAD, pattern, handler)
    }

    /// Register `handler` for `method` at `self.prefix() + pattern`.
    pub fn request<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(method, pattern, Arc::new(handler))
    }

    /// Serve files under `root_dir` at `relative_path/*filepath`.
    pub fn static_files(
        &mut self,
        relative_path: &str,
        root_dir: impl Into<PathBuf>,
    ) -> Result<&mut Self, RouteError> {
        self.static_files_with(relative_path, root_dir, Arc::new(FsFileServer))
    }

    /// Like [`static_files`](Self::static_files) with a custom file server.
    pub fn static_files_with(
        &mut self,
        relative_path: &str,
        root_dir: impl Into<PathBuf>,
        server: Arc<dyn FileServer>,
    ) -> Result<&mut Self, RouteError> {
        let pattern = format!("{}/*{}", relative_path.trim_end_matches('/'), FILEPATH_PARAM);
        let handler = static_handler(root_dir.into(), server);
        self.add_route(Method::GET, &pattern, handler)
    }

    fn add_route(&mut self, method: Method, pattern: &str, handler: HandlerFunc) -> Result<&mut Self, RouteError> {
        let full = format!("{}{}", self.prefix(), pattern);
        self.engine.router.add_route(method, &full, handler)?;
        Ok(self)
    }
}
