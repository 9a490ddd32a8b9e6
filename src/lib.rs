//! Sprig: a minimal HTTP dispatch engine.
//!
//! A prefix-tree router, route groups with accumulated middleware, and an
//! onion-style handler chain driven through a per-request [`Context`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use dispatch::{Engine, RouterGroup};
pub use error::{DispatchError, RouteError, ServerError};
pub use http::{Context, HandlerFunc, HttpServer, Request, Response};
pub use lifecycle::Shutdown;
