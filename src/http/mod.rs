//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, limits, blocking dispatch)
//!     → request.rs (buffered Request)
//!     → [Engine resolves route, assembles chain]
//!     → context.rs (chain execution, response helpers)
//!     → middleware/ (recovery, access log)
//!     → response.rs (buffered Response → axum response)
//!     → Send to client
//! ```

pub mod context;
pub mod middleware;
pub mod render;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use context::{Context, HandlerFunc};
pub use render::{RenderError, TemplateRenderer};
pub use request::{Request, X_REQUEST_ID};
pub use response::Response;
pub use server::HttpServer;
pub use static_files::{FileServer, FsFileServer};
