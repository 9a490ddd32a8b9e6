//! Static file handler.
//!
//! # Responsibilities
//! - Map the `*filepath` capture onto a root directory
//! - Answer 404 when the file does not exist
//! - Delegate the actual serving to a `FileServer` collaborator
//!
//! # Design Decisions
//! - Only plain path components are accepted; `..`, roots and prefixes
//!   are treated as missing files
//! - A directory is served through its `index.html`, if present

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::http::{header, StatusCode};

use crate::http::context::{Context, HandlerFunc};

/// Name of the wildcard capture registered by `static_files`.
pub const FILEPATH_PARAM: &str = "filepath";

/// Writes an existing file into the response.
pub trait FileServer: Send + Sync {
    fn serve(&self, ctx: &mut Context, file: &Path);
}

/// Reads files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileServer;

impl FileServer for FsFileServer {
    fn serve(&self, ctx: &mut Context, file: &Path) {
        match std::fs::read(file) {
            Ok(data) => {
                ctx.set_header(header::CONTENT_TYPE.as_str(), content_type(file));
                ctx.write_bytes(StatusCode::OK, &data);
            }
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "Failed to read static file");
                ctx.fail(StatusCode::INTERNAL_SERVER_ERROR, "failed to read file");
            }
        }
    }
}

/// Build the handler serving files below `root`.
pub(crate) fn static_handler(root: PathBuf, server: Arc<dyn FileServer>) -> HandlerFunc {
    Arc::new(move |ctx: &mut Context| {
        let requested = ctx.param(FILEPATH_PARAM).unwrap_or_default();
        match locate(&root, requested) {
            Some(file) => server.serve(ctx, &file),
            None => {
                tracing::debug!(root = %root.display(), file = %requested, "Static file not found");
                ctx.set_status(StatusCode::NOT_FOUND);
            }
        }
    })
}

/// Resolve `requested` below `root` to an existing file.
fn locate(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let candidate = root.join(relative);
    if candidate.is_file() {
        return Some(candidate);
    }
    let index = candidate.join("index.html");
    index.is_file().then_some(index)
}

fn content_type(file: &Path) -> &'static str {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
