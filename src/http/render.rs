//! HTML template rendering collaborator.
//!
//! The dispatch core only defines the seam; template loading and syntax
//! belong to the implementation installed with `Engine::set_renderer`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template '{0}' not found")]
    NotFound(String),

    #[error("failed to render template '{name}': {reason}")]
    Failed { name: String, reason: String },
}

/// Renders a named template with JSON-shaped data.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, RenderError>;
}
