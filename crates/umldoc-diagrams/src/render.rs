//! Rendering capability used to turn diagram text into image bytes.

use std::io::Read;

/// Rendered image bytes, read by the emitter straight into the output file.
pub type RenderStream = Box<dyn Read + Send>;

/// Error returned by a [`RenderPort`].
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

/// Converts diagram descriptions into images.
///
/// Implementations are shared across the emission thread pool.
pub trait RenderPort: Send + Sync {
    /// Check that the renderer can be used.
    ///
    /// Called once per build, before any [`render`](Self::render) call, and
    /// only when image output is enabled. An error disables image output for
    /// the whole build.
    fn initialize(&self) -> Result<(), RenderError> {
        Ok(())
    }

    /// Render a wrapped diagram description to the given image format.
    fn render(&self, source: &str, format: &str) -> Result<RenderStream, RenderError>;
}
