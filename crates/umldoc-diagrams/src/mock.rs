//! Mock renderer for testing.
//!
//! Provides [`MockRenderer`] for exercising image output without a Kroki
//! server.

use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::render::{RenderError, RenderPort, RenderStream};

/// In-memory [`RenderPort`] that records its calls.
///
/// Rendered bytes are `"{format}\n{source}"`, which lets tests check exactly
/// what reached the renderer.
#[derive(Debug, Default)]
pub struct MockRenderer {
    fail_initialize: bool,
    fail_render: bool,
    initializations: AtomicUsize,
    renders: Mutex<Vec<(String, String)>>,
}

impl MockRenderer {
    /// Create a renderer that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make [`RenderPort::initialize`] fail.
    #[must_use]
    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    /// Make [`RenderPort::render`] fail.
    #[must_use]
    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    /// Number of `initialize` calls.
    #[must_use]
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    /// `(source, format)` pairs passed to `render`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn renders(&self) -> Vec<(String, String)> {
        self.renders.lock().unwrap().clone()
    }
}

impl RenderPort for MockRenderer {
    fn initialize(&self) -> Result<(), RenderError> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize {
            return Err(RenderError::Unavailable("mock renderer offline".to_owned()));
        }
        Ok(())
    }

    fn render(&self, source: &str, format: &str) -> Result<RenderStream, RenderError> {
        self.renders
            .lock()
            .unwrap()
            .push((source.to_owned(), format.to_owned()));
        if self.fail_render {
            return Err(RenderError::Http("HTTP 400: mock render failure".to_owned()));
        }
        Ok(Box::new(Cursor::new(format!("{format}\n{source}").into_bytes())))
    }
}
