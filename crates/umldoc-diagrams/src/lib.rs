//! `PlantUML` tag routing and emission for umldoc.
//!
//! This crate turns `@startuml` annotations reported by a documentation host
//! into diagram-source files and rendered images:
//! - Tags are classified by the extension of their declared name
//! - Output paths are deduplicated; the first tag to claim a path keeps it
//! - Nothing is written until the host signals that scanning is complete
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - [`tag`]: Annotation contexts and captured tags (`AnnotationContext`, `DiagramTag`)
//! - [`classify`]: Output path and format computation for declared names
//! - [`registry`]: `TagRegistry` keyed by absolute output path
//! - [`emit`]: Parallel writing of diagram sources and images
//! - [`render`]: The `RenderPort` rendering capability
//! - [`kroki`]: `RenderPort` backed by a Kroki server
//! - [`cache`]: Content-addressed render cache
//! - [`session`]: `BuildSession` lifecycle hooks for hosts
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use umldoc_config::Settings;
//! use umldoc_diagrams::{AnnotationContext, Binding, BuildSession, KrokiRenderer, SourceLocation};
//!
//! let settings = Settings::resolve(None, &std::env::current_dir()?);
//! let mut session = BuildSession::new(settings, Some(Arc::new(KrokiRenderer::new("https://kroki.io"))));
//!
//! session.on_parse_begin();
//! session.on_annotation_tagged(&AnnotationContext {
//!     body: "Alice -> Bob".to_owned(),
//!     name: Some("hello.png".to_owned()),
//!     location: SourceLocation::new("src/app.js", 3),
//!     binding: Binding::Unbound,
//! });
//! let summary = session.on_processing_complete();
//! ```

mod cache;
mod classify;
mod consts;
mod emit;
mod kroki;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod registry;
mod render;
mod session;
mod tag;

pub use cache::{CachedRenderer, DiagramKey};
pub use classify::{Classification, IgnoreReason, Routes, TargetKind, classify};
pub use consts::{DIAGRAM_SOURCE_EXTENSIONS, END_MARKER, IMAGE_EXTENSIONS, START_MARKER};
pub use emit::{EmitError, EmitSummary, emit};
pub use kroki::KrokiRenderer;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRenderer;
pub use registry::{Registration, TagRegistry};
pub use render::{RenderError, RenderPort, RenderStream};
pub use session::{BuildSession, TagOutcome};
pub use tag::{AnnotationContext, Binding, DiagramTag, SourceLocation, wrap_description};
