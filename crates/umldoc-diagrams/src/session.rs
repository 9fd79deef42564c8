//! Build session: the host-facing lifecycle around registry and emission.
//!
//! A host drives one [`BuildSession`] per documentation build:
//!
//! 1. [`on_parse_begin`](BuildSession::on_parse_begin) once, to bring up the
//!    renderer
//! 2. [`on_annotation_tagged`](BuildSession::on_annotation_tagged) for every
//!    `@startuml` annotation it reports; no I/O happens here
//! 3. [`on_processing_complete`](BuildSession::on_processing_complete) once,
//!    which consumes the session and writes every registered tag
//!
//! Consuming the session in step 3 makes late registration impossible.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use umldoc_config::Settings;

use crate::classify::{Classification, IgnoreReason, classify};
use crate::emit::{EmitSummary, emit};
use crate::registry::{Registration, TagRegistry};
use crate::render::RenderPort;
use crate::tag::{AnnotationContext, DiagramTag, SourceLocation};

/// What happened to one annotation notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// The tag now owns this output path.
    Registered(PathBuf),
    /// Repeated notification for an annotation bound to code.
    Skipped,
    /// The annotation produces no output.
    Ignored(IgnoreReason),
    /// Another tag already owns the output path.
    Duplicate {
        /// The contested path.
        path: PathBuf,
        /// Where the owning tag was declared.
        existing: SourceLocation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RendererState {
    Pending,
    Ready,
    Unavailable,
}

/// State for one documentation build.
pub struct BuildSession {
    settings: Settings,
    registry: TagRegistry,
    renderer: Option<Arc<dyn RenderPort>>,
    renderer_state: RendererState,
}

impl BuildSession {
    /// Start a session with resolved settings and an optional renderer.
    #[must_use]
    pub fn new(settings: Settings, renderer: Option<Arc<dyn RenderPort>>) -> Self {
        tracing::info!(
            path = %display_dir(settings.diagram_source_dir()),
            "using destination path for puml files"
        );
        tracing::info!(
            path = %display_dir(settings.image_dir()),
            "using destination path for image files"
        );
        Self {
            settings,
            registry: TagRegistry::new(),
            renderer,
            renderer_state: RendererState::Pending,
        }
    }

    /// Settings for this build.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Tags registered so far.
    #[must_use]
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Whether images will be rendered at completion.
    #[must_use]
    pub fn images_enabled(&self) -> bool {
        self.settings.create_images && self.renderer_state == RendererState::Ready
    }

    /// Parse-begin hook: initialize the renderer when images are requested.
    ///
    /// Failures are logged once and disable image output for the build;
    /// diagram-source output is unaffected.
    pub fn on_parse_begin(&mut self) {
        if !self.settings.create_images || self.renderer_state != RendererState::Pending {
            return;
        }

        self.renderer_state = match &self.renderer {
            None => {
                tracing::error!("\"createImages\" is set to true but no renderer is configured");
                RendererState::Unavailable
            }
            Some(renderer) => match renderer.initialize() {
                Ok(()) => RendererState::Ready,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "\"createImages\" is set to true but the renderer is not available"
                    );
                    RendererState::Unavailable
                }
            },
        };
    }

    /// Annotation hook: classify and register one notification.
    pub fn on_annotation_tagged(&mut self, ctx: &AnnotationContext) -> TagOutcome {
        if !ctx.is_authoritative() {
            tracing::debug!(location = %ctx.location, "skipping repeated notification for bound annotation");
            return TagOutcome::Skipped;
        }

        let name = ctx.name.as_deref().map_or("", str::trim);
        let routes = match classify(name, &self.settings) {
            Classification::Routed { kind, routes } => {
                tracing::debug!(location = %ctx.location, name, ?kind, "found uml tag");
                routes
            }
            Classification::Ignored(reason) => {
                tracing::warn!("IGNORED: {reason} at {}", ctx.location);
                return TagOutcome::Ignored(reason);
            }
        };

        let tag = DiagramTag::capture(&ctx.body, name, ctx.location.clone(), routes);
        let Some(key) = tag.registry_key().map(Path::to_path_buf) else {
            return TagOutcome::Ignored(IgnoreReason::NoOutputPath);
        };

        match self.registry.register(key.clone(), tag) {
            Registration::Accepted => TagOutcome::Registered(key),
            Registration::Duplicate { path, existing } => {
                tracing::warn!(
                    "Filename {} already defined by tag at {existing}. Duplicate found at {}",
                    path.display(),
                    ctx.location
                );
                TagOutcome::Duplicate { path, existing }
            }
        }
    }

    /// Processing-complete hook: write every registered tag.
    ///
    /// Initializes the renderer first if the host never called
    /// [`on_parse_begin`](Self::on_parse_begin).
    pub fn on_processing_complete(mut self) -> EmitSummary {
        self.on_parse_begin();
        let renderer = if self.images_enabled() {
            self.renderer.as_deref()
        } else {
            None
        };

        tracing::debug!(tags = self.registry.len(), "processing complete");
        let tags = std::mem::take(&mut self.registry).drain_all();
        emit(&tags, &self.settings, renderer)
    }

    /// End the session without emitting, returning the registered tags.
    #[must_use]
    pub fn into_tags(self) -> Vec<DiagramTag> {
        self.registry.drain_all()
    }
}

fn display_dir(dir: Option<&Path>) -> String {
    dir.map_or_else(|| "(disabled)".to_owned(), |d| d.display().to_string())
}
