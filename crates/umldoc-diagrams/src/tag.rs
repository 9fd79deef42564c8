//! Diagram annotations and the tags captured from them.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::classify::Routes;
use crate::consts::{END_MARKER, START_MARKER};

/// Where an annotation was found.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLocation {
    /// Originating source file.
    pub file: PathBuf,
    /// One-based line of the `@startuml` marker.
    pub line: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Whether the host had already attached the comment to a code element when
/// it reported the annotation.
///
/// Hosts report an attached comment twice: once as soon as the comment is
/// parsed, and again once it is bound to the following declaration. Only the
/// unbound report is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Reported from the comment alone.
    Unbound,
    /// Reported again after association with a code element.
    Bound,
}

/// One host notification for a `@startuml` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationContext {
    /// Diagram body between the markers, without the markers themselves.
    pub body: String,
    /// Declared output name, if the annotation had one.
    pub name: Option<String>,
    /// Location of the annotation.
    pub location: SourceLocation,
    /// Binding state at notification time.
    pub binding: Binding,
}

impl AnnotationContext {
    /// Whether this notification should be processed.
    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.binding == Binding::Unbound
    }
}

/// Wrap a diagram body in start and end marker lines.
#[must_use]
pub fn wrap_description(body: &str) -> String {
    let mut wrapped = String::with_capacity(START_MARKER.len() + body.len() + END_MARKER.len() + 2);
    wrapped.push_str(START_MARKER);
    wrapped.push('\n');
    wrapped.push_str(body);
    wrapped.push('\n');
    wrapped.push_str(END_MARKER);
    wrapped
}

/// A classified annotation ready for registration.
///
/// The description is wrapped once, when the tag is created; nothing
/// downstream can wrap it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramTag {
    raw_description: String,
    declared_name: String,
    location: SourceLocation,
    output_diagram_path: Option<PathBuf>,
    output_image_path: Option<PathBuf>,
    image_format: Option<String>,
}

impl DiagramTag {
    /// Capture an annotation body with its computed routes.
    #[must_use]
    pub fn capture(
        body: &str,
        declared_name: impl Into<String>,
        location: SourceLocation,
        routes: Routes,
    ) -> Self {
        Self {
            raw_description: wrap_description(body),
            declared_name: declared_name.into(),
            location,
            output_diagram_path: routes.diagram_path,
            output_image_path: routes.image_path,
            image_format: Some(routes.image_format),
        }
    }

    /// Wrapped diagram description.
    #[must_use]
    pub fn raw_description(&self) -> &str {
        &self.raw_description
    }

    /// Name declared on the annotation.
    #[must_use]
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    /// Where the annotation was found.
    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Absolute diagram-source output path.
    #[must_use]
    pub fn output_diagram_path(&self) -> Option<&Path> {
        self.output_diagram_path.as_deref()
    }

    /// Absolute image output path.
    #[must_use]
    pub fn output_image_path(&self) -> Option<&Path> {
        self.output_image_path.as_deref()
    }

    /// Image format passed to the renderer.
    #[must_use]
    pub fn image_format(&self) -> Option<&str> {
        self.image_format.as_deref()
    }

    /// Key the tag is registered under: the diagram-source path, or the image
    /// path when no diagram-source directory is configured.
    #[must_use]
    pub fn registry_key(&self) -> Option<&Path> {
        self.output_diagram_path().or(self.output_image_path())
    }
}
