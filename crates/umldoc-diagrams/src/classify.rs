//! Output routing for declared diagram names.
//!
//! The extension of the declared name decides what the user asked for:
//!
//! | Declared name | Diagram source            | Image                              | Format              |
//! |---------------|---------------------------|------------------------------------|---------------------|
//! | `a.png`       | `{puml dir}/a.puml`       | `{image dir}/a.png`                | `png`               |
//! | `a.puml`      | `{puml dir}/a.puml`       | `{image dir}/a.{default format}`   | default format      |
//! | `a.xyz`, `a`  | ignored                   | ignored                            |                     |
//!
//! All paths are absolute and lexically normalized so that two spellings of
//! the same location collide in the registry.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use umldoc_config::{Settings, is_valid_image_format, normalize_path};

use crate::consts::{DIAGRAM_SOURCE_EXTENSION, DIAGRAM_SOURCE_EXTENSIONS, IMAGE_EXTENSIONS};

/// What kind of file the declared name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// The name is a rendered image (`.png`, `.svg`, `.eps`).
    Image,
    /// The name is a diagram-source file (`.puml` and aliases).
    DiagramSource,
}

impl TargetKind {
    /// Detect the target kind from a lowercase extension without the dot.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        if IMAGE_EXTENSIONS.contains(&ext) {
            Some(Self::Image)
        } else if DIAGRAM_SOURCE_EXTENSIONS.contains(&ext) {
            Some(Self::DiagramSource)
        } else {
            None
        }
    }
}

/// Output paths and format computed for one declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    /// Absolute diagram-source path, if a diagram-source directory is set.
    pub diagram_path: Option<PathBuf>,
    /// Absolute image path, if an image directory is set.
    pub image_path: Option<PathBuf>,
    /// Format handed to the renderer.
    pub image_format: String,
}

/// Why an annotation produces no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No output name was declared.
    MissingName,
    /// The declared name has an extension that is neither an image nor a
    /// diagram-source extension. Holds the extension with its dot, or an
    /// empty string when there is none.
    UnknownExtension(String),
    /// Neither output directory is configured.
    NoOutputPath,
    /// `..` segments in the declared name climb above the output directory.
    OutsideOutputDir,
    /// The default image format cannot be used as a file extension.
    InvalidDefaultFormat(String),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => f.write_str("image name missing for @startuml tag"),
            Self::UnknownExtension(ext) if ext.is_empty() => {
                f.write_str("declared name has no file extension")
            }
            Self::UnknownExtension(ext) => write!(f, "unknown image format \"{ext}\""),
            Self::NoOutputPath => f.write_str("no output directory configured"),
            Self::OutsideOutputDir => f.write_str("declared name points outside the output directory"),
            Self::InvalidDefaultFormat(format) => {
                write!(f, "invalid default image format \"{format}\"")
            }
        }
    }
}

/// Classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The annotation has at least one output path.
    Routed {
        /// Kind of file the name refers to.
        kind: TargetKind,
        /// Computed output routes.
        routes: Routes,
    },
    /// The annotation is kept inline only.
    Ignored(IgnoreReason),
}

/// Classify a declared name and compute its output routes.
#[must_use]
pub fn classify(declared_name: &str, settings: &Settings) -> Classification {
    let name = declared_name.trim();
    if name.is_empty() {
        return Classification::Ignored(IgnoreReason::MissingName);
    }
    // Declared names always land inside the output directories.
    let name = Path::new(name.trim_start_matches(['/', '\\']));
    if escapes_base(name) {
        return Classification::Ignored(IgnoreReason::OutsideOutputDir);
    }

    let Some(ext) = name.extension().and_then(|e| e.to_str()) else {
        return Classification::Ignored(IgnoreReason::UnknownExtension(String::new()));
    };
    let ext_lower = ext.to_lowercase();
    let Some(kind) = TargetKind::from_extension(&ext_lower) else {
        return Classification::Ignored(IgnoreReason::UnknownExtension(format!(".{ext}")));
    };

    let routes = match kind {
        TargetKind::Image => Routes {
            diagram_path: settings
                .diagram_source_dir()
                .map(|dir| output_path(dir, &name.with_extension(DIAGRAM_SOURCE_EXTENSION))),
            image_path: settings.image_dir().map(|dir| output_path(dir, name)),
            image_format: ext_lower,
        },
        TargetKind::DiagramSource if !is_valid_image_format(&settings.default_image_format) => {
            return Classification::Ignored(IgnoreReason::InvalidDefaultFormat(
                settings.default_image_format.clone(),
            ));
        }
        TargetKind::DiagramSource => Routes {
            diagram_path: settings
                .diagram_source_dir()
                .map(|dir| output_path(dir, name)),
            image_path: settings.image_dir().map(|dir| {
                output_path(dir, &name.with_extension(&settings.default_image_format))
            }),
            image_format: settings.default_image_format.clone(),
        },
    };

    if routes.diagram_path.is_none() && routes.image_path.is_none() {
        return Classification::Ignored(IgnoreReason::NoOutputPath);
    }

    Classification::Routed { kind, routes }
}

/// Whether `..` segments in a relative `name` climb above its starting point.
fn escapes_base(name: &Path) -> bool {
    let mut depth = 0usize;
    for component in name.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return true,
            },
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}

fn output_path(dir: &Path, name: &Path) -> PathBuf {
    normalize_path(&dir.join(name))
}
