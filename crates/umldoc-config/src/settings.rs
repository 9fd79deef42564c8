//! Resolved diagram output settings.
//!
//! [`Settings`] is the record every other component reads: which artifacts
//! to produce, where to put them and which image format to use by default.
//! It is built once per build session from the host's nested options
//! structure and never changed afterwards.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

/// Default directory for diagram-source (`.puml`) files.
pub const DEFAULT_DIAGRAM_SOURCE_DIR: &str = "./jsDoc/puml";

/// Default directory for rendered image files.
pub const DEFAULT_IMAGE_DIR: &str = "./jsDoc/images";

/// Default image format for tags named after a diagram-source file.
pub const DEFAULT_IMAGE_FORMAT: &str = "png";

/// Diagram output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Write diagram-source files.
    pub create_diagram_source: bool,
    /// Render image files.
    pub create_images: bool,
    /// Whether the host should show the rendered image in place of the
    /// inline diagram text. Read by hosts only.
    pub replace_with_image: bool,
    /// Absolute diagram-source output directory, `None` when disabled.
    pub diagram_source_dir: Option<PathBuf>,
    /// Absolute image output directory, `None` when disabled.
    pub image_dir: Option<PathBuf>,
    /// Format used when a tag names a diagram-source file.
    pub default_image_format: String,
}

impl Settings {
    /// Built-in defaults with output directories anchored at `base_dir`.
    #[must_use]
    pub fn default_with_base(base_dir: &Path) -> Self {
        Self {
            create_diagram_source: true,
            create_images: true,
            replace_with_image: false,
            diagram_source_dir: Some(absolute_path(base_dir, DEFAULT_DIAGRAM_SOURCE_DIR)),
            image_dir: Some(absolute_path(base_dir, DEFAULT_IMAGE_DIR)),
            default_image_format: DEFAULT_IMAGE_FORMAT.to_owned(),
        }
    }

    /// Merge host options over the built-in defaults.
    ///
    /// Recognized keys:
    ///
    /// ```text
    /// puml.create             bool
    /// puml.destination        non-empty string
    /// images.create           bool
    /// images.replaceWithImage bool
    /// images.destination      non-empty string
    /// images.defaultFormat    non-empty string of ASCII letters and digits
    /// ```
    ///
    /// Every key is optional. A value of the wrong type is treated as absent,
    /// never coerced, so resolution cannot fail.
    #[must_use]
    pub fn resolve(options: Option<&Value>, base_dir: &Path) -> Self {
        let mut settings = Self::default_with_base(base_dir);
        let Some(options) = options else {
            return settings;
        };

        let puml = options.get("puml");
        if let Some(create) = bool_option(puml, "create") {
            settings.create_diagram_source = create;
        }
        if let Some(destination) = str_option(puml, "destination") {
            tracing::debug!(destination, "got diagram-source destination from options");
            settings.diagram_source_dir = Some(absolute_path(base_dir, destination));
        }

        let images = options.get("images");
        if let Some(create) = bool_option(images, "create") {
            settings.create_images = create;
        }
        if let Some(replace) = bool_option(images, "replaceWithImage") {
            settings.replace_with_image = replace;
        }
        if let Some(destination) = str_option(images, "destination") {
            tracing::debug!(destination, "got image destination from options");
            settings.image_dir = Some(absolute_path(base_dir, destination));
        }
        if let Some(format) = str_option(images, "defaultFormat") {
            if is_valid_image_format(format) {
                format.clone_into(&mut settings.default_image_format);
            } else {
                tracing::warn!(
                    format,
                    "ignoring invalid images.defaultFormat, using {DEFAULT_IMAGE_FORMAT}"
                );
            }
        }

        settings
    }

    /// Diagram-source output directory, if configured.
    #[must_use]
    pub fn diagram_source_dir(&self) -> Option<&Path> {
        self.diagram_source_dir.as_deref()
    }

    /// Image output directory, if configured.
    #[must_use]
    pub fn image_dir(&self) -> Option<&Path> {
        self.image_dir.as_deref()
    }
}

/// Whether `format` can be used as a file extension: ASCII letters and
/// digits only.
#[must_use]
pub fn is_valid_image_format(format: &str) -> bool {
    !format.is_empty() && format.chars().all(|c| c.is_ascii_alphanumeric())
}

fn bool_option(section: Option<&Value>, key: &str) -> Option<bool> {
    section?.get(key)?.as_bool()
}

fn str_option<'a>(section: Option<&'a Value>, key: &str) -> Option<&'a str> {
    section?.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// Join `path` onto `base` unless it is already absolute, then normalize.
#[must_use]
pub fn absolute_path(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. The filesystem is not consulted.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
