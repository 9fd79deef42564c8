//! Writing registered tags to disk.
//!
//! Emission runs once per build, after every annotation has been registered.
//! Tags own distinct output paths, so they are processed in parallel on the
//! rayon thread pool. A failure affects only the artifact it occurred on.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use umldoc_config::Settings;

use crate::render::{RenderError, RenderPort};
use crate::tag::DiagramTag;

/// Counts reported after emission. Failure details are logged, not returned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitSummary {
    /// Number of tags processed.
    pub tags: usize,
    /// Diagram-source files written.
    pub sources_written: usize,
    /// Image files written.
    pub images_written: usize,
    /// Artifacts that could not be written.
    pub failures: usize,
}

/// Failure to produce one artifact.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("could not render {}: {source}", path.display())]
    Render { path: PathBuf, source: RenderError },
}

/// Result of emitting one tag; `None` means the artifact was not requested.
#[derive(Debug, Default)]
struct TagResult {
    source: Option<Result<(), EmitError>>,
    image: Option<Result<(), EmitError>>,
}

/// Write diagram-source files and render images for all `tags`.
///
/// `renderer` is `None` when no rendering capability is available; image
/// output is then skipped without further diagnostics.
pub fn emit(tags: &[DiagramTag], settings: &Settings, renderer: Option<&dyn RenderPort>) -> EmitSummary {
    let results: Vec<TagResult> = tags
        .par_iter()
        .map(|tag| emit_one(tag, settings, renderer))
        .collect();

    let mut summary = EmitSummary {
        tags: tags.len(),
        ..EmitSummary::default()
    };
    for result in results {
        match result.source {
            Some(Ok(())) => summary.sources_written += 1,
            Some(Err(e)) => {
                tracing::error!("{e}");
                summary.failures += 1;
            }
            None => {}
        }
        match result.image {
            Some(Ok(())) => summary.images_written += 1,
            Some(Err(e)) => {
                tracing::error!("{e}");
                summary.failures += 1;
            }
            None => {}
        }
    }
    summary
}

fn emit_one(tag: &DiagramTag, settings: &Settings, renderer: Option<&dyn RenderPort>) -> TagResult {
    let mut result = TagResult::default();

    if settings.create_diagram_source
        && let Some(path) = tag.output_diagram_path()
    {
        tracing::info!(path = %path.display(), "writing puml file");
        result.source = Some(write_diagram_source(path, tag.raw_description()));
    }

    if settings.create_images
        && let Some(path) = tag.output_image_path()
    {
        if let Some(renderer) = renderer {
            let format = tag
                .image_format()
                .unwrap_or(settings.default_image_format.as_str());
            tracing::info!(path = %path.display(), format, "writing image file");
            result.image = Some(write_image(path, tag.raw_description(), format, renderer));
        } else {
            tracing::debug!(path = %path.display(), "no renderer, skipping image");
        }
    }

    result
}

fn ensure_parent_dir(path: &Path) -> Result<(), EmitError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|source| EmitError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })
}

fn write_diagram_source(path: &Path, description: &str) -> Result<(), EmitError> {
    ensure_parent_dir(path)?;
    fs::write(path, description).map_err(|source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_image(
    path: &Path,
    description: &str,
    format: &str,
    renderer: &dyn RenderPort,
) -> Result<(), EmitError> {
    ensure_parent_dir(path)?;
    let mut stream = renderer
        .render(description, format)
        .map_err(|source| EmitError::Render {
            path: path.to_path_buf(),
            source,
        })?;
    let write_err = |source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(write_err)?;
    io::copy(&mut stream, &mut file).map_err(write_err)?;
    Ok(())
}
