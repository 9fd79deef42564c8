//! First-registrant-wins collection of diagram tags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::tag::{DiagramTag, SourceLocation};

/// Outcome of [`TagRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The path was free and now belongs to the tag.
    Accepted,
    /// One of the tag's output paths is already claimed; the registry is
    /// unchanged.
    Duplicate {
        /// The contested output path.
        path: PathBuf,
        /// Location of the tag that owns the path.
        existing: SourceLocation,
    },
}

/// Tags to emit, keyed by absolute output path.
///
/// Every file a tag will write is claimed on registration, so no two tags
/// share an output path. Claims are never replaced or removed; tags are only
/// drained at the end of the build.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: BTreeMap<PathBuf, DiagramTag>,
    claims: BTreeMap<PathBuf, SourceLocation>,
}

impl TagRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tag` under `path` unless `path` or any output path of the
    /// tag is already claimed.
    pub fn register(&mut self, path: PathBuf, tag: DiagramTag) -> Registration {
        let wanted: Vec<PathBuf> = std::iter::once(path.clone())
            .chain(tag.output_diagram_path().map(Path::to_path_buf))
            .chain(tag.output_image_path().map(Path::to_path_buf))
            .collect();

        if let Some((claimed, owner)) = wanted
            .iter()
            .find_map(|p| self.claims.get(p).map(|owner| (p, owner)))
        {
            return Registration::Duplicate {
                path: claimed.clone(),
                existing: owner.clone(),
            };
        }

        for claimed in wanted {
            self.claims.insert(claimed, tag.location().clone());
        }
        self.tags.insert(path, tag);
        Registration::Accepted
    }

    /// Tag registered under `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&DiagramTag> {
        self.tags.get(path)
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tag has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over registered tags ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &DiagramTag)> {
        self.tags.iter().map(|(path, tag)| (path.as_path(), tag))
    }

    /// Consume the registry, yielding every tag once.
    #[must_use]
    pub fn drain_all(self) -> Vec<DiagramTag> {
        self.tags.into_values().collect()
    }
}
