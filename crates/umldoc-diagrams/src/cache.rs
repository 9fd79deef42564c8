//! Content-addressed cache for rendered images.
//!
//! [`CachedRenderer`] wraps another [`RenderPort`] and stores every rendered
//! image under a hash of its format and source, so unchanged diagrams are
//! not sent to the renderer again on the next build. Cache failures are
//! logged and otherwise ignored.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::consts::KROKI_ENDPOINT;
use crate::render::{RenderError, RenderPort, RenderStream};

/// Diagram parameters for cache key computation.
#[derive(Debug)]
pub struct DiagramKey<'a> {
    /// Wrapped diagram source.
    pub source: &'a str,
    /// Output format ("png", "svg", ...).
    pub format: &'a str,
}

impl DiagramKey<'_> {
    /// SHA-256 of `"plantuml:{format}:{source}"`, hex encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{KROKI_ENDPOINT}:{}:{}", self.format, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Caching decorator for a [`RenderPort`].
pub struct CachedRenderer<R> {
    inner: R,
    dir: PathBuf,
}

impl<R: RenderPort> CachedRenderer<R> {
    /// Cache renders of `inner` under `dir`.
    pub fn new(inner: R, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &DiagramKey<'_>) -> PathBuf {
        self.dir.join(format!("{}.{}", key.compute_hash(), key.format))
    }

    fn store(&self, path: &Path, data: &[u8]) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::debug!(error = %e, "Failed to create render cache directory");
            return;
        }
        if let Err(e) = fs::write(path, data) {
            tracing::debug!(path = %path.display(), error = %e, "Failed to write render cache entry");
        }
    }
}

impl<R: RenderPort> RenderPort for CachedRenderer<R> {
    fn initialize(&self) -> Result<(), RenderError> {
        self.inner.initialize()
    }

    fn render(&self, source: &str, format: &str) -> Result<RenderStream, RenderError> {
        let key = DiagramKey { source, format };
        let path = self.entry_path(&key);

        if let Ok(data) = fs::read(&path) {
            tracing::debug!(path = %path.display(), "Render cache hit");
            return Ok(Box::new(Cursor::new(data)));
        }

        let mut data = Vec::new();
        self.inner.render(source, format)?.read_to_end(&mut data)?;
        self.store(&path, &data);
        Ok(Box::new(Cursor::new(data)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl RenderPort for CountingRenderer {
        fn render(&self, source: &str, format: &str) -> Result<RenderStream, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Cursor::new(format!("{format}|{source}").into_bytes())))
        }
    }

    fn read_all(mut stream: RenderStream) -> String {
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_diagram_key_hash() {
        let a = DiagramKey {
            source: "@startuml\nA -> B\n@enduml",
            format: "png",
        };
        let b = DiagramKey {
            source: "@startuml\nA -> B\n@enduml",
            format: "svg",
        };

        assert_eq!(a.compute_hash(), a.compute_hash());
        assert_ne!(a.compute_hash(), b.compute_hash());
        assert_eq!(a.compute_hash().len(), 64);
        assert!(a.compute_hash().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_second_render_is_served_from_cache() {
        let tmp = TempDir::new().unwrap();
        let renderer = CachedRenderer::new(CountingRenderer::default(), tmp.path().join("cache"));

        let first = read_all(renderer.render("src", "png").unwrap());
        let second = read_all(renderer.render("src", "png").unwrap());

        assert_eq!(first, "png|src");
        assert_eq!(second, first);
        assert_eq!(renderer.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_different_format_misses() {
        let tmp = TempDir::new().unwrap();
        let renderer = CachedRenderer::new(CountingRenderer::default(), tmp.path());

        read_all(renderer.render("src", "png").unwrap());
        read_all(renderer.render("src", "svg").unwrap());

        assert_eq!(renderer.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unwritable_cache_still_renders() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();
        let renderer = CachedRenderer::new(CountingRenderer::default(), blocker.join("cache"));

        assert_eq!(read_all(renderer.render("src", "png").unwrap()), "png|src");
        assert_eq!(read_all(renderer.render("src", "png").unwrap()), "png|src");
        assert_eq!(renderer.inner.calls.load(Ordering::SeqCst), 2);
    }
}
