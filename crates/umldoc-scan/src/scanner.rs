//! Source file discovery by filesystem walking.
//!
//! The walk honors `.gitignore`, skips hidden entries and visits entries in
//! file-name order, so the first annotation to claim an output path is the
//! same on every run.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::doclet::{Doclet, parse_doclets};
use crate::error::ScanError;

/// Finds source files and parses their doc comments.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl Scanner {
    /// Create a scanner for files under `root` with one of `extensions`
    /// (without leading dot, matched case-insensitively).
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    /// Root directory being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source files under the root, in walk order.
    pub fn files(&self) -> Result<Vec<PathBuf>, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::SourceNotFound(self.root.clone()));
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_some_and(|t| t.is_file()) && self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        tracing::debug!(root = %self.root.display(), files = files.len(), "Scanned source tree");
        Ok(files)
    }

    /// Parse doc comments from every source file.
    ///
    /// Files are read in parallel; the result keeps walk order. Doclet file
    /// paths are relative to the root.
    pub fn scan(&self) -> Result<Vec<Doclet>, ScanError> {
        let files = self.files()?;
        let per_file: Vec<Vec<Doclet>> = files
            .par_iter()
            .map(|path| self.parse_file(path))
            .collect::<Result<_, _>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<Doclet>, ScanError> {
        let bytes = fs::read(path).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        Ok(parse_doclets(&text, relative))
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}
