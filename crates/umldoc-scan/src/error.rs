//! Scanner error types.

use std::io;
use std::path::PathBuf;

/// Error scanning a source tree.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}
