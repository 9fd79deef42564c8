//! CLI error types.

use umldoc_config::ConfigError;
use umldoc_scan::ScanError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Scan(#[from] ScanError),
}
