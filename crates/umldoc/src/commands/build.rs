//! `umldoc build` command implementation.

use clap::Args;
use umldoc_scan::run_build;

use super::{SelectionArgs, scanner, start_session};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the source tree cannot be
    /// scanned. Failures writing individual files are counted, not returned.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.selection.load_config()?;

        let session = start_session(&config, &output);
        let summary = run_build(&scanner(&config), session)?;

        output.summary(&summary);
        Ok(())
    }
}
