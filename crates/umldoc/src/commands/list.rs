//! `umldoc list` command implementation.

use clap::Args;
use umldoc_scan::register_all;

use super::{SelectionArgs, scanner, start_session};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

impl ListArgs {
    /// Execute the list command.
    ///
    /// Scans and registers annotations, prints each registered tag and exits
    /// without writing any files.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.selection.load_config()?;

        let mut session = start_session(&config, &output);
        register_all(&scanner(&config), &mut session)?;

        for (_, tag) in session.registry().iter() {
            output.tag(tag);
        }
        output.registered(session.registry().len());
        Ok(())
    }
}
