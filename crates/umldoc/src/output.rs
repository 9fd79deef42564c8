//! Terminal reporting for umldoc commands.
//!
//! Session settings, summaries and errors go to stderr. `list` rows go to
//! stdout so they can be piped.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};
use umldoc_diagrams::{DiagramTag, EmitSummary};

pub(crate) struct Output {
    stderr: Term,
    stdout: Term,
    dim: Style,
    green: Style,
    yellow: Style,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            stderr: Term::stderr(),
            stdout: Term::stdout(),
            dim: Style::new().dim(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
        }
    }

    /// `label: value`, or a dimmed `label: disabled` when `value` is `None`.
    pub(crate) fn setting(&self, label: &str, value: Option<impl Display>) {
        let line = match value {
            Some(value) => format!("{label}: {value}"),
            None => format!("{label}: {}", self.dim.apply_to("disabled")),
        };
        let _ = self.stderr.write_line(&line);
    }

    /// A setting that is on but cannot take effect.
    pub(crate) fn unavailable(&self, label: &str, reason: &str) {
        let line = format!("{label}: unavailable ({reason})");
        let _ = self.stderr.write_line(&self.yellow.apply_to(line).to_string());
    }

    /// Build totals, green when every write succeeded.
    pub(crate) fn summary(&self, summary: &EmitSummary) {
        let style = if summary.failures == 0 { &self.green } else { &self.yellow };
        let _ = self
            .stderr
            .write_line(&style.apply_to(summary_line(summary)).to_string());
    }

    /// One registered tag per stdout row.
    pub(crate) fn tag(&self, tag: &DiagramTag) {
        let _ = self.stdout.write_line(&describe(tag));
    }

    pub(crate) fn registered(&self, count: usize) {
        let _ = self.stderr.write_line(&format!("{count} diagrams registered"));
    }

    pub(crate) fn error(&self, err: &dyn Display) {
        let _ = self
            .stderr
            .write_line(&self.red.apply_to(format!("Error: {err}")).to_string());
    }
}

fn summary_line(summary: &EmitSummary) -> String {
    format!(
        "{} diagrams, {} sources written, {} images written, {} failures",
        summary.tags, summary.sources_written, summary.images_written, summary.failures
    )
}

fn describe(tag: &DiagramTag) -> String {
    let path = |p: Option<&Path>| p.map_or_else(|| "-".to_owned(), |p| p.display().to_string());
    format!(
        "{} -> {} | {} ({})",
        tag.location(),
        path(tag.output_diagram_path()),
        path(tag.output_image_path()),
        tag.image_format().unwrap_or("-"),
    )
}
