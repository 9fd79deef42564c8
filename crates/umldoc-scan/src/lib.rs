//! Source-tree host for umldoc.
//!
//! Walks a source tree, parses documentation comments and reports every
//! `@startuml` block to a [`BuildSession`] the way a documentation generator
//! would: once when the comment is parsed, and once more when it is bound to
//! the code that follows it.
//!
//! ```ignore
//! let scanner = Scanner::new("src", vec!["js".to_owned()]);
//! let summary = run_build(&scanner, BuildSession::new(settings, renderer))?;
//! ```

mod doclet;
mod error;
mod scanner;

use umldoc_diagrams::{AnnotationContext, Binding, BuildSession, EmitSummary, TagOutcome};

pub use doclet::{Doclet, extract_annotations, parse_doclets};
pub use error::ScanError;
pub use scanner::Scanner;

/// Report every annotation in `doclets` to `session`.
///
/// All annotations are reported unbound first; annotations in doclets that
/// precede code are then reported a second time as bound. Returns the outcome
/// of each notification in order.
pub fn dispatch(session: &mut BuildSession, doclets: &[Doclet]) -> Vec<TagOutcome> {
    let annotations: Vec<(bool, AnnotationContext)> = doclets
        .iter()
        .flat_map(|d| extract_annotations(d).into_iter().map(move |a| (d.bound, a)))
        .collect();

    let mut outcomes: Vec<TagOutcome> = annotations
        .iter()
        .map(|(_, ctx)| session.on_annotation_tagged(ctx))
        .collect();

    for (_, ctx) in annotations.into_iter().filter(|(bound, _)| *bound) {
        let ctx = AnnotationContext {
            binding: Binding::Bound,
            ..ctx
        };
        outcomes.push(session.on_annotation_tagged(&ctx));
    }

    outcomes
}

/// Scan the tree and register its annotations without writing anything.
pub fn register_all(scanner: &Scanner, session: &mut BuildSession) -> Result<Vec<TagOutcome>, ScanError> {
    let doclets = scanner.scan()?;
    tracing::debug!(doclets = doclets.len(), "Parsed doc comments");
    Ok(dispatch(session, &doclets))
}

/// Run a complete build: parse-begin, scan, then processing-complete.
pub fn run_build(scanner: &Scanner, mut session: BuildSession) -> Result<EmitSummary, ScanError> {
    session.on_parse_begin();
    register_all(scanner, &mut session)?;
    Ok(session.on_processing_complete())
}
