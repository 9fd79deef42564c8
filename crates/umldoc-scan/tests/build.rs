//! End-to-end builds over a temporary source tree.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use umldoc_config::Settings;
use umldoc_diagrams::{BuildSession, EmitSummary, MockRenderer, SourceLocation, TagOutcome};
use umldoc_scan::{Scanner, register_all, run_build};

const ORDERS_JS: &str = r"'use strict';

/**
  Order service with a class-level diagram.

  @startuml orders-overview.png
  note right: orders overview
  @enduml

  This one has no name and is skipped.

  @startuml
  note left: unnamed
  @enduml
*/

/** Place an order.
 * @startuml place-order.svg
 * Client -> Orders: place
 * @enduml
 */
function placeOrder() {}
";

const LEDGER_RS: &str = r"/// Ledger entry flow.
///
/// @startuml ledger.puml
/// Ledger -> Store: append
/// @enduml
pub fn append() {}
";

fn settings(out: &Path) -> Settings {
    Settings {
        diagram_source_dir: Some(out.join("puml")),
        image_dir: Some(out.join("images")),
        ..Settings::default_with_base(out)
    }
}

fn write_tree(root: &Path) {
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/orders.js"), ORDERS_JS).unwrap();
    fs::write(root.join("src/ledger.rs"), LEDGER_RS).unwrap();
}

fn scanner(root: &Path) -> Scanner {
    Scanner::new(root.join("src"), vec!["js".to_owned(), "rs".to_owned()])
}

#[test]
fn test_build_writes_sources_and_images() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    write_tree(tmp.path());
    let renderer = Arc::new(MockRenderer::new());

    let summary = run_build(
        &scanner(tmp.path()),
        BuildSession::new(settings(&out), Some(renderer.clone())),
    )
    .unwrap();

    assert_eq!(
        summary,
        EmitSummary {
            tags: 3,
            sources_written: 3,
            images_written: 3,
            failures: 0,
        }
    );
    assert_eq!(
        fs::read_to_string(out.join("puml/orders-overview.puml")).unwrap(),
        "@startuml\nnote right: orders overview\n@enduml"
    );
    assert_eq!(
        fs::read_to_string(out.join("puml/place-order.puml")).unwrap(),
        "@startuml\nClient -> Orders: place\n@enduml"
    );
    assert_eq!(
        fs::read_to_string(out.join("images/place-order.svg")).unwrap(),
        "svg\n@startuml\nClient -> Orders: place\n@enduml"
    );
    assert!(out.join("puml/ledger.puml").exists());
    assert!(out.join("images/ledger.png").exists());
    assert_eq!(renderer.initializations(), 1);
    assert_eq!(renderer.renders().len(), 3);
}

#[test]
fn test_list_registers_without_writing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    write_tree(tmp.path());
    let mut session = BuildSession::new(settings(&out), None);

    let outcomes = register_all(&scanner(tmp.path()), &mut session).unwrap();

    assert_eq!(session.registry().len(), 3);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, TagOutcome::Skipped))
            .count(),
        2
    );
    assert!(!out.exists());
}

#[test]
fn test_duplicate_across_files_keeps_first_in_walk_order() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    let src = tmp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("b.js"),
        "/**\n * @startuml shared.png\n * B -> B\n * @enduml\n */\n",
    )
    .unwrap();
    fs::write(
        src.join("a.js"),
        "/**\n * @startuml shared.png\n * A -> A\n * @enduml\n */\n",
    )
    .unwrap();
    let mut session = BuildSession::new(settings(&out), None);

    let outcomes = register_all(&scanner(tmp.path()), &mut session).unwrap();

    assert_eq!(
        outcomes[1],
        TagOutcome::Duplicate {
            path: out.join("puml/shared.puml"),
            existing: SourceLocation::new("a.js", 2),
        }
    );
    let summary = session.on_processing_complete();
    assert_eq!(summary.sources_written, 1);
    assert_eq!(
        fs::read_to_string(out.join("puml/shared.puml")).unwrap(),
        "@startuml\nA -> A\n@enduml"
    );
}

#[test]
fn test_failed_renderer_still_writes_sources() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    write_tree(tmp.path());
    let renderer = Arc::new(MockRenderer::new().failing_initialize());

    let summary = run_build(
        &scanner(tmp.path()),
        BuildSession::new(settings(&out), Some(renderer.clone())),
    )
    .unwrap();

    assert_eq!(summary.sources_written, 3);
    assert_eq!(summary.images_written, 0);
    assert!(!out.join("images").exists());
    assert!(renderer.renders().is_empty());
}

#[test]
fn test_render_failures_are_counted() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    write_tree(tmp.path());
    let renderer = Arc::new(MockRenderer::new().failing_render());

    let summary = run_build(
        &scanner(tmp.path()),
        BuildSession::new(settings(&out), Some(renderer)),
    )
    .unwrap();

    assert_eq!(summary.sources_written, 3);
    assert_eq!(summary.failures, 3);
    assert!(!out.join("images/ledger.png").exists());
}
