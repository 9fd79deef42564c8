//! Internal constants for diagram routing and rendering.

use std::time::Duration;

/// Line that opens every stored diagram description.
pub const START_MARKER: &str = "@startuml";

/// Line that closes every stored diagram description.
pub const END_MARKER: &str = "@enduml";

/// Extension of emitted diagram-source files.
pub const DIAGRAM_SOURCE_EXTENSION: &str = "puml";

/// Declared-name extensions that name a rendered image directly.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "svg", "eps"];

/// Declared-name extensions that name a diagram-source file directly.
pub const DIAGRAM_SOURCE_EXTENSIONS: &[&str] = &["puml", "plantuml", "pu", "wsd"];

/// Kroki endpoint for `PlantUML` diagrams.
pub const KROKI_ENDPOINT: &str = "plantuml";

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
