//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod list;

pub(crate) use build::BuildArgs;
pub(crate) use list::ListArgs;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use umldoc_config::{CliSettings, Config};
use umldoc_diagrams::{BuildSession, CachedRenderer, KrokiRenderer, RenderPort};
use umldoc_scan::Scanner;

use crate::error::CliError;
use crate::output::Output;

/// Flags shared by every command that scans a source tree.
#[derive(Args, Debug, Default)]
pub(crate) struct SelectionArgs {
    /// Path to configuration file (default: auto-discover umldoc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source directory to scan (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Kroki server URL for image rendering (overrides config).
    #[arg(long, env = "UMLDOC_KROKI_URL")]
    kroki_url: Option<String>,

    /// Do not render images.
    #[arg(long)]
    no_images: bool,

    /// Do not write diagram-source files.
    #[arg(long)]
    no_source: bool,

    /// Disable the render cache.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output (show per-file progress logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl SelectionArgs {
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            source_dir: self.source_dir.clone(),
            kroki_url: self.kroki_url.clone(),
            create_diagram_source: self.no_source.then_some(false),
            create_images: self.no_images.then_some(false),
            cache_enabled: self.no_cache.then_some(false),
        }
    }

    /// Load configuration with these flags applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        Ok(Config::load(self.config.as_deref(), Some(&self.cli_settings()))?)
    }
}

/// Scanner over the configured source tree.
pub(crate) fn scanner(config: &Config) -> Scanner {
    Scanner::new(
        config.source_resolved.dir.clone(),
        config.source_resolved.extensions.clone(),
    )
}

/// Renderer for image output, if a Kroki URL is configured.
pub(crate) fn renderer(config: &Config) -> Option<Arc<dyn RenderPort>> {
    let url = config.kroki_resolved.url.as_ref()?;
    let kroki = KrokiRenderer::new(url.as_str()).timeout(config.kroki_resolved.timeout);
    if config.cache_resolved.enabled {
        Some(Arc::new(CachedRenderer::new(kroki, config.cache_resolved.dir.clone())))
    } else {
        Some(Arc::new(kroki))
    }
}

/// Print the resolved inputs and outputs, then open a session.
pub(crate) fn start_session(config: &Config, output: &Output) -> BuildSession {
    let settings = config.settings();

    output.setting("Source", Some(config.source_resolved.dir.display()));
    if let Some(path) = config.config_path.as_deref() {
        output.setting("Config", Some(path.display()));
    }
    output.setting(
        "Diagram sources",
        settings
            .diagram_source_dir()
            .filter(|_| settings.create_diagram_source)
            .map(Path::display),
    );
    output.setting(
        "Images",
        settings.image_dir().filter(|_| settings.create_images).map(Path::display),
    );

    let renderer = if settings.create_images {
        let renderer = renderer(config);
        match (&renderer, &config.kroki_resolved.url) {
            (Some(_), Some(url)) => output.setting("Kroki URL", Some(url)),
            _ => output.unavailable("Image rendering", "no kroki url in config"),
        }
        renderer
    } else {
        None
    };

    BuildSession::new(settings, renderer)
}
