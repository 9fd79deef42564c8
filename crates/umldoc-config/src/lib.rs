//! Configuration management for umldoc.
//!
//! Two layers live here:
//!
//! - [`Settings`]: the immutable diagram output settings, resolved from a
//!   nested host options structure with [`Settings::resolve`]. Resolution
//!   never fails; wrong-typed values fall back to defaults.
//! - [`Config`]: the `umldoc.toml` file used by the command-line host. Its
//!   `[plantuml]` table is handed to [`Settings::resolve`] unchanged, the
//!   other sections configure scanning, Kroki rendering and the render cache.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! These string values support `${VAR}` and `${VAR:-default}`:
//! - `plantuml.puml.destination`
//! - `plantuml.images.destination`
//! - `kroki.url`
//! - `cache.dir`

mod expand;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub use settings::{
    DEFAULT_DIAGRAM_SOURCE_DIR, DEFAULT_IMAGE_DIR, DEFAULT_IMAGE_FORMAT, Settings, absolute_path,
    is_valid_image_format, normalize_path,
};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "umldoc.toml";

/// File extensions scanned for documentation comments by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "js", "mjs", "cjs", "jsx", "ts", "tsx", "java", "rs", "c", "h", "cpp", "hpp", "cs", "kt",
    "swift",
];

/// Default HTTP timeout for Kroki requests in seconds.
const DEFAULT_KROKI_TIMEOUT_SECS: u64 = 30;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override source directory to scan.
    pub source_dir: Option<PathBuf>,
    /// Override Kroki URL.
    pub kroki_url: Option<String>,
    /// Override `plantuml.puml.create`.
    pub create_diagram_source: Option<bool>,
    /// Override `plantuml.images.create`.
    pub create_images: Option<bool>,
    /// Override render cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Command-line host configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagram options, passed as-is to [`Settings::resolve`].
    plantuml: Option<toml::Value>,
    /// Source scanning configuration (paths are relative strings from TOML).
    source: SourceConfigRaw,
    /// Kroki rendering configuration (optional section).
    kroki: Option<KrokiConfigRaw>,
    /// Render cache configuration.
    cache: CacheConfigRaw,

    /// Resolved source configuration (set after loading).
    #[serde(skip)]
    pub source_resolved: SourceConfig,
    /// Resolved Kroki configuration (set after loading).
    #[serde(skip)]
    pub kroki_resolved: KrokiConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Directory relative output destinations are anchored at.
    #[serde(skip)]
    pub working_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
    /// Output toggles forced from the command line.
    #[serde(skip)]
    output_overrides: OutputOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."), Path::new("."))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct OutputOverrides {
    create_diagram_source: Option<bool>,
    create_images: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceConfigRaw {
    dir: Option<String>,
    extensions: Option<Vec<String>>,
}

/// Resolved source scanning configuration.
#[derive(Debug, Default)]
pub struct SourceConfig {
    /// Root directory to scan.
    pub dir: PathBuf,
    /// File extensions (without dot) that are scanned.
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KrokiConfigRaw {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Resolved Kroki rendering configuration.
#[derive(Debug)]
pub struct KrokiConfig {
    /// Kroki server URL; `None` disables image rendering.
    pub url: Option<String>,
    /// HTTP timeout for Kroki requests.
    pub timeout: Duration,
}

impl Default for KrokiConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(DEFAULT_KROKI_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
}

/// Resolved render cache configuration.
#[derive(Debug, Default)]
pub struct CacheConfig {
    /// Whether rendered images are cached between runs.
    pub enabled: bool,
    /// Cache directory.
    pub dir: PathBuf,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`kroki.url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `umldoc.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// Source and cache paths are resolved against the config file's
    /// directory. Diagram output destinations are resolved against the
    /// current working directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir()?;
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path, &cwd)?
        } else if let Some(discovered) = discover_config(&cwd) {
            Self::load_from_file(&discovered, &cwd)?
        } else {
            Self::default_with_base(&cwd, &cwd)
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Diagram output settings for a build session.
    ///
    /// Resolves the `[plantuml]` table against [`Self::working_dir`], then
    /// applies output toggles given on the command line.
    #[must_use]
    pub fn settings(&self) -> Settings {
        let options = self
            .plantuml
            .as_ref()
            .and_then(|value| serde_json::to_value(value).ok());
        let mut settings = Settings::resolve(options.as_ref(), &self.working_dir);
        if let Some(create) = self.output_overrides.create_diagram_source {
            settings.create_diagram_source = create;
        }
        if let Some(create) = self.output_overrides.create_images {
            settings.create_images = create;
        }
        settings
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.source_resolved.dir = absolute_path(&self.working_dir, source_dir);
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.kroki_resolved.url = Some(kroki_url.clone());
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
        if settings.create_diagram_source.is_some() {
            self.output_overrides.create_diagram_source = settings.create_diagram_source;
        }
        if settings.create_images.is_some() {
            self.output_overrides.create_images = settings.create_images;
        }
    }

    /// Create default config anchored at the given directories.
    fn default_with_base(config_dir: &Path, working_dir: &Path) -> Self {
        Self {
            plantuml: None,
            source: SourceConfigRaw::default(),
            kroki: None,
            cache: CacheConfigRaw::default(),
            source_resolved: SourceConfig {
                dir: normalize_path(config_dir),
                extensions: default_extensions(),
            },
            kroki_resolved: KrokiConfig::default(),
            cache_resolved: CacheConfig {
                enabled: true,
                dir: absolute_path(config_dir, ".umldoc/cache"),
            },
            working_dir: working_dir.to_path_buf(),
            config_path: None,
            output_overrides: OutputOverrides::default(),
        }
    }

    fn load_from_file(path: &Path, working_dir: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let config_dir = absolute_path(working_dir, config_dir);
        config.working_dir = working_dir.to_path_buf();
        config.resolve_paths(&config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.kroki_resolved.url {
            require_non_empty(url, "kroki.url")?;
            require_http_url(url, "kroki.url")?;
        }
        if self.kroki_resolved.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "kroki.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if self.source_resolved.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "source.extensions cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(plantuml) = self.plantuml.as_mut() {
            for section in ["puml", "images"] {
                if let Some(toml::Value::String(destination)) = plantuml
                    .get_mut(section)
                    .and_then(|s| s.get_mut("destination"))
                {
                    expand::expand_in_place(destination, &format!("plantuml.{section}.destination"))?;
                }
            }
        }

        if let Some(url) = self.kroki.as_mut().and_then(|k| k.url.as_mut()) {
            expand::expand_in_place(url, "kroki.url")?;
        }

        if let Some(dir) = self.cache.dir.as_mut() {
            expand::expand_in_place(dir, "cache.dir")?;
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.source_resolved = SourceConfig {
            dir: absolute_path(config_dir, self.source.dir.as_deref().unwrap_or(".")),
            extensions: self
                .source
                .extensions
                .as_ref()
                .map_or_else(default_extensions, |exts| {
                    exts.iter()
                        .map(|e| e.trim_start_matches('.').to_lowercase())
                        .collect()
                }),
        };

        self.kroki_resolved = match &self.kroki {
            Some(kroki) => KrokiConfig {
                url: kroki.url.clone(),
                timeout: Duration::from_secs(
                    kroki.timeout_secs.unwrap_or(DEFAULT_KROKI_TIMEOUT_SECS),
                ),
            },
            None => KrokiConfig::default(),
        };

        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: absolute_path(
                config_dir,
                self.cache.dir.as_deref().unwrap_or(".umldoc/cache"),
            ),
        };
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|&e| e.to_owned()).collect()
}

/// Search for config file in `start` and its parents.
fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(toml: &str) -> Config {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.working_dir = PathBuf::from("/work");
        config.resolve_paths(Path::new("/project"));
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/project"), Path::new("/work"));
        assert_eq!(config.source_resolved.dir, PathBuf::from("/project"));
        assert_eq!(config.source_resolved.extensions, default_extensions());
        assert!(config.kroki_resolved.url.is_none());
        assert_eq!(config.kroki_resolved.timeout, Duration::from_secs(30));
        assert!(config.cache_resolved.enabled);
        assert_eq!(
            config.cache_resolved.dir,
            PathBuf::from("/project/.umldoc/cache")
        );
        assert_eq!(config.settings(), Settings::default_with_base(Path::new("/work")));
    }

    #[test]
    fn test_plantuml_section_resolves_settings() {
        let config = parse(
            r#"
[plantuml.puml]
destination = "docs/puml"

[plantuml.images]
create = false
defaultFormat = "svg"
"#,
        );
        let settings = config.settings();
        assert_eq!(
            settings.diagram_source_dir(),
            Some(Path::new("/work/docs/puml"))
        );
        assert!(!settings.create_images);
        assert_eq!(settings.default_image_format, "svg");
    }

    #[test]
    fn test_plantuml_wrong_types_use_defaults() {
        let config = parse(
            r#"
[plantuml.puml]
create = "false"

[plantuml.images]
destination = 12
"#,
        );
        assert_eq!(config.settings(), Settings::default_with_base(Path::new("/work")));
    }

    #[test]
    fn test_resolve_paths() {
        let config = parse(
            r#"
[source]
dir = "src"
extensions = [".JS", "ts"]

[kroki]
url = "https://kroki.io"
timeout_secs = 5

[cache]
enabled = false
dir = "tmp/cache"
"#,
        );
        assert_eq!(config.source_resolved.dir, PathBuf::from("/project/src"));
        assert_eq!(config.source_resolved.extensions, vec!["js", "ts"]);
        assert_eq!(
            config.kroki_resolved.url,
            Some("https://kroki.io".to_owned())
        );
        assert_eq!(config.kroki_resolved.timeout, Duration::from_secs(5));
        assert!(!config.cache_resolved.enabled);
        assert_eq!(
            config.cache_resolved.dir,
            PathBuf::from("/project/tmp/cache")
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/project"), Path::new("/work"));
        config.apply_cli_settings(&CliSettings {
            source_dir: Some(PathBuf::from("lib")),
            kroki_url: Some("http://localhost:8000".to_owned()),
            create_diagram_source: None,
            create_images: Some(false),
            cache_enabled: Some(false),
        });

        assert_eq!(config.source_resolved.dir, PathBuf::from("/work/lib"));
        assert_eq!(
            config.kroki_resolved.url,
            Some("http://localhost:8000".to_owned())
        );
        assert!(!config.cache_resolved.enabled);
        let settings = config.settings();
        assert!(!settings.create_images);
        assert!(settings.create_diagram_source);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/project"), Path::new("/work"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.source_resolved.dir, PathBuf::from("/project"));
        assert!(config.kroki_resolved.url.is_none());
        assert_eq!(config.settings(), Settings::default_with_base(Path::new("/work")));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("UMLDOC_CFG_KROKI", "https://kroki.test");
            std::env::set_var("UMLDOC_CFG_OUT", "/out");
        }

        let mut config: Config = toml::from_str(
            r#"
[plantuml.images]
destination = "${UMLDOC_CFG_OUT}/images"

[kroki]
url = "${UMLDOC_CFG_KROKI}"
"#,
        )
        .unwrap();
        config.expand_env_vars().unwrap();
        config.working_dir = PathBuf::from("/work");
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.kroki_resolved.url,
            Some("https://kroki.test".to_owned())
        );
        assert_eq!(config.settings().image_dir(), Some(Path::new("/out/images")));

        unsafe {
            std::env::remove_var("UMLDOC_CFG_KROKI");
            std::env::remove_var("UMLDOC_CFG_OUT");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("UMLDOC_CFG_MISSING");
        }
        let mut config: Config = toml::from_str(
            r#"
[plantuml.puml]
destination = "${UMLDOC_CFG_MISSING}"
"#,
        )
        .unwrap();
        let err = config.expand_env_vars().unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("plantuml.puml.destination"));
    }

    #[test]
    fn test_validate_kroki_url_scheme() {
        let mut config = Config::default_with_base(Path::new("/project"), Path::new("/work"));
        config.kroki_resolved.url = Some("ftp://kroki.io".to_owned());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("kroki.url"));
        assert!(err.to_string().contains("http"));

        config.kroki_resolved.url = Some(String::new());
        assert!(config.validate().unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_timeout_zero() {
        let mut config = Config::default_with_base(Path::new("/project"), Path::new("/work"));
        config.kroki_resolved.timeout = Duration::ZERO;
        assert!(config.validate().unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("umldoc.toml");
        std::fs::write(&path, "[source]\ndir = \"lib\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.source_resolved.dir, tmp.path().join("lib"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/umldoc.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            discover_config(&nested),
            Some(tmp.path().join(CONFIG_FILENAME))
        );
    }
}
