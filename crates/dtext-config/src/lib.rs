//! Site configuration for the DText renderer.
//!
//! Parses `dtext.toml` files with serde and provides auto-discovery of config
//! files in parent directories. The loaded [`Config`] converts into
//! [`dtext::Options`] for each parse.
//!
//! CLI settings can be applied during load via [`CliSettings`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
/// Internal domains given on the command line are added to the configured set.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override site base URL.
    pub base_url: Option<String>,
    /// Override site domain.
    pub domain: Option<String>,
    /// Additional internal domains.
    pub internal_domains: Vec<String>,
    /// Override inline rendering.
    pub inline: Option<bool>,
    /// Override color tag support.
    pub allow_color: Option<bool>,
    /// Override quick tag support.
    pub quick_tags: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "dtext.toml";

/// Renderer configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site the rendered text belongs to.
    pub site: SiteConfig,
    /// Rendering flags.
    pub render: RenderConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Site configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Prefix for site-relative links (e.g., `https://example.com`).
    pub base_url: Option<String>,
    /// The site's own domain.
    pub domain: Option<String>,
    /// Other domains whose links are treated as internal.
    pub internal_domains: Vec<String>,
}

/// Rendering flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render without paragraph wrapping.
    pub inline: bool,
    /// Render `[color]` tags.
    pub allow_color: bool,
    /// Recognize `{{tag}}` quick tags.
    pub quick_tags: bool,
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
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Reject strings the renderer refuses to accept.
fn require_no_null(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.contains('\0') {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain a null byte"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `dtext.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_url) = &settings.base_url {
            self.site.base_url = Some(base_url.clone());
        }
        if let Some(domain) = &settings.domain {
            self.site.domain = Some(domain.clone());
        }
        for domain in &settings.internal_domains {
            if !self.site.internal_domains.contains(domain) {
                self.site.internal_domains.push(domain.clone());
            }
        }
        if let Some(inline) = settings.inline {
            self.render.inline = inline;
        }
        if let Some(allow_color) = settings.allow_color {
            self.render.allow_color = allow_color;
        }
        if let Some(quick_tags) = settings.quick_tags {
            self.render.quick_tags = quick_tags;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_config_from(current)
    }

    fn discover_config_from(mut current: PathBuf) -> Option<PathBuf> {
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

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after applying CLI
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.site.base_url {
            require_non_empty(base_url, "site.base_url")?;
            require_http_url(base_url, "site.base_url")?;
            require_no_null(base_url, "site.base_url")?;
        }
        if let Some(domain) = &self.site.domain {
            require_non_empty(domain, "site.domain")?;
            require_no_null(domain, "site.domain")?;
        }
        for domain in &self.site.internal_domains {
            require_non_empty(domain, "site.internal_domains")?;
            require_no_null(domain, "site.internal_domains")?;
        }
        Ok(())
    }

    /// Renderer options for this configuration.
    #[must_use]
    pub fn options(&self) -> dtext::Options {
        dtext::Options {
            base_url: self.site.base_url.clone(),
            domain: self.site.domain.clone(),
            internal_domains: self
                .site
                .internal_domains
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>(),
            inline_mode: self.render.inline,
            allow_color: self.render.allow_color,
            allow_quick_tags: self.render.quick_tags,
        }
    }
}
