//! CLI command implementations.

pub(crate) mod links;
pub(crate) mod render;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use dtext_config::{CliSettings, Config};

use crate::error::CliError;

pub(crate) use links::LinksArgs;
pub(crate) use render::RenderArgs;

/// Site and rendering options shared by all commands.
#[derive(Args)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover dtext.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL for site-relative links (overrides config).
    #[arg(long, env = "DTEXT_BASE_URL")]
    base_url: Option<String>,

    /// The site's own domain (overrides config).
    #[arg(long)]
    domain: Option<String>,

    /// Additional domain treated as internal (repeatable).
    #[arg(long = "internal-domain", value_name = "DOMAIN")]
    internal_domains: Vec<String>,

    /// Render without paragraph wrapping.
    #[arg(long)]
    inline: bool,

    /// Render [color] tags.
    #[arg(long)]
    allow_color: bool,

    /// Recognize {{tag}} quick tags.
    #[arg(long)]
    quick_tags: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SiteArgs {
    /// Load configuration with these arguments applied on top.
    fn load_options(&self) -> Result<dtext::Options, CliError> {
        let cli_settings = CliSettings {
            base_url: self.base_url.clone(),
            domain: self.domain.clone(),
            internal_domains: self.internal_domains.clone(),
            inline: self.inline.then_some(true),
            allow_color: self.allow_color.then_some(true),
            quick_tags: self.quick_tags.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }
        Ok(config.options())
    }
}

/// Read input bytes from a file, or stdin when no file is given.
fn read_input(file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin().lock().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}
