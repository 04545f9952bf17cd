//! `dtext links` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{SiteArgs, read_input};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the links command.
#[derive(Args)]
pub(crate) struct LinksArgs {
    /// DText file to inspect (default: stdin).
    file: Option<PathBuf>,

    /// Previous revision to compare creator and external links against.
    #[arg(long, value_name = "FILE")]
    previous: Option<PathBuf>,

    #[command(flatten)]
    pub site: SiteArgs,
}

/// Links referenced by the current revision.
#[derive(Debug, PartialEq)]
struct LinksReport {
    creators: Vec<String>,
    external_links: Vec<String>,
    /// Whether links changed, when a previous revision was given.
    changed: Option<bool>,
}

impl LinksArgs {
    /// Execute the links command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or either input cannot be read.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let options = self.site.load_options()?;
        let input = read_input(self.file.as_deref())?;
        let report = self.collect(&input, &options)?;

        output.highlight("Creators");
        for creator in &report.creators {
            output.emit(creator)?;
        }
        output.highlight("External links");
        for link in &report.external_links {
            output.emit(link)?;
        }

        match report.changed {
            Some(true) => output.warning("Links changed since previous revision"),
            Some(false) => output.info("Links unchanged since previous revision"),
            None => {}
        }
        Ok(())
    }

    fn collect(&self, input: &[u8], options: &dtext::Options) -> Result<LinksReport, CliError> {
        let current = dtext::validate_bytes(input)?;
        let result = dtext::parse(current, options)?;

        let changed = match &self.previous {
            Some(previous) => {
                let previous = std::fs::read(previous)?;
                let previous = dtext::validate_bytes(&previous)?;
                Some(dtext::links_differ(previous, current, options)?)
            }
            None => None,
        };
        Ok(LinksReport {
            creators: result.creators,
            external_links: result.external_links,
            changed,
        })
    }
}
