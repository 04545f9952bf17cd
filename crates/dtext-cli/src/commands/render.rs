//! `dtext render` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{SiteArgs, read_input};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// DText file to render (default: stdin).
    file: Option<PathBuf>,

    /// Print the HTML and extracted references as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    pub site: SiteArgs,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read, or
    /// the input is not valid UTF-8.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let options = self.site.load_options()?;
        let input = read_input(self.file.as_deref())?;
        if input.is_empty() {
            output.warning("Input is empty");
        }

        output.emit(&self.render(&input, &options)?)?;
        Ok(())
    }

    /// Render `input` as HTML, or as JSON when `--json` is set.
    fn render(&self, input: &[u8], options: &dtext::Options) -> Result<String, CliError> {
        let result = dtext::parse_bytes(input, options)?;
        if self.json {
            Ok(serde_json::to_string_pretty(&result)?)
        } else {
            Ok(result.html)
        }
    }
}
