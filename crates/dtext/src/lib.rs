//! DText markup renderer with reference extraction.
//!
//! This crate converts DText, the bulletin-board style markup used by
//! booru-style image sites, into sanitized HTML. While rendering it collects
//! the creator mentions, post references and tag references the text makes.
//!
//! # Architecture
//!
//! Rendering is a single pass:
//! - the scanner turns source text into tokens, leaving malformed syntax as text;
//! - the state machine keeps a stack of open constructs and writes HTML;
//! - the link resolver classifies link targets as internal or external;
//! - a [`ReferenceSink`] observes every reference as it is rendered.
//!
//! Every element is opened through the stack and the stack is emptied at the
//! end of input, so the output never contains crossed or unterminated tags.
//!
//! # Example
//!
//! ```
//! use dtext::{Options, parse};
//!
//! let options = Options::new().with_base_url("https://example.com");
//! let result = parse("[b]hello[/b] post #42", &options).unwrap();
//!
//! assert!(result.html.starts_with("<p><strong>hello</strong>"));
//! assert_eq!(result.post_ids, vec![42]);
//! ```

use std::collections::HashSet;

mod closers;
mod construct;
mod error;
mod html;
mod links;
mod machine;
mod options;
mod output;
mod references;
mod scanner;
mod stack;
mod util;
mod validate;

pub use error::Error;
pub use html::escape_html;
pub use links::{LinkResolver, ResolvedLink};
pub use options::Options;
pub use references::{ParseResult, ReferenceSink, References};
pub use util::normalize_tag_name;
pub use validate::{validate_bytes, validate_options, validate_text};

/// Render DText to HTML and collect its references.
///
/// # Errors
///
/// Returns an error if the text or a configuration string contains a null
/// byte. Malformed markup is rendered as text and never fails.
pub fn parse(text: &str, options: &Options) -> Result<ParseResult, Error> {
    let mut references = References::new();
    let html = render_into(text, options, &mut references)?;
    let result = references.into_result(html);
    tracing::debug!(
        input_len = text.len(),
        html_len = result.html.len(),
        creators = result.creators.len(),
        post_ids = result.post_ids.len(),
        qtags = result.qtags.len(),
        "Rendered DText"
    );
    Ok(result)
}

/// Render DText given as raw bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidUtf8`] if the bytes are not UTF-8, plus the
/// errors of [`parse`].
pub fn parse_bytes(bytes: &[u8], options: &Options) -> Result<ParseResult, Error> {
    parse(validate_bytes(bytes)?, options)
}

/// Render optional DText; absent input yields `Ok(None)`.
///
/// # Errors
///
/// Returns the errors of [`parse`].
pub fn parse_optional(
    text: Option<&str>,
    options: &Options,
) -> Result<Option<ParseResult>, Error> {
    text.map(|text| parse(text, options)).transpose()
}

/// Render DText, reporting references to a caller-provided sink.
///
/// # Errors
///
/// Returns the errors of [`parse`].
pub fn render_into<R: ReferenceSink>(
    text: &str,
    options: &Options,
    sink: &mut R,
) -> Result<String, Error> {
    validate_text(text)?;
    validate_options(options)?;
    machine::render(text, options, sink)
}

/// Whether two revisions of a text link to different creators or external sites.
///
/// # Errors
///
/// Returns the errors of [`parse`] for either revision.
pub fn links_differ(old: &str, new: &str, options: &Options) -> Result<bool, Error> {
    let old = parse(old, options)?;
    let new = parse(new, options)?;
    Ok(!same_set(&old.creators, &new.creators)
        || !same_set(&old.external_links, &new.external_links))
}

fn same_set(a: &[String], b: &[String]) -> bool {
    a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}
