//! Input validation performed before the engine runs.

use crate::error::Error;
use crate::options::Options;

/// Decode raw bytes as UTF-8 and reject embedded null bytes.
///
/// US-ASCII input is accepted since it is a subset of UTF-8.
pub fn validate_bytes(bytes: &[u8]) -> Result<&str, Error> {
    let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
    validate_text(text)?;
    Ok(text)
}

/// Reject text containing a null byte.
pub fn validate_text(text: &str) -> Result<(), Error> {
    if text.as_bytes().contains(&0) {
        return Err(Error::NullByte);
    }
    Ok(())
}

/// Reject configuration strings containing a null byte.
pub fn validate_options(options: &Options) -> Result<(), Error> {
    require_no_null(options.base_url.as_deref(), "base_url")?;
    require_no_null(options.domain.as_deref(), "domain")?;
    for domain in &options.internal_domains {
        require_no_null(Some(domain), "internal_domains")?;
    }
    Ok(())
}

fn require_no_null(value: Option<&str>, field: &'static str) -> Result<(), Error> {
    match value {
        Some(value) if value.as_bytes().contains(&0) => Err(Error::OptionNullByte { field }),
        _ => Ok(()),
    }
}
