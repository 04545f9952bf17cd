//! Error types reported to the host.
//!
//! Malformed markup is never an error: the engine renders it as text. Only
//! invalid input and engine faults surface here.

/// Error returned by the parse entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Input bytes are not valid UTF-8.
    #[error("input contains invalid UTF-8")]
    InvalidUtf8,
    /// Input text contains a null byte.
    #[error("input contains null byte")]
    NullByte,
    /// A configuration string contains a null byte.
    #[error("{field} contains null byte")]
    OptionNullByte {
        /// Option name (e.g., "`base_url`").
        field: &'static str,
    },
    /// Unexpected engine fault.
    #[error("internal parse error: {0}")]
    Internal(String),
}
