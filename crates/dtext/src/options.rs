//! Parse options supplied by the host.

use std::collections::BTreeSet;

/// Per-call configuration for the DText engine.
///
/// Options are read-only for the duration of a parse, so a single value can be
/// shared across threads parsing independent inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Options {
    /// Prefix for site-relative links (e.g., `https://example.com`).
    pub base_url: Option<String>,
    /// The site's own domain; absolute links to it are internal.
    pub domain: Option<String>,
    /// Additional domains treated as internal.
    pub internal_domains: BTreeSet<String>,
    /// Omit paragraph wrapping; newlines become `<br>`.
    pub inline_mode: bool,
    /// Render `[color]` tags.
    pub allow_color: bool,
    /// Recognize `{{tag}}` quick tag references.
    pub allow_quick_tags: bool,
}

impl Options {
    /// Create options with every flag disabled and no domain configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL used to resolve site-relative links.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the site's own domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Add a domain treated as internal.
    #[must_use]
    pub fn with_internal_domain(mut self, domain: impl Into<String>) -> Self {
        self.internal_domains.insert(domain.into());
        self
    }

    /// Enable or disable inline mode.
    #[must_use]
    pub fn inline(mut self, enabled: bool) -> Self {
        self.inline_mode = enabled;
        self
    }

    /// Enable or disable `[color]` tags.
    #[must_use]
    pub fn allow_color(mut self, enabled: bool) -> Self {
        self.allow_color = enabled;
        self
    }

    /// Enable or disable `{{tag}}` quick tags.
    #[must_use]
    pub fn allow_quick_tags(mut self, enabled: bool) -> Self {
        self.allow_quick_tags = enabled;
        self
    }
}
