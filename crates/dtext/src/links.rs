//! Link target resolution and classification.
//!
//! Decides where a link points, whether it stays on the site, and builds the
//! site paths used by tag, mention and id links.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};
use url::Url;

use crate::options::Options;

/// Unreserved path characters: A-Z a-z 0-9 - . _ ~
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single path segment.
pub(crate) fn encode_path_segment(segment: &str) -> String {
    percent_encode(segment.as_bytes(), PATH_SEGMENT).to_string()
}

/// A link target after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Final `href` value, unescaped.
    pub href: String,
    /// Whether the target is on the site or one of its trusted domains.
    pub internal: bool,
}

impl ResolvedLink {
    fn internal(href: String) -> Self {
        Self {
            href,
            internal: true,
        }
    }
}

/// Resolves link targets against the site configuration.
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'o> {
    base_url: &'o str,
    options: &'o Options,
}

impl<'o> LinkResolver<'o> {
    #[must_use]
    pub fn new(options: &'o Options) -> Self {
        let base_url = options
            .base_url
            .as_deref()
            .map_or("", |base| base.trim_end_matches('/'));
        Self { base_url, options }
    }

    /// Resolve a link target.
    ///
    /// Returns `None` for targets that must not become links: protocol
    /// relative URLs, non-HTTP schemes and unparsable URLs.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtext::{LinkResolver, Options};
    ///
    /// let options = Options::new()
    ///     .with_base_url("https://example.com/")
    ///     .with_domain("example.com");
    /// let resolver = LinkResolver::new(&options);
    ///
    /// let link = resolver.resolve("/posts/1").unwrap();
    /// assert_eq!(link.href, "https://example.com/posts/1");
    /// assert!(link.internal);
    ///
    /// assert!(!resolver.resolve("https://other.net/").unwrap().internal);
    /// assert!(resolver.resolve("javascript:alert(1)").is_none());
    /// ```
    #[must_use]
    pub fn resolve(&self, target: &str) -> Option<ResolvedLink> {
        let target = target.trim();
        if target.starts_with("//") {
            return None;
        }
        if target.starts_with('/') {
            return Some(ResolvedLink::internal(format!("{}{target}", self.base_url)));
        }
        if target.starts_with('#') {
            return Some(ResolvedLink::internal(target.to_owned()));
        }
        if has_scheme(target) {
            let url = Url::parse(target).ok()?;
            if !matches!(url.scheme(), "http" | "https") {
                return None;
            }
            let host = url.host_str()?;
            return Some(ResolvedLink {
                href: target.to_owned(),
                internal: self.is_internal_host(host),
            });
        }
        if target.is_empty() {
            return None;
        }
        let href = if self.base_url.is_empty() {
            target.to_owned()
        } else {
            format!("{}/{target}", self.base_url)
        };
        Some(ResolvedLink::internal(href))
    }

    /// Whether `host` is the site's domain or one of its internal domains.
    #[must_use]
    pub fn is_internal_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.');
        self.options
            .domain
            .iter()
            .chain(&self.options.internal_domains)
            .any(|domain| domain.eq_ignore_ascii_case(host))
    }

    /// Site path `{base_url}{prefix}{segment}` with the segment percent-encoded.
    pub(crate) fn site_path(&self, prefix: &str, segment: &str) -> String {
        format!(
            "{}{prefix}{}",
            self.base_url,
            encode_path_segment(segment)
        )
    }

    /// Site path `{base_url}{prefix}{id}`.
    pub(crate) fn id_path(&self, prefix: &str, id: u64) -> String {
        format!("{}{prefix}{id}", self.base_url)
    }
}

/// Whether the target starts with `scheme:` before any path, query or fragment.
fn has_scheme(target: &str) -> bool {
    match target.find([':', '/', '?', '#']) {
        Some(index) => target.as_bytes()[index] == b':' && index > 0,
        None => false,
    }
}
