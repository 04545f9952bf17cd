//! Reference collection.
//!
//! The state machine reports every creator mention, post reference, tag
//! reference and external link through [`ReferenceSink`]. [`References`] is
//! the collector used by [`parse`](crate::parse).

use std::collections::HashSet;

/// Receives references as they are rendered.
pub trait ReferenceSink {
    fn record_creator(&mut self, name: &str);
    fn record_post(&mut self, id: u64);
    fn record_qtag(&mut self, tag: &str);

    /// Called with the `href` of every link classified as external.
    fn record_external_link(&mut self, _href: &str) {}
}

/// Insertion-ordered set of strings.
#[derive(Debug, Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, value: &str) {
        if !self.seen.contains(value) {
            self.seen.insert(value.to_owned());
            self.items.push(value.to_owned());
        }
    }
}

/// Collected references of one parse.
#[derive(Debug, Default)]
pub struct References {
    creators: OrderedSet,
    post_ids: Vec<u64>,
    qtags: OrderedSet,
    external_links: OrderedSet,
}

impl References {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine the collected references with rendered HTML.
    #[must_use]
    pub fn into_result(self, html: String) -> ParseResult {
        ParseResult {
            html,
            creators: self.creators.items,
            post_ids: self.post_ids,
            qtags: self.qtags.items,
            external_links: self.external_links.items,
        }
    }
}

impl ReferenceSink for References {
    fn record_creator(&mut self, name: &str) {
        self.creators.insert(name);
    }

    fn record_post(&mut self, id: u64) {
        self.post_ids.push(id);
    }

    fn record_qtag(&mut self, tag: &str) {
        self.qtags.insert(tag);
    }

    fn record_external_link(&mut self, href: &str) {
        self.external_links.insert(href);
    }
}

/// Output of a successful parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseResult {
    /// Rendered, well-formed HTML.
    pub html: String,
    /// Mentioned creator names, unique, in order of first appearance.
    pub creators: Vec<String>,
    /// Referenced post ids in order of appearance, duplicates kept.
    pub post_ids: Vec<u64>,
    /// Referenced tag names, normalized and unique.
    pub qtags: Vec<String>,
    /// Hrefs of links leaving the site, unique.
    pub external_links: Vec<String>,
}
