//! Index of closing tag positions.
//!
//! Openers check this index for a later closer in constant time instead of
//! searching ahead. Two indexes are built per input: a raw one over the
//! verbatim closers (`[/code]`, `[/nodtext]`), which end their block wherever
//! they appear, and one holding only the closers the scanner actually emits.

use std::sync::LazyLock;

use regex::Regex;

use crate::construct::TagKind;

/// Regex pattern for matching the closers of verbatim blocks.
static VERBATIM_CLOSER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[/(code|nodtext)\]").expect("invalid verbatim closer regex")
});

/// Byte offsets of closing tags in the input, grouped by tag.
#[derive(Debug)]
pub(crate) struct CloserIndex {
    positions: Vec<Vec<usize>>,
}

impl CloserIndex {
    /// Index every `[/code]` and `[/nodtext]` in `src`.
    pub(crate) fn verbatim(src: &str) -> Self {
        Self::from_positions(VERBATIM_CLOSER_PATTERN.find_iter(src).filter_map(|found| {
            let matched = found.as_str();
            TagKind::from_name(&matched[2..matched.len() - 1]).map(|kind| (kind, found.start()))
        }))
    }

    /// Index closers given in ascending offset order.
    pub(crate) fn from_positions(closers: impl IntoIterator<Item = (TagKind, usize)>) -> Self {
        let mut positions = vec![Vec::new(); TagKind::COUNT];
        for (kind, pos) in closers {
            positions[kind.index()].push(pos);
        }
        Self { positions }
    }

    /// Whether a closer for `kind` starts at or after `pos`.
    pub(crate) fn has_closer_after(&self, kind: TagKind, pos: usize) -> bool {
        self.positions[kind.index()]
            .last()
            .is_some_and(|&last| last >= pos)
    }

    /// Offset of the first closer for `kind` starting at or after `pos`.
    pub(crate) fn next_closer(&self, kind: TagKind, pos: usize) -> Option<usize> {
        let list = &self.positions[kind.index()];
        let index = list.partition_point(|&p| p < pos);
        list.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_verbatim_finds_closers_case_insensitively() {
        let index = CloserIndex::verbatim("[code]x[/CODE] [nodtext]y[/nodtext]");
        assert!(index.has_closer_after(TagKind::Code, 0));
        assert!(index.has_closer_after(TagKind::Code, 7));
        assert!(!index.has_closer_after(TagKind::Code, 8));
        assert!(index.has_closer_after(TagKind::NoDText, 15));
    }

    #[test]
    fn test_verbatim_ignores_inline_closers() {
        let index = CloserIndex::verbatim("[b]x[/b] [/codex] [/ code]");
        assert!(!index.has_closer_after(TagKind::Bold, 0));
        assert!(!index.has_closer_after(TagKind::Code, 0));
    }

    #[test]
    fn test_next_closer() {
        let src = "[code]a[/code] [code]b[/code]";
        let index = CloserIndex::verbatim(src);
        assert_eq!(index.next_closer(TagKind::Code, 6), Some(7));
        assert_eq!(index.next_closer(TagKind::Code, 8), Some(22));
        assert_eq!(index.next_closer(TagKind::Code, 23), None);
    }

    #[test]
    fn test_from_positions_groups_by_kind() {
        let index = CloserIndex::from_positions([
            (TagKind::Bold, 3),
            (TagKind::Italic, 9),
            (TagKind::Bold, 12),
        ]);
        assert_eq!(index.next_closer(TagKind::Bold, 4), Some(12));
        assert!(index.has_closer_after(TagKind::Italic, 9));
        assert!(!index.has_closer_after(TagKind::Italic, 10));
        assert!(!index.has_closer_after(TagKind::Quote, 0));
    }
}
