//! Stack of open constructs.
//!
//! Only structural bookkeeping lives here. Closing operations hand back the
//! constructs they removed, topmost first, and the caller writes their
//! closing HTML.

use crate::construct::{Construct, TagKind};

/// Maximum number of simultaneously open constructs.
pub(crate) const MAX_DEPTH: usize = 512;

#[derive(Debug, Default)]
pub(crate) struct TagStack<'a> {
    open: Vec<Construct<'a>>,
}

impl<'a> TagStack<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, construct: Construct<'a>) {
        self.open.push(construct);
    }

    pub(crate) fn top(&self) -> Option<&Construct<'a>> {
        self.open.last()
    }

    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.open.len() >= MAX_DEPTH
    }

    /// Number of consecutive lists at the top of the stack.
    pub(crate) fn list_depth(&self) -> usize {
        self.open
            .iter()
            .rev()
            .take_while(|construct| matches!(construct, Construct::List))
            .count()
    }

    /// Whether a heading or list item is open above the nearest block container.
    pub(crate) fn in_line_scope(&self) -> bool {
        self.open
            .iter()
            .rev()
            .take_while(|construct| !construct.is_flow_boundary())
            .any(Construct::is_line_scoped)
    }

    /// Pop the nearest construct closed by `kind` and everything above it.
    ///
    /// Returns `None`, leaving the stack untouched, when nothing open matches.
    pub(crate) fn close(&mut self, kind: TagKind) -> Option<Vec<Construct<'a>>> {
        let index = self
            .open
            .iter()
            .rposition(|construct| construct.kind() == Some(kind))?;
        Some(self.drain_from(index))
    }

    /// Pop everything above the nearest quote, section, spoiler or table part.
    pub(crate) fn close_to_block_container(&mut self) -> Vec<Construct<'a>> {
        let index = self
            .open
            .iter()
            .rposition(Construct::is_flow_boundary)
            .map_or(0, |index| index + 1);
        self.drain_from(index)
    }

    /// Pop down through the innermost heading or list item.
    pub(crate) fn close_line(&mut self) -> Vec<Construct<'a>> {
        let boundary = self
            .open
            .iter()
            .rposition(Construct::is_flow_boundary)
            .map_or(0, |index| index + 1);
        match self.open[boundary..]
            .iter()
            .rposition(Construct::is_line_scoped)
        {
            Some(offset) => self.drain_from(boundary + offset),
            None => Vec::new(),
        }
    }

    /// Pop everything.
    pub(crate) fn close_all(&mut self) -> Vec<Construct<'a>> {
        self.drain_from(0)
    }

    pub(crate) fn pop(&mut self) -> Option<Construct<'a>> {
        self.open.pop()
    }

    fn drain_from(&mut self, index: usize) -> Vec<Construct<'a>> {
        let mut closed: Vec<_> = self.open.drain(index..).collect();
        closed.reverse();
        closed
    }
}
