//! Output buffer for rendered HTML.

use crate::construct::Construct;
use crate::error::Error;
use crate::html::{Anchor, escape_html_into};

/// Accumulates HTML and tracks how many construct elements are open.
#[derive(Debug)]
pub(crate) struct HtmlBuffer {
    html: String,
    open: usize,
}

impl HtmlBuffer {
    /// Create a buffer sized for `input_len` bytes of source.
    pub(crate) fn with_input_len(input_len: usize) -> Result<Self, Error> {
        let mut html = String::new();
        html.try_reserve(input_len.saturating_add(input_len / 2))
            .map_err(|e| Error::Internal(format!("cannot allocate output buffer: {e}")))?;
        Ok(Self { html, open: 0 })
    }

    /// Append engine-generated markup.
    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    /// Append text, escaped.
    pub(crate) fn push_text(&mut self, text: &str) {
        escape_html_into(&mut self.html, text);
    }

    pub(crate) fn push_anchor(&mut self, anchor: &Anchor<'_>, text: &str) {
        anchor.write(text, &mut self.html);
    }

    pub(crate) fn open(&mut self, construct: &Construct<'_>) {
        construct.write_open(&mut self.html);
        self.open += 1;
    }

    /// Write closing tags for constructs popped off the stack, topmost first.
    pub(crate) fn close_all(&mut self, closed: &[Construct<'_>]) {
        for construct in closed {
            self.html.push_str(construct.close_tag());
            self.open = self.open.saturating_sub(1);
        }
    }

    /// Consume the buffer, failing if any construct element is still open.
    pub(crate) fn finish(self) -> Result<String, Error> {
        if self.open != 0 {
            return Err(Error::Internal(format!(
                "{} element(s) left open at end of input",
                self.open
            )));
        }
        Ok(self.html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_output() {
        let mut buffer = HtmlBuffer::with_input_len(8).unwrap();
        buffer.open(&Construct::Paragraph);
        buffer.push_text("a<b");
        buffer.close_all(&[Construct::Paragraph]);
        assert_eq!(buffer.finish().unwrap(), "<p>a&lt;b</p>");
    }

    #[test]
    fn test_unbalanced_output_is_internal_error() {
        let mut buffer = HtmlBuffer::with_input_len(0).unwrap();
        buffer.open(&Construct::Bold);
        assert!(matches!(buffer.finish(), Err(Error::Internal(_))));
    }
}
