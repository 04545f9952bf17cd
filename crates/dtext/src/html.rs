//! HTML escaping and anchor markup.

use std::borrow::Cow;

/// Class shared by every engine-generated link.
pub(crate) const LINK_CLASS: &str = "dtext-link";

/// `rel` value marking links that leave the site.
const EXTERNAL_REL: &str = "external nofollow noreferrer";

/// Escape text for use in HTML content or a double-quoted attribute.
///
/// # Examples
///
/// ```
/// use dtext::escape_html;
///
/// assert_eq!(escape_html("a < b"), "a &lt; b");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if text.bytes().any(needs_escape) {
        let mut out = String::with_capacity(text.len() + 16);
        escape_html_into(&mut out, text);
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Append escaped text to `out`.
pub(crate) fn escape_html_into(out: &mut String, text: &str) {
    let mut last = 0;
    for (i, byte) in text.bytes().enumerate() {
        let replacement = match byte {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue,
        };
        out.push_str(&text[last..i]);
        out.push_str(replacement);
        last = i + 1;
    }
    out.push_str(&text[last..]);
}

fn needs_escape(byte: u8) -> bool {
    matches!(byte, b'&' | b'<' | b'>' | b'"' | b'\'')
}

/// Attributes of a rendered `<a>` element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Anchor<'h> {
    /// Link target, unescaped.
    pub href: &'h str,
    /// Space-separated classes following [`LINK_CLASS`].
    pub classes: &'h str,
    /// Adds `rel="external nofollow noreferrer"` and the external class.
    pub external: bool,
    /// Post id for thumbnail placeholders.
    pub data_id: Option<u64>,
}

impl<'h> Anchor<'h> {
    pub(crate) fn new(href: &'h str) -> Self {
        Self {
            href,
            classes: "",
            external: false,
            data_id: None,
        }
    }

    pub(crate) fn with_classes(mut self, classes: &'h str) -> Self {
        self.classes = classes;
        self
    }

    pub(crate) fn external(mut self, external: bool) -> Self {
        self.external = external;
        self
    }

    pub(crate) fn with_data_id(mut self, id: u64) -> Self {
        self.data_id = Some(id);
        self
    }

    /// Append `<a ...>text</a>` to `out`, escaping `text`.
    pub(crate) fn write(&self, text: &str, out: &mut String) {
        out.push_str("<a");
        if self.external {
            out.push_str(" rel=\"");
            out.push_str(EXTERNAL_REL);
            out.push('"');
        }
        out.push_str(" class=\"");
        out.push_str(LINK_CLASS);
        if self.external {
            out.push_str(" dtext-external-link");
        }
        if !self.classes.is_empty() {
            out.push(' ');
            out.push_str(self.classes);
        }
        out.push('"');
        if let Some(id) = self.data_id {
            out.push_str(" data-id=\"");
            out.push_str(&id.to_string());
            out.push('"');
        }
        out.push_str(" href=\"");
        escape_html_into(out, self.href);
        out.push_str("\">");
        escape_html_into(out, text);
        out.push_str("</a>");
    }
}
