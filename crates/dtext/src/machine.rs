//! Rendering state machine.
//!
//! Consumes scanner tokens, keeps the tag stack consistent and writes HTML.
//! Every element it opens goes through the stack, so closing the stack at
//! the end of input always yields balanced markup.

use crate::construct::{Construct, TagKind};
use crate::error::Error;
use crate::html::Anchor;
use crate::links::LinkResolver;
use crate::options::Options;
use crate::output::HtmlBuffer;
use crate::references::ReferenceSink;
use crate::scanner::{IdKind, Scanner, Token};
use crate::stack::TagStack;
use crate::util::normalize_tag_name;

/// Render `src` to HTML, reporting references to `sink`.
pub(crate) fn render<R: ReferenceSink>(
    src: &str,
    options: &Options,
    sink: &mut R,
) -> Result<String, Error> {
    let mut machine = Machine::new(src.len(), options, sink)?;
    for token in Scanner::new(src, options) {
        machine.handle(token);
    }
    machine.finish()
}

struct Machine<'a, 'o, 's, R> {
    options: &'o Options,
    links: LinkResolver<'o>,
    stack: TagStack<'a>,
    out: HtmlBuffer,
    sink: &'s mut R,
    /// A newline was seen inside running text; becomes `<br>` if more follows.
    pending_break: bool,
    /// Inline content has been written since the last block boundary.
    in_flow: bool,
}

impl<'a, 'o, 's, R: ReferenceSink> Machine<'a, 'o, 's, R> {
    fn new(input_len: usize, options: &'o Options, sink: &'s mut R) -> Result<Self, Error> {
        Ok(Self {
            options,
            links: LinkResolver::new(options),
            stack: TagStack::new(),
            out: HtmlBuffer::with_input_len(input_len)?,
            sink,
            pending_break: false,
            in_flow: false,
        })
    }

    fn handle(&mut self, token: Token<'a>) {
        match token {
            Token::Text(text) => self.text(text),
            Token::LineBreak => self.line_break(),
            Token::ParagraphBreak => self.paragraph_break(),
            Token::Heading { level, id } => {
                self.begin_block();
                self.push(Construct::Heading { level, id });
            }
            Token::ListItem { depth } => self.list_item(depth),
            Token::Open {
                kind,
                flag,
                value,
                raw,
            } => self.open(kind, flag, value, raw),
            Token::Close { kind, raw } => self.close(kind, raw),
            Token::HorizontalRule => {
                self.begin_block();
                self.out.push_html("<hr>");
            }
            Token::LineBreakTag => {
                if self.begin_inline() {
                    self.out.push_html("<br>");
                }
            }
            Token::CodeBlock { language, content } => {
                self.begin_block();
                match language {
                    Some(language) => {
                        self.out.push_html("<pre class=\"language-");
                        self.out.push_text(language);
                        self.out.push_html("\">");
                    }
                    None => self.out.push_html("<pre>"),
                }
                self.out.push_text(content);
                self.out.push_html("</pre>");
            }
            Token::NoDText(text) => {
                if !text.is_empty() && self.begin_inline() {
                    self.out.push_text(text);
                }
            }
            Token::InlineCode(code) => {
                if self.begin_inline() {
                    self.out.push_html("<code>");
                    self.out.push_text(code);
                    self.out.push_html("</code>");
                }
            }
            Token::Link { text, target, raw } => self.link(text, target, raw),
            Token::BareUrl(url) => self.link(url, url, url),
            Token::WikiLink { target, label } => {
                let tag = normalize_tag_name(target);
                let href = self.links.site_path("/tags/", &tag);
                if self.anchor(&Anchor::new(&href).with_classes("dtext-wiki-link"), label) {
                    self.sink.record_qtag(&tag);
                }
            }
            Token::QuickTag(name) => {
                let tag = normalize_tag_name(name);
                let href = self.links.site_path("/q/", &tag);
                if self.anchor(&Anchor::new(&href).with_classes("dtext-qtag-link"), name) {
                    self.sink.record_qtag(&tag);
                }
            }
            Token::Mention(name) => {
                let href = self.links.site_path("/creators/", name);
                let label = format!("@{name}");
                if self.anchor(
                    &Anchor::new(&href).with_classes("dtext-creator-link"),
                    &label,
                ) {
                    self.sink.record_creator(name);
                }
            }
            Token::IdLink { kind, id } => self.id_link(kind, id),
        }
    }

    fn push(&mut self, construct: Construct<'a>) -> bool {
        if self.stack.is_full() {
            tracing::trace!(depth = self.stack.depth(), "nesting limit reached");
            return false;
        }
        self.out.open(&construct);
        self.stack.push(construct);
        true
    }

    fn write_closed(&mut self, closed: &[Construct<'a>]) {
        self.out.close_all(closed);
    }

    /// Prepare for inline content: flush a pending break and open a paragraph
    /// where one is needed.
    ///
    /// Returns `false` directly inside a table, head, body or row, where
    /// inline content has no valid place and is dropped.
    fn begin_inline(&mut self) -> bool {
        if self.stack.top().is_some_and(Construct::is_table_structure) {
            tracing::trace!("inline content outside a table cell dropped");
            return false;
        }
        if matches!(self.stack.top(), Some(Construct::List)) {
            let closed = self.stack.close_to_block_container();
            self.write_closed(&closed);
        }
        if self.pending_break {
            self.pending_break = false;
            self.out.push_html("<br>");
        }
        if !self.options.inline_mode && self.stack.top().is_none_or(Construct::wraps_paragraphs) {
            self.push(Construct::Paragraph);
        }
        self.in_flow = true;
        true
    }

    /// Close everything up to the nearest block container.
    fn begin_block(&mut self) {
        let closed = self.stack.close_to_block_container();
        self.write_closed(&closed);
        self.pending_break = false;
        self.in_flow = false;
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text.trim().is_empty()
            && (!self.in_flow
                || self.pending_break
                || self.stack.top().is_some_and(Construct::is_table_structure))
        {
            return;
        }
        if self.begin_inline() {
            self.out.push_text(text);
        }
    }

    fn line_break(&mut self) {
        if self.stack.in_line_scope() {
            let closed = self.stack.close_line();
            self.write_closed(&closed);
            self.pending_break = false;
            self.in_flow = false;
        } else if self.in_flow {
            self.pending_break = true;
        }
    }

    fn paragraph_break(&mut self) {
        let closed = self.stack.close_to_block_container();
        self.write_closed(&closed);
        let keep_break =
            self.options.inline_mode && self.in_flow && !closed.iter().any(Construct::is_block);
        self.pending_break = keep_break;
        self.in_flow = keep_break;
    }

    fn list_item(&mut self, depth: usize) {
        self.pending_break = false;
        self.in_flow = false;
        if !matches!(self.stack.top(), Some(Construct::List)) {
            let closed = self.stack.close_to_block_container();
            self.write_closed(&closed);
        }
        let mut current = self.stack.list_depth();
        while current > depth {
            if let Some(list) = self.stack.pop() {
                self.write_closed(&[list]);
            }
            current -= 1;
        }
        while current < depth {
            if !self.push(Construct::List) {
                return;
            }
            current += 1;
        }
        self.push(Construct::ListItem);
    }

    /// Whether a `[table]` part may open at the current position.
    fn table_part_allowed(&self, construct: &Construct<'_>) -> bool {
        let top = self.stack.top();
        match construct {
            Construct::TableHead | Construct::TableBody => {
                matches!(top, Some(Construct::Table))
            }
            Construct::TableRow => matches!(
                top,
                Some(Construct::Table | Construct::TableHead | Construct::TableBody)
            ),
            Construct::TableHeader | Construct::TableCell => {
                matches!(top, Some(Construct::TableRow))
            }
            _ => false,
        }
    }

    fn open(&mut self, kind: TagKind, flag: Option<&'a str>, value: Option<&'a str>, raw: &'a str) {
        let block_context = !self.options.inline_mode
            && !self.stack.top().is_some_and(Construct::accepts_inline);
        let Some(construct) = Construct::from_tag(kind, flag, value, block_context) else {
            self.text(raw);
            return;
        };
        if self.stack.is_full() {
            tracing::trace!(tag = kind.name(), "nesting limit reached, opener rendered as text");
            self.text(raw);
            return;
        }

        if construct.is_table_part() {
            if !self.table_part_allowed(&construct) {
                self.text(raw);
                return;
            }
            self.pending_break = false;
            self.in_flow = false;
            self.push(construct);
        } else if construct.is_block() {
            self.begin_block();
            self.push(construct);
        } else if self.begin_inline() && !self.push(construct) {
            self.out.push_text(raw);
        }
    }

    fn close(&mut self, kind: TagKind, raw: &'a str) {
        match self.stack.close(kind) {
            Some(closed) => {
                self.write_closed(&closed);
                if closed.iter().any(Construct::is_block) {
                    self.pending_break = false;
                    self.in_flow = false;
                }
            }
            None => {
                tracing::trace!(tag = kind.name(), "unmatched closer rendered as text");
                self.text(raw);
            }
        }
    }

    /// Write a link, returning whether it made it into the output.
    fn anchor(&mut self, anchor: &Anchor<'_>, text: &str) -> bool {
        if !self.begin_inline() {
            return false;
        }
        self.out.push_anchor(anchor, text);
        true
    }

    fn link(&mut self, text: &str, target: &str, raw: &str) {
        let Some(link) = self.links.resolve(target) else {
            self.text(raw);
            return;
        };
        let written = self.anchor(&Anchor::new(&link.href).external(!link.internal), text);
        if written && !link.internal {
            self.sink.record_external_link(&link.href);
        }
    }

    fn id_link(&mut self, kind: IdKind, id: u64) {
        let href = self.links.id_path(kind.path(), id);
        let label = format!("{} #{id}", kind.label());
        let mut anchor = Anchor::new(&href).with_classes(kind.classes());
        if kind == IdKind::Thumb {
            anchor = anchor.with_data_id(id);
        }
        if self.anchor(&anchor, &label) && kind.is_post() {
            self.sink.record_post(id);
        }
    }

    fn finish(mut self) -> Result<String, Error> {
        let closed = self.stack.close_all();
        self.write_closed(&closed);
        self.out.finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::references::References;
    use crate::stack::MAX_DEPTH;

    fn html(src: &str) -> String {
        html_with(src, &Options::default())
    }

    fn html_with(src: &str, options: &Options) -> String {
        render(src, options, &mut References::new()).unwrap()
    }

    #[test]
    fn test_bold() {
        assert_eq!(html("[b]hello[/b]"), "<p><strong>hello</strong></p>");
    }

    #[test]
    fn test_line_and_paragraph_breaks() {
        assert_eq!(html("a\nb"), "<p>a<br>b</p>");
        assert_eq!(html("a\n\nb"), "<p>a</p><p>b</p>");
        assert_eq!(html("a\n"), "<p>a</p>");
        assert_eq!(html("\n\n"), "");
    }

    #[test]
    fn test_quote_wraps_paragraphs() {
        assert_eq!(
            html("[quote]hi\n\nthere[/quote]after"),
            "<blockquote><p>hi</p><p>there</p></blockquote><p>after</p>"
        );
    }

    #[test]
    fn test_block_opener_closes_paragraph() {
        assert_eq!(
            html("intro\n[quote]q[/quote]"),
            "<p>intro</p><blockquote><p>q</p></blockquote>"
        );
    }

    #[test]
    fn test_nested_lists() {
        assert_eq!(
            html("* a\n** b\n* c\ntext"),
            "<ul><li>a</li><ul><li>b</li></ul><li>c</li></ul><p>text</p>"
        );
    }

    #[test]
    fn test_heading_with_id() {
        assert_eq!(
            html("h2#intro. Hello\nbody"),
            "<h2 id=\"dtext-intro\">Hello</h2><p>body</p>"
        );
    }

    #[test]
    fn test_inline_mode_has_no_paragraphs() {
        let options = Options::new().inline(true);
        assert_eq!(html_with("a\nb", &options), "a<br>b");
        assert_eq!(html_with("a\n\nb", &options), "a<br>b");
        assert_eq!(html_with("[b]x[/b]", &options), "<strong>x</strong>");
        assert_eq!(
            html_with("[spoiler]x[/spoiler]", &options),
            "<span class=\"spoiler\">x</span>"
        );
    }

    #[test]
    fn test_spoiler_placement() {
        assert_eq!(
            html("[spoiler]x[/spoiler]"),
            "<div class=\"spoiler\"><p>x</p></div>"
        );
        assert_eq!(
            html("a [spoiler]x[/spoiler]"),
            "<p>a <span class=\"spoiler\">x</span></p>"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            html("[table]\n[tr]\n[td]a[/td]\n[/tr]\n[/table]"),
            "<table class=\"striped\"><tr><td>a</td></tr></table>"
        );
    }

    #[test]
    fn test_misplaced_table_part_is_text() {
        assert_eq!(html("[td]x[/td]"), "<p>[td]x[/td]</p>");
    }

    #[test]
    fn test_content_between_table_parts_is_dropped() {
        assert_eq!(
            html("[table]oops[tr][td]a[/td][/tr][/table]"),
            "<table class=\"striped\"><tr><td>a</td></tr></table>"
        );
        let mut refs = References::new();
        let out = render(
            "[table][tr]@bob [b]x[/b][td]a[/td][/tr][/table]",
            &Options::default(),
            &mut refs,
        )
        .unwrap();
        assert_eq!(out, "<table class=\"striped\"><tr><td>a</td></tr></table>");
        assert!(refs.into_result(out).creators.is_empty());
    }

    #[test]
    fn test_inline_mode_blank_line_after_list() {
        let options = Options::new().inline(true);
        assert_eq!(
            html_with("a\n* x\n\nb", &options),
            "a<ul><li>x</li></ul>b"
        );
        assert_eq!(
            html_with("[quote]a\n\nb[/quote]", &options),
            "<blockquote>a<br>b</blockquote>"
        );
    }

    #[test]
    fn test_closer_followed_by_parenthesis() {
        assert_eq!(
            html("[i]Movie[/i](2019) rest"),
            "<p><em>Movie</em>(2019) rest</p>"
        );
    }

    #[test]
    fn test_code_block_is_escaped() {
        assert_eq!(html("[code]<b>\n[/code]"), "<pre>&lt;b&gt;</pre>");
        assert_eq!(
            html("x [code=rust]fn[/code] y"),
            "<p>x </p><pre class=\"language-rust\">fn</pre><p> y</p>"
        );
    }

    #[test]
    fn test_unmatched_closer_is_text() {
        assert_eq!(html("[/b]x"), "<p>[/b]x</p>");
    }

    #[test]
    fn test_crossed_tags_stay_balanced() {
        assert_eq!(
            html("[b][i]x[/b]y[/i]"),
            "<p><strong><em>x</em></strong>y[/i]</p>"
        );
    }

    #[test]
    fn test_heading_closes_inline_at_newline() {
        assert_eq!(
            html("h1. [b]x\ny[/b]"),
            "<h1><strong>x</strong></h1><p>y[/b]</p>"
        );
    }

    #[test]
    fn test_mention_records_creator() {
        let options = Options::new().with_base_url("https://e.com");
        let mut refs = References::new();
        let out = render("@bob hi @bob", &options, &mut refs).unwrap();
        assert_eq!(
            out,
            "<p><a class=\"dtext-link dtext-creator-link\" href=\"https://e.com/creators/bob\">@bob</a> hi <a class=\"dtext-link dtext-creator-link\" href=\"https://e.com/creators/bob\">@bob</a></p>"
        );
        assert_eq!(refs.into_result(out).creators, vec!["bob"]);
    }

    #[test]
    fn test_post_and_thumb_links() {
        let mut refs = References::new();
        let out = render("post #42 thumb #7", &Options::default(), &mut refs).unwrap();
        assert_eq!(
            out,
            "<p><a class=\"dtext-link dtext-id-link dtext-post-id-link\" href=\"/posts/42\">post #42</a> <a class=\"dtext-link dtext-id-link dtext-post-id-link thumb-placeholder-link\" data-id=\"7\" href=\"/posts/7\">post #7</a></p>"
        );
        assert_eq!(refs.into_result(out).post_ids, vec![42, 7]);
    }

    #[test]
    fn test_pool_link_does_not_record_post() {
        let mut refs = References::new();
        let out = render("pool #3", &Options::default(), &mut refs).unwrap();
        assert_eq!(
            out,
            "<p><a class=\"dtext-link dtext-id-link dtext-pool-id-link\" href=\"/pools/3\">pool #3</a></p>"
        );
        assert!(refs.into_result(out).post_ids.is_empty());
    }

    #[test]
    fn test_wiki_link_records_qtag() {
        let mut refs = References::new();
        let out = render("[[Blue Sky]]", &Options::default(), &mut refs).unwrap();
        assert_eq!(
            out,
            "<p><a class=\"dtext-link dtext-wiki-link\" href=\"/tags/blue_sky\">Blue Sky</a></p>"
        );
        assert_eq!(refs.into_result(out).qtags, vec!["blue_sky"]);
    }

    #[test]
    fn test_external_link() {
        let options = Options::new().with_domain("e.com");
        let mut refs = References::new();
        let out = render("https://x.net/a", &options, &mut refs).unwrap();
        assert_eq!(
            out,
            "<p><a rel=\"external nofollow noreferrer\" class=\"dtext-link dtext-external-link\" href=\"https://x.net/a\">https://x.net/a</a></p>"
        );
        assert_eq!(refs.into_result(out).external_links, vec!["https://x.net/a"]);
    }

    #[test]
    fn test_unresolvable_link_is_text() {
        assert_eq!(html("[x](//evil)"), "<p>[x](//evil)</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(html("<script>&"), "<p>&lt;script&gt;&amp;</p>");
    }

    #[test]
    fn test_nesting_limit_keeps_output_balanced() {
        let src = format!("{}x{}", "[b]".repeat(600), "[/b]".repeat(600));
        let out = html(&src);
        assert_eq!(out.matches("<strong>").count(), MAX_DEPTH - 1);
        assert_eq!(out.matches("</strong>").count(), MAX_DEPTH - 1);
    }
}
