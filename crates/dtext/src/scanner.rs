//! Lexical scanner for DText.
//!
//! Walks the source once and yields [`Token`]s. Every delimiter is ASCII, so
//! the scanner works on byte offsets and only slices at ASCII positions.
//!
//! Lookahead never crosses the next structural character of the construct
//! being tried (closing quote, bracket, brace, backtick or newline), which
//! keeps total work linear in the input length. Anything that fails to match
//! simply stays part of the surrounding text run.
//!
//! An opening tag only counts when a closer the scanner itself would emit
//! follows it. Construction therefore runs one pass with every opener taken
//! at face value and records where `Close` tokens come out; escaped closers
//! and closers inside code, links or verbatim blocks never show up there.

use crate::closers::CloserIndex;
use crate::construct::TagKind;
use crate::options::Options;

/// Deepest list nesting expressible with leading stars.
const MAX_LIST_DEPTH: usize = 10;

/// Longest post/pool/creator id accepted in an id link.
const MAX_ID_DIGITS: usize = 19;

/// Characters that a backslash turns into literal text.
const ESCAPABLE: &[u8] = b"\\[]{}*\"@`#<>:";

/// Characters that end a URL in running text.
const URL_TERMINATORS: &[u8] = b"<>\"[]";

/// Trailing punctuation left out of bare URLs and mentions.
const TRAILING_PUNCTUATION: &[u8] = b".,;:!?'";

/// Numbered references written as `keyword #123`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IdKind {
    Post,
    Thumb,
    Pool,
    Creator,
    Upload,
}

impl IdKind {
    const ALL: [Self; 5] = [
        Self::Post,
        Self::Thumb,
        Self::Pool,
        Self::Creator,
        Self::Upload,
    ];

    fn keyword(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Thumb => "thumb",
            Self::Pool => "pool",
            Self::Creator => "creator",
            Self::Upload => "upload",
        }
    }

    /// Label shown in the rendered link.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Post | Self::Thumb => "post",
            other => other.keyword(),
        }
    }

    /// Site path prefix the id is appended to.
    pub(crate) fn path(self) -> &'static str {
        match self {
            Self::Post | Self::Thumb => "/posts/",
            Self::Pool => "/pools/",
            Self::Creator => "/creators/",
            Self::Upload => "/uploads/",
        }
    }

    pub(crate) fn classes(self) -> &'static str {
        match self {
            Self::Post => "dtext-id-link dtext-post-id-link",
            Self::Thumb => "dtext-id-link dtext-post-id-link thumb-placeholder-link",
            Self::Pool => "dtext-id-link dtext-pool-id-link",
            Self::Creator => "dtext-id-link dtext-creator-id-link",
            Self::Upload => "dtext-id-link dtext-upload-id-link",
        }
    }

    /// Whether the id is reported as a post reference.
    pub(crate) fn is_post(self) -> bool {
        matches!(self, Self::Post | Self::Thumb)
    }
}

/// Lexical event produced by the [`Scanner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Literal text, unescaped.
    Text(&'a str),
    /// Single newline.
    LineBreak,
    /// One or more blank lines.
    ParagraphBreak,
    /// `h1.` to `h6.` at the start of a line.
    Heading { level: u8, id: Option<&'a str> },
    /// `*` bullets at the start of a line.
    ListItem { depth: usize },
    /// Opening bracket tag with a closer somewhere later in the input.
    Open {
        kind: TagKind,
        flag: Option<&'a str>,
        value: Option<&'a str>,
        raw: &'a str,
    },
    /// Closing bracket tag.
    Close { kind: TagKind, raw: &'a str },
    /// `[hr]`
    HorizontalRule,
    /// `[br]`
    LineBreakTag,
    /// `[code]...[/code]`
    CodeBlock {
        language: Option<&'a str>,
        content: &'a str,
    },
    /// `[nodtext]...[/nodtext]`
    NoDText(&'a str),
    /// `` `code` ``
    InlineCode(&'a str),
    /// Quoted, markdown-style or angle-bracketed link.
    Link {
        text: &'a str,
        target: &'a str,
        raw: &'a str,
    },
    /// URL found in running text.
    BareUrl(&'a str),
    /// `[[target]]` or `[[target|label]]`
    WikiLink { target: &'a str, label: &'a str },
    /// `{{tag}}`
    QuickTag(&'a str),
    /// `@name`
    Mention(&'a str),
    /// `post #123` and friends.
    IdLink { kind: IdKind, id: u64 },
}

/// Tokenizer over DText source.
pub(crate) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    pending: Option<(usize, Token<'a>)>,
    /// Raw `[/code]` and `[/nodtext]` positions.
    verbatim: CloserIndex,
    /// Closers emitted by a full pass; `None` during that pass.
    closers: Option<CloserIndex>,
    allow_color: bool,
    allow_quick_tags: bool,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(src: &'a str, options: &Options) -> Self {
        let mut scanner = Self {
            src,
            pos: 0,
            pending: None,
            verbatim: CloserIndex::verbatim(src),
            closers: None,
            allow_color: options.allow_color,
            allow_quick_tags: options.allow_quick_tags,
        };
        let closers = CloserIndex::from_positions(
            std::iter::from_fn(|| scanner.next_located()).filter_map(|(start, token)| match token {
                Token::Close { kind, .. } => Some((kind, start)),
                _ => None,
            }),
        );
        scanner.pos = 0;
        scanner.pending = None;
        scanner.closers = Some(closers);
        scanner
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn at_line_start(&self, pos: usize) -> bool {
        pos == 0 || self.bytes()[pos - 1] == b'\n'
    }

    fn at_word_boundary(&self, pos: usize) -> bool {
        self.src[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    }

    /// Offset of the first `target` byte at or after `from`.
    ///
    /// Gives up at a newline, at any byte in `stops`, or at the end of input.
    fn find_byte(&self, from: usize, target: u8, stops: &[u8]) -> Option<usize> {
        for (offset, &byte) in self.bytes().get(from..)?.iter().enumerate() {
            if byte == target {
                return Some(from + offset);
            }
            if byte == b'\n' || stops.contains(&byte) {
                return None;
            }
        }
        None
    }

    /// End offset of a URL starting at `start`, trailing punctuation excluded.
    fn url_end(&self, start: usize) -> usize {
        let bytes = self.bytes();
        let mut end = start;
        while end < bytes.len() {
            let byte = bytes[end];
            if byte.is_ascii_whitespace() || URL_TERMINATORS.contains(&byte) {
                break;
            }
            end += 1;
        }

        let open_parens = bytes[start..end].iter().filter(|&&b| b == b'(').count();
        let mut close_parens = bytes[start..end].iter().filter(|&&b| b == b')').count();
        while end > start {
            let last = bytes[end - 1];
            if TRAILING_PUNCTUATION.contains(&last) {
                end -= 1;
            } else if last == b')' && close_parens > open_parens {
                close_parens -= 1;
                end -= 1;
            } else {
                break;
            }
        }
        end
    }

    /// Try every construct that can begin at `pos`.
    fn scan_at(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let bytes = self.bytes();
        if self.at_line_start(pos)
            && let Some(found) = self.scan_heading(pos).or_else(|| self.scan_list_item(pos))
        {
            return Some(found);
        }
        match bytes[pos] {
            b'\n' => Some(self.scan_newline(pos)),
            b'\r' if bytes.get(pos + 1) == Some(&b'\n') => Some(self.scan_newline(pos)),
            b'\\' => self.scan_escape(pos),
            b'[' => self.scan_bracket(pos),
            b'"' => self.scan_quoted_link(pos),
            b'<' => self.scan_angle_url(pos),
            b'`' => self.scan_inline_code(pos),
            b'{' if self.allow_quick_tags => self.scan_quick_tag(pos),
            b'@' => self.scan_mention(pos),
            b'h' | b'H' => self.scan_bare_url(pos),
            b'p' | b'P' | b't' | b'T' | b'c' | b'C' | b'u' | b'U' => self.scan_id_link(pos),
            _ => None,
        }
    }

    fn scan_newline(&self, pos: usize) -> (Token<'a>, usize) {
        let bytes = self.bytes();
        let mut end = pos + if bytes[pos] == b'\r' { 2 } else { 1 };
        let mut blank = false;
        loop {
            let mut ahead = end;
            while ahead < bytes.len() && matches!(bytes[ahead], b' ' | b'\t' | b'\r') {
                ahead += 1;
            }
            if bytes.get(ahead) == Some(&b'\n') {
                blank = true;
                end = ahead + 1;
            } else {
                break;
            }
        }
        let token = if blank {
            Token::ParagraphBreak
        } else {
            Token::LineBreak
        };
        (token, end)
    }

    fn skip_blanks(&self, mut pos: usize) -> usize {
        while matches!(self.bytes().get(pos), Some(b' ' | b'\t')) {
            pos += 1;
        }
        pos
    }

    fn scan_heading(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let bytes = self.bytes();
        if !matches!(bytes.get(pos), Some(b'h' | b'H')) {
            return None;
        }
        let level = match bytes.get(pos + 1) {
            Some(&digit @ b'1'..=b'6') => digit - b'0',
            _ => return None,
        };
        let mut cursor = pos + 2;
        let mut id = None;
        if bytes.get(cursor) == Some(&b'#') {
            let start = cursor + 1;
            let len = bytes[start..]
                .iter()
                .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
                .count();
            if len == 0 {
                return None;
            }
            id = Some(&self.src[start..start + len]);
            cursor = start + len;
        }
        if bytes.get(cursor) != Some(&b'.') || !matches!(bytes.get(cursor + 1), Some(b' ' | b'\t')) {
            return None;
        }
        Some((Token::Heading { level, id }, self.skip_blanks(cursor + 1)))
    }

    fn scan_list_item(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let bytes = self.bytes();
        let depth = bytes[pos..].iter().take_while(|&&b| b == b'*').count();
        if depth == 0 || depth > MAX_LIST_DEPTH {
            return None;
        }
        if !matches!(bytes.get(pos + depth), Some(b' ' | b'\t')) {
            return None;
        }
        Some((Token::ListItem { depth }, self.skip_blanks(pos + depth)))
    }

    fn scan_escape(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let next = *self.bytes().get(pos + 1)?;
        ESCAPABLE
            .contains(&next)
            .then(|| (Token::Text(&self.src[pos + 1..pos + 2]), pos + 2))
    }

    fn scan_bracket(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        if self.bytes().get(pos + 1) == Some(&b'[')
            && let Some(found) = self.scan_wiki_link(pos)
        {
            return Some(found);
        }
        self.scan_tag(pos).or_else(|| self.scan_markdown_link(pos))
    }

    fn scan_wiki_link(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let start = pos + 2;
        let close = self.find_byte(start, b']', b"[")?;
        if self.bytes().get(close + 1) != Some(&b']') {
            return None;
        }
        let inner = &self.src[start..close];
        let (target, label) = inner.split_once('|').unwrap_or((inner, inner));
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        let label = match label.trim() {
            "" => target,
            label => label,
        };
        Some((Token::WikiLink { target, label }, close + 2))
    }

    fn scan_markdown_link(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let close = self.find_byte(pos + 1, b']', b"[")?;
        if close == pos + 1 || self.bytes().get(close + 1) != Some(&b'(') {
            return None;
        }
        let target_start = close + 2;
        let target_end = self.find_byte(target_start, b')', b" \t\r(<>\"[]")?;
        if target_end == target_start {
            return None;
        }
        let token = Token::Link {
            text: &self.src[pos + 1..close],
            target: &self.src[target_start..target_end],
            raw: &self.src[pos..=target_end],
        };
        Some((token, target_end + 1))
    }

    fn scan_tag(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let close = self.find_byte(pos + 1, b']', b"[")?;
        let inner = &self.src[pos + 1..close];
        let end = close + 1;
        let raw = &self.src[pos..end];

        if let Some(name) = inner.strip_prefix('/') {
            let kind = TagKind::from_name(name)?;
            if kind == TagKind::Color && !self.allow_color {
                return None;
            }
            return Some((Token::Close { kind, raw }, end));
        }

        let (head, value) = match inner.split_once('=') {
            Some((head, value)) => (head, Some(value)),
            None => (inner, None),
        };
        let (name, flag) = match head.split_once(',') {
            Some((name, flag)) => (name.trim(), Some(flag.trim())),
            None => (head.trim(), None),
        };
        let plain = flag.is_none() && value.is_none();
        if plain && name.eq_ignore_ascii_case("hr") {
            return Some((Token::HorizontalRule, end));
        }
        if plain && name.eq_ignore_ascii_case("br") {
            return Some((Token::LineBreakTag, end));
        }

        let kind = TagKind::from_name(name)?;
        match kind {
            TagKind::Code if flag.is_none() => self.scan_code_block(end, value),
            TagKind::NoDText if plain => self.scan_nodtext(end),
            TagKind::Code | TagKind::NoDText => None,
            TagKind::Color if !self.allow_color => None,
            _ if self
                .closers
                .as_ref()
                .is_some_and(|closers| !closers.has_closer_after(kind, end)) =>
            {
                None
            }
            _ => Some((
                Token::Open {
                    kind,
                    flag,
                    value,
                    raw,
                },
                end,
            )),
        }
    }

    fn scan_code_block(&self, start: usize, language: Option<&'a str>) -> Option<(Token<'a>, usize)> {
        let language = match language.map(str::trim) {
            None => None,
            Some(lang)
                if !lang.is_empty()
                    && lang
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-')) =>
            {
                Some(lang)
            }
            Some(_) => return None,
        };
        let closer = self.verbatim.next_closer(TagKind::Code, start)?;
        let content = &self.src[start..closer];
        let content = content
            .strip_prefix("\r\n")
            .or_else(|| content.strip_prefix('\n'))
            .unwrap_or(content);
        let content = content
            .strip_suffix("\r\n")
            .or_else(|| content.strip_suffix('\n'))
            .unwrap_or(content);
        Some((Token::CodeBlock { language, content }, closer + "[/code]".len()))
    }

    fn scan_nodtext(&self, start: usize) -> Option<(Token<'a>, usize)> {
        let closer = self.verbatim.next_closer(TagKind::NoDText, start)?;
        Some((
            Token::NoDText(&self.src[start..closer]),
            closer + "[/nodtext]".len(),
        ))
    }

    fn scan_quoted_link(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let bytes = self.bytes();
        let close = self.find_byte(pos + 1, b'"', b"")?;
        if close == pos + 1 || bytes.get(close + 1) != Some(&b':') {
            return None;
        }
        let target_start = close + 2;
        let (target, end) = if bytes.get(target_start) == Some(&b'[') {
            let target_end = self.find_byte(target_start + 1, b']', b" \t\r[")?;
            (&self.src[target_start + 1..target_end], target_end + 1)
        } else {
            let target_end = self.url_end(target_start);
            let target = &self.src[target_start..target_end];
            let linkable = http_prefix_len(target).is_some()
                || target.starts_with('/')
                || target.starts_with('#');
            if !linkable {
                return None;
            }
            (target, target_end)
        };
        if target.is_empty() {
            return None;
        }
        let token = Token::Link {
            text: &self.src[pos + 1..close],
            target,
            raw: &self.src[pos..end],
        };
        Some((token, end))
    }

    fn scan_angle_url(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let start = pos + 1;
        let scheme = http_prefix_len(&self.src[start..])?;
        let close = self.find_byte(start, b'>', b" \t\r<")?;
        if close <= start + scheme {
            return None;
        }
        let url = &self.src[start..close];
        let token = Token::Link {
            text: url,
            target: url,
            raw: &self.src[pos..=close],
        };
        Some((token, close + 1))
    }

    fn scan_inline_code(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        let close = self.find_byte(pos + 1, b'`', b"")?;
        if close == pos + 1 {
            return None;
        }
        Some((Token::InlineCode(&self.src[pos + 1..close]), close + 1))
    }

    fn scan_quick_tag(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        if self.bytes().get(pos + 1) != Some(&b'{') {
            return None;
        }
        let close = self.find_byte(pos + 2, b'}', b"{")?;
        if self.bytes().get(close + 1) != Some(&b'}') {
            return None;
        }
        let name = self.src[pos + 2..close].trim();
        if name.is_empty() {
            return None;
        }
        Some((Token::QuickTag(name), close + 2))
    }

    fn scan_mention(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        if !self.at_word_boundary(pos) {
            return None;
        }
        let start = pos + 1;
        let rest = &self.src[start..];
        let mut end = start
            + rest
                .find(|c: char| {
                    c.is_whitespace() || matches!(c, '@' | '<' | '>' | '[' | ']' | '{' | '}' | '"')
                })
                .unwrap_or(rest.len());
        let bytes = self.bytes();
        while end > start && (TRAILING_PUNCTUATION.contains(&bytes[end - 1]) || bytes[end - 1] == b')') {
            end -= 1;
        }
        let name = &self.src[start..end];
        let first = name.chars().next()?;
        if !(first.is_alphanumeric() || first == '_') {
            return None;
        }
        Some((Token::Mention(name), end))
    }

    fn scan_bare_url(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        if !self.at_word_boundary(pos) {
            return None;
        }
        let scheme = http_prefix_len(&self.src[pos..])?;
        let end = self.url_end(pos);
        if end <= pos + scheme {
            return None;
        }
        Some((Token::BareUrl(&self.src[pos..end]), end))
    }

    fn scan_id_link(&self, pos: usize) -> Option<(Token<'a>, usize)> {
        if !self.at_word_boundary(pos) {
            return None;
        }
        let bytes = self.bytes();
        let kind = IdKind::ALL.into_iter().find(|kind| {
            let keyword = kind.keyword().as_bytes();
            bytes
                .get(pos..pos + keyword.len())
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(keyword))
        })?;
        let hash = pos + kind.keyword().len();
        if bytes.get(hash..hash + 2) != Some(b" #".as_slice()) {
            return None;
        }
        let digits_start = hash + 2;
        let digits = bytes[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 || digits > MAX_ID_DIGITS {
            return None;
        }
        let end = digits_start + digits;
        if self.src[end..].chars().next().is_some_and(char::is_alphanumeric) {
            return None;
        }
        let id = self.src[digits_start..end].parse().ok()?;
        Some((Token::IdLink { kind, id }, end))
    }
}

/// Length of a leading `http://` or `https://` (case-insensitive).
fn http_prefix_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    ["https://", "http://"].into_iter().find_map(|prefix| {
        bytes
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
            .then_some(prefix.len())
    })
}

impl<'a> Scanner<'a> {
    /// Next token together with the offset it starts at.
    fn next_located(&mut self) -> Option<(usize, Token<'a>)> {
        if let Some(located) = self.pending.take() {
            return Some(located);
        }
        let len = self.src.len();
        if self.pos >= len {
            return None;
        }

        let start = self.pos;
        let mut cursor = start;
        while cursor < len {
            if self.bytes()[cursor].is_ascii()
                && let Some((token, end)) = self.scan_at(cursor)
            {
                self.pos = end;
                if cursor > start {
                    self.pending = Some((cursor, token));
                    return Some((start, Token::Text(&self.src[start..cursor])));
                }
                return Some((cursor, token));
            }
            cursor += 1;
        }
        self.pos = len;
        Some((start, Token::Text(&self.src[start..])))
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.next_located().map(|(_, token)| token)
    }
}
