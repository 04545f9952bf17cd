//! Markup constructs tracked on the tag stack.

use crate::html::escape_html_into;

/// Bracket tags that have a `[/name]` closing form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TagKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Superscript,
    Subscript,
    Spoiler,
    Translation,
    Color,
    Quote,
    Section,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeader,
    TableCell,
    Code,
    NoDText,
}

impl TagKind {
    pub(crate) const COUNT: usize = 19;

    /// Look up a tag by its (case-insensitive) name.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "b" => Self::Bold,
            "i" => Self::Italic,
            "u" => Self::Underline,
            "s" => Self::Strike,
            "sup" => Self::Superscript,
            "sub" => Self::Subscript,
            "spoiler" => Self::Spoiler,
            "tn" => Self::Translation,
            "color" => Self::Color,
            "quote" => Self::Quote,
            "section" => Self::Section,
            "table" => Self::Table,
            "thead" => Self::TableHead,
            "tbody" => Self::TableBody,
            "tr" => Self::TableRow,
            "th" => Self::TableHeader,
            "td" => Self::TableCell,
            "code" => Self::Code,
            "nodtext" => Self::NoDText,
            _ => return None,
        };
        Some(kind)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Underline => "u",
            Self::Strike => "s",
            Self::Superscript => "sup",
            Self::Subscript => "sub",
            Self::Spoiler => "spoiler",
            Self::Translation => "tn",
            Self::Color => "color",
            Self::Quote => "quote",
            Self::Section => "section",
            Self::Table => "table",
            Self::TableHead => "thead",
            Self::TableBody => "tbody",
            Self::TableRow => "tr",
            Self::TableHeader => "th",
            Self::TableCell => "td",
            Self::Code => "code",
            Self::NoDText => "nodtext",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Tag categories usable as `[color=category]`.
const COLOR_CATEGORIES: &[&str] = &[
    "general",
    "creator",
    "copyright",
    "character",
    "species",
    "invalid",
    "meta",
    "lore",
];

/// Value of a `[color]` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color<'a> {
    /// Tag category, rendered as a class.
    Category(&'static str),
    /// Hex or named CSS color, rendered as a style.
    Value(&'a str),
}

impl<'a> Color<'a> {
    /// Accept tag categories, `#` hex colors and plain color names.
    pub(crate) fn parse(value: &'a str) -> Option<Self> {
        let value = value.trim();
        if let Some(category) = COLOR_CATEGORIES
            .iter()
            .find(|category| category.eq_ignore_ascii_case(value))
        {
            return Some(Self::Category(category));
        }
        if let Some(hex) = value.strip_prefix('#') {
            let valid = matches!(hex.len(), 3 | 4 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit());
            return valid.then_some(Self::Value(value));
        }
        let valid = (1..=20).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_alphabetic());
        valid.then_some(Self::Value(value))
    }
}

/// An open construct on the tag stack.
///
/// Borrowed attributes point into the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Construct<'a> {
    Paragraph,
    Heading { level: u8, id: Option<&'a str> },
    List,
    ListItem,
    Quote,
    Section { title: Option<&'a str>, expanded: bool },
    BlockSpoiler,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeader,
    TableCell,
    Bold,
    Italic,
    Underline,
    Strike,
    Superscript,
    Subscript,
    InlineSpoiler,
    Translation,
    Color(Color<'a>),
}

const HEADING_CLOSE: [&str; 6] = ["</h1>", "</h2>", "</h3>", "</h4>", "</h5>", "</h6>"];

impl<'a> Construct<'a> {
    /// Build the construct an opening bracket tag stands for.
    ///
    /// Returns `None` when the tag carries attributes it does not accept or
    /// opens through a dedicated token (code, nodtext, table parts are
    /// handled by the caller for placement).
    pub(crate) fn from_tag(
        kind: TagKind,
        flag: Option<&'a str>,
        value: Option<&'a str>,
        block: bool,
    ) -> Option<Self> {
        let plain = flag.is_none() && value.is_none();
        let construct = match kind {
            TagKind::Section => {
                let expanded = match flag {
                    None => false,
                    Some(flag) if flag.eq_ignore_ascii_case("expanded") => true,
                    Some(_) => return None,
                };
                let title = value.map(str::trim).filter(|title| !title.is_empty());
                Self::Section { title, expanded }
            }
            TagKind::Color if flag.is_none() => Self::Color(Color::parse(value?)?),
            _ if !plain => return None,
            TagKind::Bold => Self::Bold,
            TagKind::Italic => Self::Italic,
            TagKind::Underline => Self::Underline,
            TagKind::Strike => Self::Strike,
            TagKind::Superscript => Self::Superscript,
            TagKind::Subscript => Self::Subscript,
            TagKind::Translation => Self::Translation,
            TagKind::Spoiler if block => Self::BlockSpoiler,
            TagKind::Spoiler => Self::InlineSpoiler,
            TagKind::Quote => Self::Quote,
            TagKind::Table => Self::Table,
            TagKind::TableHead => Self::TableHead,
            TagKind::TableBody => Self::TableBody,
            TagKind::TableRow => Self::TableRow,
            TagKind::TableHeader => Self::TableHeader,
            TagKind::TableCell => Self::TableCell,
            TagKind::Color | TagKind::Code | TagKind::NoDText => return None,
        };
        Some(construct)
    }

    /// Closing delimiter that matches this construct, if it has one.
    pub(crate) fn kind(&self) -> Option<TagKind> {
        let kind = match self {
            Self::Paragraph | Self::Heading { .. } | Self::List | Self::ListItem => return None,
            Self::Quote => TagKind::Quote,
            Self::Section { .. } => TagKind::Section,
            Self::BlockSpoiler | Self::InlineSpoiler => TagKind::Spoiler,
            Self::Table => TagKind::Table,
            Self::TableHead => TagKind::TableHead,
            Self::TableBody => TagKind::TableBody,
            Self::TableRow => TagKind::TableRow,
            Self::TableHeader => TagKind::TableHeader,
            Self::TableCell => TagKind::TableCell,
            Self::Bold => TagKind::Bold,
            Self::Italic => TagKind::Italic,
            Self::Underline => TagKind::Underline,
            Self::Strike => TagKind::Strike,
            Self::Superscript => TagKind::Superscript,
            Self::Subscript => TagKind::Subscript,
            Self::Translation => TagKind::Translation,
            Self::Color(_) => TagKind::Color,
        };
        Some(kind)
    }

    pub(crate) fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Paragraph
                | Self::Heading { .. }
                | Self::List
                | Self::ListItem
                | Self::Quote
                | Self::Section { .. }
                | Self::BlockSpoiler
                | Self::Table
                | Self::TableHead
                | Self::TableBody
                | Self::TableRow
                | Self::TableHeader
                | Self::TableCell
        )
    }

    /// Quote-like blocks whose inline content needs a paragraph.
    pub(crate) fn wraps_paragraphs(&self) -> bool {
        matches!(self, Self::Quote | Self::Section { .. } | Self::BlockSpoiler)
    }

    /// Table parts that only hold other table parts.
    pub(crate) fn is_table_structure(&self) -> bool {
        matches!(
            self,
            Self::Table | Self::TableHead | Self::TableBody | Self::TableRow
        )
    }

    /// Table children that only open directly inside their parent part.
    pub(crate) fn is_table_part(&self) -> bool {
        matches!(
            self,
            Self::TableHead
                | Self::TableBody
                | Self::TableRow
                | Self::TableHeader
                | Self::TableCell
        )
    }

    /// Constructs that paragraph breaks and block openers never close.
    pub(crate) fn is_flow_boundary(&self) -> bool {
        self.wraps_paragraphs()
            || self.is_table_structure()
            || matches!(self, Self::TableHeader | Self::TableCell)
    }

    /// Constructs that end at the next newline.
    pub(crate) fn is_line_scoped(&self) -> bool {
        matches!(self, Self::Heading { .. } | Self::ListItem)
    }

    pub(crate) fn accepts_inline(&self) -> bool {
        !self.wraps_paragraphs() && !self.is_table_structure() && !matches!(self, Self::List)
    }

    /// Append the opening HTML for this construct.
    pub(crate) fn write_open(&self, out: &mut String) {
        match self {
            Self::Heading { level, id } => {
                out.push_str("<h");
                out.push(char::from(b'0' + *level));
                if let Some(id) = id {
                    out.push_str(" id=\"dtext-");
                    escape_html_into(out, id);
                    out.push('"');
                }
                out.push('>');
            }
            Self::Section { title, expanded } => {
                out.push_str(if *expanded {
                    "<details open><summary>"
                } else {
                    "<details><summary>"
                });
                escape_html_into(out, title.unwrap_or("Show"));
                out.push_str("</summary><div>");
            }
            Self::Color(Color::Category(category)) => {
                out.push_str("<span class=\"dtext-color-");
                out.push_str(category);
                out.push_str("\">");
            }
            Self::Color(Color::Value(value)) => {
                out.push_str("<span class=\"dtext-color\" style=\"color: ");
                escape_html_into(out, value);
                out.push_str("\">");
            }
            Self::Paragraph => out.push_str("<p>"),
            Self::List => out.push_str("<ul>"),
            Self::ListItem => out.push_str("<li>"),
            Self::Quote => out.push_str("<blockquote>"),
            Self::BlockSpoiler => out.push_str("<div class=\"spoiler\">"),
            Self::Table => out.push_str("<table class=\"striped\">"),
            Self::TableHead => out.push_str("<thead>"),
            Self::TableBody => out.push_str("<tbody>"),
            Self::TableRow => out.push_str("<tr>"),
            Self::TableHeader => out.push_str("<th>"),
            Self::TableCell => out.push_str("<td>"),
            Self::Bold => out.push_str("<strong>"),
            Self::Italic => out.push_str("<em>"),
            Self::Underline => out.push_str("<u>"),
            Self::Strike => out.push_str("<s>"),
            Self::Superscript => out.push_str("<sup>"),
            Self::Subscript => out.push_str("<sub>"),
            Self::InlineSpoiler => out.push_str("<span class=\"spoiler\">"),
            Self::Translation => out.push_str("<span class=\"tn\">"),
        }
    }

    /// Closing HTML for this construct.
    pub(crate) fn close_tag(&self) -> &'static str {
        match self {
            Self::Heading { level, .. } => HEADING_CLOSE[usize::from((*level).clamp(1, 6) - 1)],
            Self::Paragraph => "</p>",
            Self::List => "</ul>",
            Self::ListItem => "</li>",
            Self::Quote => "</blockquote>",
            Self::Section { .. } => "</div></details>",
            Self::BlockSpoiler => "</div>",
            Self::Table => "</table>",
            Self::TableHead => "</thead>",
            Self::TableBody => "</tbody>",
            Self::TableRow => "</tr>",
            Self::TableHeader => "</th>",
            Self::TableCell => "</td>",
            Self::Bold => "</strong>",
            Self::Italic => "</em>",
            Self::Underline => "</u>",
            Self::Strike => "</s>",
            Self::Superscript => "</sup>",
            Self::Subscript => "</sub>",
            Self::InlineSpoiler | Self::Translation | Self::Color(_) => "</span>",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_html(construct: &Construct<'_>) -> String {
        let mut out = String::new();
        construct.write_open(&mut out);
        out
    }

    #[test]
    fn test_tag_names_round_trip_case_insensitively() {
        for name in ["b", "SUP", "Spoiler", "tn", "COLOR", "tbody", "NoDText"] {
            let kind = TagKind::from_name(name).unwrap();
            assert_eq!(kind.name(), name.to_ascii_lowercase());
        }
        assert_eq!(TagKind::from_name("blink"), None);
    }

    #[test]
    fn test_tag_index_is_dense() {
        assert_eq!(TagKind::Bold.index(), 0);
        assert_eq!(TagKind::NoDText.index(), TagKind::COUNT - 1);
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("Creator"), Some(Color::Category("creator")));
        assert_eq!(Color::parse("#fa0"), Some(Color::Value("#fa0")));
        assert_eq!(Color::parse("#FF00AA80"), Some(Color::Value("#FF00AA80")));
        assert_eq!(Color::parse(" red "), Some(Color::Value("red")));
        assert_eq!(Color::parse("#ff00a"), None);
        assert_eq!(Color::parse("red;background:url(x)"), None);
        assert_eq!(Color::parse(""), None);
    }

    #[test]
    fn test_from_tag_rejects_unexpected_attributes() {
        assert_eq!(Construct::from_tag(TagKind::Bold, None, Some("x"), false), None);
        assert_eq!(
            Construct::from_tag(TagKind::Quote, Some("wide"), None, true),
            None
        );
        assert_eq!(Construct::from_tag(TagKind::Color, None, None, false), None);
        assert_eq!(
            Construct::from_tag(TagKind::Section, Some("collapsed"), None, true),
            None
        );
    }

    #[test]
    fn test_from_tag_spoiler_placement() {
        assert_eq!(
            Construct::from_tag(TagKind::Spoiler, None, None, true),
            Some(Construct::BlockSpoiler)
        );
        assert_eq!(
            Construct::from_tag(TagKind::Spoiler, None, None, false),
            Some(Construct::InlineSpoiler)
        );
    }

    #[test]
    fn test_section_open_html() {
        let section = Construct::from_tag(TagKind::Section, Some("expanded"), Some(" A & B "), true)
            .unwrap();
        assert_eq!(
            open_html(&section),
            "<details open><summary>A &amp; B</summary><div>"
        );

        let section = Construct::from_tag(TagKind::Section, None, Some(""), true).unwrap();
        assert_eq!(open_html(&section), "<details><summary>Show</summary><div>");
    }

    #[test]
    fn test_heading_html() {
        let heading = Construct::Heading {
            level: 3,
            id: Some("intro"),
        };
        assert_eq!(open_html(&heading), r#"<h3 id="dtext-intro">"#);
        assert_eq!(heading.close_tag(), "</h3>");
    }

    #[test]
    fn test_color_html() {
        let category = Construct::Color(Color::Category("species"));
        assert_eq!(open_html(&category), r#"<span class="dtext-color-species">"#);

        let value = Construct::Color(Color::Value("#123456"));
        assert_eq!(
            open_html(&value),
            r#"<span class="dtext-color" style="color: #123456">"#
        );
        assert_eq!(value.close_tag(), "</span>");
    }

    #[test]
    fn test_classification() {
        assert!(Construct::Quote.is_block());
        assert!(Construct::Quote.is_flow_boundary());
        assert!(!Construct::Quote.accepts_inline());
        assert!(Construct::TableCell.accepts_inline());
        assert!(Construct::TableCell.is_flow_boundary());
        assert!(!Construct::TableRow.accepts_inline());
        assert!(!Construct::List.accepts_inline());
        assert!(Construct::TableRow.is_table_part());
        assert!(!Construct::Table.is_table_part());
        assert!(Construct::ListItem.is_line_scoped());
        assert!(!Construct::Bold.is_block());
        assert!(Construct::Bold.accepts_inline());
        assert_eq!(Construct::Paragraph.kind(), None);
        assert_eq!(Construct::BlockSpoiler.kind(), Some(TagKind::Spoiler));
    }
}
