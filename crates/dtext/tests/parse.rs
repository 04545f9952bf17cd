//! End-to-end tests for the public parse API.

use dtext::{Error, Options, ParseResult, parse, parse_bytes};
use pretty_assertions::assert_eq;

fn site() -> Options {
    Options::new()
        .with_base_url("https://example.com")
        .with_domain("example.com")
        .with_internal_domain("static.example.com")
}

fn render(text: &str) -> ParseResult {
    parse(text, &site()).unwrap()
}

/// Check that every engine tag in `html` is closed in LIFO order.
fn assert_well_formed(html: &str) {
    const VOID: &[&str] = &["br", "hr"];
    let mut open: Vec<String> = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            panic!("unterminated tag in {html}");
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];
        if let Some(name) = tag.strip_prefix('/') {
            assert_eq!(open.pop().as_deref(), Some(name), "crossed tags in {html}");
        } else {
            let name = tag.split_whitespace().next().unwrap_or_default();
            if !VOID.contains(&name) {
                open.push(name.to_owned());
            }
        }
    }
    assert!(open.is_empty(), "unclosed {open:?} in {html}");
}

#[test]
fn test_bold_example() {
    assert_eq!(render("[b]hello[/b]").html, "<p><strong>hello</strong></p>");
}

#[test]
fn test_post_reference_example() {
    let result = render("post #42");
    assert_eq!(result.post_ids, vec![42]);
    assert_eq!(
        result.html,
        "<p><a class=\"dtext-link dtext-id-link dtext-post-id-link\" href=\"https://example.com/posts/42\">post #42</a></p>"
    );
}

#[test]
fn test_tag_reference_example() {
    assert_eq!(render("[[tag_name]]").qtags, vec!["tag_name"]);
}

#[test]
fn test_unterminated_example() {
    let result = render("[b]unterminated");
    assert_eq!(result.html, "<p>[b]unterminated</p>");
}

#[test]
fn test_references_in_order() {
    let result = render("@alice, post #3 and post #1 then @bob @alice post #3 [[Blue Sky]] [[blue_sky|again]]");
    assert_eq!(result.creators, vec!["alice", "bob"]);
    assert_eq!(result.post_ids, vec![3, 1, 3]);
    assert_eq!(result.qtags, vec!["blue_sky"]);
}

#[test]
fn test_escaping_of_user_text() {
    let result = render("<img src=x onerror=alert(1)> & \"quotes\" 'single'");
    assert!(!result.html.contains("<img"));
    assert_eq!(
        result.html,
        "<p>&lt;img src=x onerror=alert(1)&gt; &amp; &quot;quotes&quot; &#39;single&#39;</p>"
    );
}

#[test]
fn test_escaping_inside_attributes() {
    let result = render("[section=\"><script>]x[/section]");
    assert!(!result.html.contains("<script>"));
    assert_well_formed(&result.html);
}

#[test]
fn test_well_formed_under_malformed_input() {
    let inputs = [
        "[b][i]x[/b][/i]",
        "[quote][b]x[/quote][/b]",
        "[table][tr][td]a[b]b[/td][/tr][/table][/b]",
        "* a [b]b\n** c[/b]\nd",
        "h1. [spoiler]x\n[/spoiler]",
        "[section][quote][spoiler]x[/section][/quote][/spoiler]",
        "[/b][/i][/quote][/table]",
        "[code][b][/code][/b]",
        "[[[[x]]]] {{y}} \"z\":[/a] <https://a.com",
        "\n\n\n[b]\n\n\n[/b]\n\n",
    ];
    for input in inputs {
        assert_well_formed(&render(input).html);
    }
}

#[test]
fn test_closers_next_to_other_constructs() {
    let cases = [
        ("[i]Movie[/i](2019) rest", "<p><em>Movie</em>(2019) rest</p>"),
        ("[b]Note[/b](1) more text", "<p><strong>Note</strong>(1) more text</p>"),
        (
            "[b]\"go\":/wiki[/b]",
            "<p><strong><a class=\"dtext-link\" href=\"https://example.com/wiki\">go</a></strong></p>",
        ),
        (
            "[b]x[/b][[wolf]]",
            "<p><strong>x</strong><a class=\"dtext-link dtext-wiki-link\" href=\"https://example.com/tags/wolf\">wolf</a></p>",
        ),
    ];
    for (text, html) in cases {
        assert_eq!(render(text).html, html, "rendering {text}");
    }
}

#[test]
fn test_hidden_closers_leave_opener_literal() {
    let cases = [
        (r"[b]x \[/b]", "<p>[b]x [/b]</p>"),
        (
            "[b]see `[/b]` then more",
            "<p>[b]see <code>[/b]</code> then more</p>",
        ),
        ("[b]x [code][/b][/code]", "<p>[b]x </p><pre>[/b]</pre>"),
        ("[b]a[nodtext][/b][/nodtext]", "<p>[b]a[/b]</p>"),
        (
            "[i]x \"t\":[/i] y",
            "<p>[i]x <a class=\"dtext-link\" href=\"https://example.com/i\">t</a> y</p>",
        ),
    ];
    for (text, html) in cases {
        assert_eq!(render(text).html, html, "rendering {text}");
    }
}

#[test]
fn test_deep_nesting_stays_well_formed() {
    let text = format!("{}x{}", "[quote]".repeat(2_000), "[/quote]".repeat(2_000));
    assert_well_formed(&render(&text).html);
}

#[test]
fn test_determinism() {
    let text = "h2. Notes\n* [b]one[/b] post #1\n* @two https://a.net/x\n\n[quote]three[/quote]";
    assert_eq!(render(text), render(text));
}

#[test]
fn test_color_flag_gating() {
    let text = "[color=red]x[/color]";
    assert_eq!(render(text).html, "<p>[color=red]x[/color]</p>");

    let options = site().allow_color(true);
    assert_eq!(
        parse(text, &options).unwrap().html,
        "<p><span class=\"dtext-color\" style=\"color: red\">x</span></p>"
    );
    assert_eq!(
        parse("[color=Species]x[/color]", &options).unwrap().html,
        "<p><span class=\"dtext-color-species\">x</span></p>"
    );
}

#[test]
fn test_quick_tag_flag_gating() {
    let text = "{{Red Panda}}";
    let result = render(text);
    assert_eq!(result.html, "<p>{{Red Panda}}</p>");
    assert!(result.qtags.is_empty());

    let options = site().allow_quick_tags(true);
    let result = parse(text, &options).unwrap();
    assert_eq!(
        result.html,
        "<p><a class=\"dtext-link dtext-qtag-link\" href=\"https://example.com/q/red_panda\">Red Panda</a></p>"
    );
    assert_eq!(result.qtags, vec!["red_panda"]);
}

#[test]
fn test_domain_classification() {
    let result = render(
        "https://example.com/posts https://static.example.com/a.png https://other.net/page",
    );
    assert_eq!(result.external_links, vec!["https://other.net/page"]);
    assert_eq!(result.html.matches("dtext-external-link").count(), 1);
    assert_eq!(result.html.matches("rel=\"external nofollow noreferrer\"").count(), 1);
}

#[test]
fn test_quoted_and_markdown_links() {
    let result = render("\"help\":/wiki_pages/help and [search](/posts?tags=a)");
    assert_eq!(
        result.html,
        "<p><a class=\"dtext-link\" href=\"https://example.com/wiki_pages/help\">help</a> and <a class=\"dtext-link\" href=\"https://example.com/posts?tags=a\">search</a></p>"
    );
}

#[test]
fn test_inline_mode() {
    let options = site().inline(true);
    let result = parse("one\ntwo [b]three[/b]", &options).unwrap();
    assert_eq!(result.html, "one<br>two <strong>three</strong>");
}

#[test]
fn test_section_and_code() {
    let result = render("[section,expanded=Details]\ninside\n[/section]\n[code=ruby]\nputs 1 < 2\n[/code]");
    assert_eq!(
        result.html,
        "<details open><summary>Details</summary><div><p>inside</p></div></details><pre class=\"language-ruby\">puts 1 &lt; 2</pre>"
    );
}

#[test]
fn test_nodtext_and_escapes() {
    assert_eq!(
        render("[nodtext][b]x[/b] post #1[/nodtext] \\@me").html,
        "<p>[b]x[/b] post #1 @me</p>"
    );
}

#[test]
fn test_parse_bytes_accepts_ascii_and_utf8() {
    let result = parse_bytes(b"[i]ascii[/i]", &site()).unwrap();
    assert_eq!(result.html, "<p><em>ascii</em></p>");
    let result = parse_bytes("[i]ünïcode[/i]".as_bytes(), &site()).unwrap();
    assert_eq!(result.html, "<p><em>ünïcode</em></p>");
}

#[test]
fn test_invalid_input_errors() {
    assert_eq!(parse_bytes(b"\xff", &site()), Err(Error::InvalidUtf8));
    assert_eq!(parse("x\0y", &site()), Err(Error::NullByte));
    let options = site().with_internal_domain("bad\0");
    assert_eq!(
        parse("x", &options),
        Err(Error::OptionNullByte {
            field: "internal_domains"
        })
    );
}

#[test]
fn test_empty_input() {
    assert_eq!(render(""), ParseResult::default());
}
