//! Conversion between the stored markdown dialect and the HTML subset the
//! rich-text editor works with.
//!
//! Supported blocks: `#`/`##`/`###` headings, `- `/`* ` bullet items,
//! `N. ` numbered items and paragraphs (consecutive plain lines, joined with
//! `<br>`). Inline: `**bold**` and `*italic*`. Anything else is literal text.

use maud::{html, Markup, PreEscaped};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

static BOLD_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").expect("valid bold italic pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("valid italic pattern"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").expect("valid ordered item pattern"));
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank run pattern"));
static BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid br pattern"));
static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p\s*>").expect("valid paragraph end pattern"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));
static AMPERSAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+;|#[xX][0-9a-fA-F]+;|[A-Za-z][A-Za-z0-9]*;)?")
        .expect("valid ampersand pattern")
});

/// Elements that never have children or an end tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "wbr", "meta", "link"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug)]
enum Block<'a> {
    Heading(u8, &'a str),
    List(ListKind, Vec<&'a str>),
    Paragraph(Vec<&'a str>),
}

/// Escape, then apply emphasis longest marker first so `***` and `**` are
/// never read as runs of `*`
fn render_inline(text: &str) -> Markup {
    let escaped = escape(text);
    let bold_italic = BOLD_ITALIC.replace_all(&escaped, "<strong><em>$1</em></strong>");
    let bold = BOLD.replace_all(&bold_italic, "<strong>$1</strong>");
    let italic = ITALIC.replace_all(&bold, "<em>$1</em>");
    PreEscaped(italic.into_owned())
}

fn parse_blocks(markdown: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<Block<'_>> = None;

    for raw in markdown.lines() {
        let line = raw.trim();

        if line.is_empty() {
            blocks.extend(open.take());
            continue;
        }

        // Longest marker first so "### x" is never read as "# ## x"
        let heading = [("### ", 3u8), ("## ", 2), ("# ", 1)]
            .into_iter()
            .find_map(|(marker, level)| line.strip_prefix(marker).map(|rest| (level, rest)));
        if let Some((level, text)) = heading {
            blocks.extend(open.take());
            blocks.push(Block::Heading(level, text));
            continue;
        }

        let item = if let Some(caps) = ORDERED_ITEM.captures(line) {
            caps.get(2).map(|m| (ListKind::Ordered, m.as_str()))
        } else {
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(|rest| (ListKind::Unordered, rest))
        };

        match (item, &mut open) {
            (Some((kind, text)), Some(Block::List(open_kind, items))) if *open_kind == kind => {
                items.push(text);
            }
            (Some((kind, text)), _) => {
                blocks.extend(open.take());
                open = Some(Block::List(kind, vec![text]));
            }
            (None, Some(Block::Paragraph(lines))) => {
                lines.push(line);
            }
            (None, _) => {
                blocks.extend(open.take());
                open = Some(Block::Paragraph(vec![line]));
            }
        }
    }

    blocks.extend(open);
    blocks
}

/// Render markdown to the editor's HTML subset.
///
/// Output is a flat run of block tags in document order with no container.
pub fn markdown_to_html(markdown: &str) -> String {
    let blocks = parse_blocks(markdown);

    let markup = html! {
        @for block in &blocks {
            @match block {
                Block::Heading(1, text) => h1 { (render_inline(text)) },
                Block::Heading(2, text) => h2 { (render_inline(text)) },
                Block::Heading(_, text) => h3 { (render_inline(text)) },
                Block::List(ListKind::Unordered, items) => ul {
                    @for item in items { li { (render_inline(item)) } }
                },
                Block::List(ListKind::Ordered, items) => ol {
                    @for item in items { li { (render_inline(item)) } }
                },
                Block::Paragraph(lines) => p {
                    @for (idx, line) in lines.iter().enumerate() {
                        @if idx > 0 { br; }
                        (render_inline(line))
                    }
                },
            }
        }
    };

    markup.into_string()
}

#[derive(Debug, Error)]
enum FragmentError {
    #[error("malformed html: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed html text: {0}")]
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Element { name: String, children: Vec<Node> },
}

fn push_text(children: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    match children.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => children.push(Node::Text(text.to_string())),
    }
}

/// Resolve an entity reference name (without `&` and `;`)
fn resolve_entity(name: &str) -> String {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => name.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    match resolved {
        Some(c) => c.to_string(),
        // Unknown entities stay literal
        None => format!("&{name};"),
    }
}

/// Escape `&` that does not start an entity reference, as browsers read it
fn escape_bare_ampersands(html: &str) -> Cow<'_, str> {
    AMPERSAND.replace_all(html, |caps: &Captures<'_>| match caps.get(1) {
        Some(_) => caps[0].to_string(),
        None => "&amp;".to_string(),
    })
}

/// Build a node tree from an HTML fragment.
///
/// Tolerant of editor markup: void elements need no end tag, end tags that
/// match nothing are ignored, and elements left open at the end are closed.
fn parse_fragment(html: &str) -> Result<Vec<Node>, FragmentError> {
    let html = escape_bare_ampersands(html);
    let mut reader = Reader::from_str(&html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    // Root frame has an empty name and is never popped
    let mut stack: Vec<(String, Vec<Node>)> = vec![(String::new(), Vec::new())];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    if let Some((_, children)) = stack.last_mut() {
                        children.push(Node::Element {
                            name,
                            children: Vec::new(),
                        });
                    }
                } else {
                    stack.push((name, Vec::new()));
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if let Some((_, children)) = stack.last_mut() {
                    children.push(Node::Element {
                        name,
                        children: Vec::new(),
                    });
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                let Some(depth) = stack.iter().skip(1).rposition(|(open, _)| *open == name) else {
                    continue;
                };
                // rposition over the skipped iterator is offset by the root
                while stack.len() > depth + 1 {
                    close_frame(&mut stack);
                }
            }
            Event::Text(e) => {
                let decoded = e.decode().map_err(|err| FragmentError::Text(err.to_string()))?;
                let text = unescape(&decoded).map_err(|err| FragmentError::Text(err.to_string()))?;
                if let Some((_, children)) = stack.last_mut() {
                    push_text(children, &text);
                }
            }
            Event::GeneralRef(e) => {
                let decoded = e.decode().map_err(|err| FragmentError::Text(err.to_string()))?;
                let text = resolve_entity(&decoded);
                if let Some((_, children)) = stack.last_mut() {
                    push_text(children, &text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                if let Some((_, children)) = stack.last_mut() {
                    push_text(children, &text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }

    Ok(stack.pop().map(|(_, children)| children).unwrap_or_default())
}

/// Pop the innermost open element and attach it to its parent
fn close_frame(stack: &mut Vec<(String, Vec<Node>)>) {
    if let Some((name, children)) = stack.pop() {
        if let Some((_, parent)) = stack.last_mut() {
            parent.push(Node::Element { name, children });
        }
    }
}

fn render_children(children: &[Node]) -> String {
    children.iter().map(render_node).collect()
}

fn render_list(children: &[Node], ordered: bool) -> String {
    let items: Vec<String> = children
        .iter()
        .filter(|child| matches!(child, Node::Element { name, .. } if name == "li"))
        .enumerate()
        .map(|(idx, li)| {
            let text = render_node(li);
            if ordered {
                format!("{}. {}", idx + 1, text.trim())
            } else {
                format!("- {}", text.trim())
            }
        })
        .collect();
    format!("{}\n\n", items.join("\n"))
}

fn render_node(node: &Node) -> String {
    let (name, children) = match node {
        Node::Text(text) => return text.replace('\u{a0}', " "),
        Node::Element { name, children } => (name.as_str(), children.as_slice()),
    };

    match name {
        "br" => "\n".to_string(),
        "strong" | "b" => format!("**{}**", render_children(children)),
        "em" | "i" => format!("*{}*", render_children(children)),
        "h1" => format!("# {}\n\n", render_children(children).trim()),
        "h2" => format!("## {}\n\n", render_children(children).trim()),
        "h3" => format!("### {}\n\n", render_children(children).trim()),
        "p" => format!("{}\n\n", render_children(children).trim()),
        "li" => render_children(children).trim().to_string(),
        "ul" => render_list(children, false),
        "ol" => render_list(children, true),
        // Unknown wrappers are dropped, their content kept
        _ => render_children(children),
    }
}

/// Collapse runs of 3+ newlines to one blank line and trim the ends
pub fn collapse_blank_lines(text: &str) -> String {
    let unified = text.replace("\r\n", "\n");
    BLANK_RUN.replace_all(&unified, "\n\n").trim().to_string()
}

/// Tag-stripping conversion used when the fragment cannot be parsed.
///
/// Keeps line structure from `<br>` and `</p>` only; headings, emphasis and
/// list markers are lost.
pub fn strip_tags(html: &str) -> String {
    let with_breaks = BREAK_TAG.replace_all(html, "\n");
    let with_paragraphs = PARAGRAPH_END.replace_all(&with_breaks, "\n\n");
    let stripped = ANY_TAG.replace_all(&with_paragraphs, "");
    let text = match unescape(&stripped) {
        Ok(text) => text.into_owned(),
        Err(_) => stripped.into_owned(),
    };
    collapse_blank_lines(&text.replace('\u{a0}', " "))
}

/// Result of converting editor HTML back to markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub markdown: String,

    /// True when the fragment could not be parsed and inline formatting was
    /// dropped by the tag-stripping fallback
    pub degraded: bool,
}

/// Convert editor HTML to markdown, reporting whether the fallback ran
pub fn convert_html(html: &str) -> Converted {
    match parse_fragment(html) {
        Ok(nodes) => Converted {
            markdown: collapse_blank_lines(&render_children(&nodes)),
            degraded: false,
        },
        Err(e) => {
            warn!(error = %e, "Falling back to tag stripping, inline formatting dropped");
            Converted {
                markdown: strip_tags(html),
                degraded: true,
            }
        }
    }
}

/// Convert editor HTML to markdown
pub fn html_to_markdown(html: &str) -> String {
    convert_html(html).markdown
}

/// Heuristic check for content that is already editor HTML.
///
/// True only when the trimmed value starts with `<tag` or `</tag` and ends
/// with `>`. A bare word is markdown. This is a sniff, not a parser.
pub fn looks_like_html(value: &str) -> bool {
    let trimmed = value.trim();
    let Some(rest) = trimmed.strip_prefix('<') else {
        return false;
    };
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) && trimmed.ends_with('>')
}

/// Stored content to editor HTML
pub fn normalize_rich_text(value: &str) -> String {
    if looks_like_html(value) {
        value.to_string()
    } else {
        markdown_to_html(value)
    }
}

/// Editor (or stored) content to markdown for persistence
pub fn normalize_markdown(value: &str) -> String {
    if looks_like_html(value) {
        html_to_markdown(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(markdown: &str) -> String {
        html_to_markdown(&markdown_to_html(markdown))
    }

    #[test]
    fn test_headings() {
        assert_eq!(markdown_to_html("# One"), "<h1>One</h1>");
        assert_eq!(markdown_to_html("## Two"), "<h2>Two</h2>");
        assert_eq!(markdown_to_html("### Three"), "<h3>Three</h3>");
    }

    #[test]
    fn test_heading_precedence() {
        let html = markdown_to_html("### Title");
        assert_eq!(html, "<h3>Title</h3>");
        assert!(!html.contains("<h1>"));
        assert!(!html.contains("<h2>"));
    }

    #[test]
    fn test_heading_needs_space_after_marker() {
        assert_eq!(markdown_to_html("#hashtag"), "<p>#hashtag</p>");
        assert_eq!(markdown_to_html("#### Four"), "<p>#### Four</p>");
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(
            markdown_to_html("- a\n* b"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_ordered_list_discards_source_numbers() {
        assert_eq!(
            markdown_to_html("3. c\n7. d"),
            "<ol><li>c</li><li>d</li></ol>"
        );
        assert_eq!(roundtrip("3. c\n7. d"), "1. c\n2. d");
    }

    #[test]
    fn test_blank_line_splits_lists() {
        let html = markdown_to_html("- a\n- b\n\n- c");
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul><ul><li>c</li></ul>");
        assert_eq!(html.matches("<ul>").count(), 2);
    }

    #[test]
    fn test_list_kind_change_closes_list() {
        assert_eq!(
            markdown_to_html("- a\n1. b\n- c"),
            "<ul><li>a</li></ul><ol><li>b</li></ol><ul><li>c</li></ul>"
        );
    }

    #[test]
    fn test_heading_closes_list() {
        assert_eq!(
            markdown_to_html("- a\n## Next\n- b"),
            "<ul><li>a</li></ul><h2>Next</h2><ul><li>b</li></ul>"
        );
    }

    #[test]
    fn test_paragraph_groups_lines() {
        assert_eq!(
            markdown_to_html("first line\nsecond line\n\nnext"),
            "<p>first line<br>second line</p><p>next</p>"
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(
            markdown_to_html("# T\r\n- a\r\n- b\r\n"),
            "<h1>T</h1><ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_inline_emphasis() {
        assert_eq!(
            markdown_to_html("**bold** and *italic*"),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
        assert_eq!(
            markdown_to_html("- **done** item"),
            "<ul><li><strong>done</strong> item</li></ul>"
        );
    }

    #[test]
    fn test_unmatched_markup_is_literal() {
        assert_eq!(markdown_to_html("2 * 3 = 6"), "<p>2 * 3 = 6</p>");
        assert_eq!(markdown_to_html("**open"), "<p>**open</p>");
    }

    #[test]
    fn test_escaping_before_emphasis() {
        let html = markdown_to_html(r#"<script>alert("x") & 'y'</script>"#);
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert(&quot;x&quot;) &amp; &apos;y&apos;&lt;/script&gt;</p>"
        );

        let html = markdown_to_html("**<b>**");
        assert_eq!(html, "<p><strong>&lt;b&gt;</strong></p>");
    }

    #[test]
    fn test_escaping_never_leaks_markup() {
        let inputs = [
            "# <h1>",
            "- <img src=x onerror=alert(1)>",
            "1. \"quoted\" & 'single'",
            "plain <em>not emphasis</em>",
        ];
        for input in inputs {
            let html = markdown_to_html(input);
            let without_tags = ["h1", "ul", "ol", "li", "p", "strong", "em"]
                .iter()
                .fold(html.clone(), |acc, tag| {
                    acc.replace(&format!("<{tag}>"), "")
                        .replace(&format!("</{tag}>"), "")
                });
            assert!(!without_tags.contains('<'), "{html}");
            assert!(!without_tags.contains('>'), "{html}");
            assert!(!without_tags.contains('"'), "{html}");
            assert!(!without_tags.contains('\''), "{html}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_html(""), "");
        assert_eq!(markdown_to_html("\n\n  \n"), "");
        assert_eq!(html_to_markdown(""), "");
    }

    #[test]
    fn test_html_to_markdown_blocks() {
        let html = "<h1>Title</h1><p>Body with <strong>bold</strong> and <em>em</em></p>\
                    <ul><li>a</li><li>b</li></ul><ol><li>x</li><li>y</li></ol>";
        assert_eq!(
            html_to_markdown(html),
            "# Title\n\nBody with **bold** and *em*\n\n- a\n- b\n\n1. x\n2. y"
        );
    }

    #[test]
    fn test_html_to_markdown_b_and_i_aliases() {
        assert_eq!(html_to_markdown("<p><b>x</b> <i>y</i></p>"), "**x** *y*");
    }

    #[test]
    fn test_html_to_markdown_unwraps_unknown_tags() {
        assert_eq!(
            html_to_markdown(r#"<div class="wrapper"><p>kept <span>inside</span></p></div>"#),
            "kept inside"
        );
    }

    #[test]
    fn test_html_to_markdown_entities() {
        assert_eq!(
            html_to_markdown("<p>Q&amp;A &lt;ok&gt; it&#39;s&nbsp;fine &#x263A;</p>"),
            "Q&A <ok> it's fine \u{263A}"
        );
    }

    #[test]
    fn test_html_to_markdown_bare_ampersand() {
        let converted = convert_html("<p><b>x</b> y & z</p>");
        assert!(!converted.degraded);
        assert_eq!(converted.markdown, "**x** y & z");

        assert_eq!(html_to_markdown("<p>AT&T && R&amp;D &copy</p>"), "AT&T && R&D &copy");
    }

    #[test]
    fn test_bold_italic() {
        assert_eq!(
            markdown_to_html("***both*** and **bold**"),
            "<p><strong><em>both</em></strong> and <strong>bold</strong></p>"
        );
        assert_eq!(roundtrip("***both***"), "***both***");
    }

    #[test]
    fn test_html_to_markdown_line_breaks() {
        assert_eq!(html_to_markdown("<p>one<br>two<br/>three</p>"), "one\ntwo\nthree");
    }

    #[test]
    fn test_html_to_markdown_tolerates_editor_markup() {
        // Paragraph left open, stray end tag, uppercase names
        let html = "<P>first</P><p>second</span><p>third";
        let converted = convert_html(html);
        assert!(!converted.degraded);
        assert!(converted.markdown.starts_with("first\n\nsecond"));
        assert!(converted.markdown.contains("third"));
    }

    #[test]
    fn test_html_to_markdown_list_items_ignore_whitespace_nodes() {
        let html = "<ul>\n  <li><p>a</p></li>\n  <li><p>b</p></li>\n</ul>";
        assert_eq!(html_to_markdown(html), "- a\n- b");
    }

    #[test]
    fn test_html_to_markdown_collapses_blank_lines() {
        let html = "<p>a</p><p></p><p></p><p>b</p>";
        assert_eq!(html_to_markdown(html), "a\n\nb");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("\r\n\na\n\n\n\nb\n\n"), "a\n\nb");
    }

    #[test]
    fn test_strip_tags_fallback() {
        assert_eq!(
            strip_tags("<h2>T</h2><p>a<br>b</p><p><strong>c</strong></p>"),
            "Ta\nb\n\nc"
        );
        assert_eq!(strip_tags("<p>x &amp; y</p>"), "x & y");
    }

    #[test]
    fn test_convert_html_degrades_on_malformed_input() {
        // Tag cut off at the end of input
        let converted = convert_html("<h2>Title</h2><p><strong>bold</strong> text</p><p class=");
        assert!(converted.degraded);
        assert!(converted.markdown.starts_with("Titlebold text"));
        assert!(!converted.markdown.contains("**"));
        assert!(!converted.markdown.contains('#'));
    }

    #[test]
    fn test_roundtrip_canonical_markdown() {
        let inputs = [
            "# Weekly summary\n\nShipped **auth** and *search*.\n\n- fixed bugs\n- wrote docs\n\n1. plan\n2. build",
            "## Risks\n\nNone & nothing <urgent>",
            "### Notes\n\nline one\nline two",
            "- a\n- b\n\n- c",
            "plain text only",
        ];
        for input in inputs {
            assert_eq!(
                collapse_blank_lines(&roundtrip(input)),
                collapse_blank_lines(input),
                "{input}"
            );
        }
    }

    #[test]
    fn test_roundtrip_preserves_structure_of_dense_markdown() {
        let input = "# Title\nIntro **x**\n- a\n- b\n1. c\n## Sub\ntext *y*";
        let html = markdown_to_html(input);
        assert_eq!(markdown_to_html(&html_to_markdown(&html)), html);
    }

    #[test]
    fn test_repeated_roundtrips_are_stable() {
        let mut markdown = "# T\n\n- **a** b\n- *c*\n\n3. x\n\nq & <r>".to_string();
        let first = roundtrip(&markdown);
        for _ in 0..5 {
            markdown = roundtrip(&markdown);
        }
        assert_eq!(markdown, first);
    }

    #[test]
    fn test_html_roundtrip_preserves_structure() {
        let html = "<h2>Plan</h2><p>Do <em>this</em></p><ol><li>one</li><li>two</li></ol>";
        assert_eq!(markdown_to_html(&html_to_markdown(html)), html);
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<p>hi</p>"));
        assert!(looks_like_html("  <h2>x</h2>\n"));
        assert!(looks_like_html("</p>"));
        assert!(!looks_like_html("# hi"));
        assert!(!looks_like_html("hi"));
        assert!(!looks_like_html(""));
        assert!(!looks_like_html("<3 you>"));
        assert!(!looks_like_html("text <b>bold</b>"));
        assert!(!looks_like_html("<p>unterminated"));
    }

    #[test]
    fn test_normalize_rich_text() {
        assert_eq!(normalize_rich_text("<p>hi</p>"), "<p>hi</p>");
        assert_eq!(normalize_rich_text("# hi"), "<h1>hi</h1>");
        assert_eq!(normalize_rich_text(""), "");
    }

    #[test]
    fn test_normalize_markdown() {
        assert_eq!(normalize_markdown("<h3>x</h3><p>y</p>"), "### x\n\ny");
        assert_eq!(normalize_markdown("- already markdown"), "- already markdown");
    }
}
