//! Markup renderer
//!
//! Turns a token tree into nested `<span>` fragments. Every token becomes
//! a wrapper `md-<type>` (plus `md-<type>-<level>` where a level applies)
//! holding `md-<type>-marker`, `md-<type>-content` and named metadata
//! children, so a consumer can dim delimiters while styling content.

use tracing::warn;

use super::registry::PatternRegistry;
use super::tokenizer::tokenize;
use super::tokens::{PartRole, Token, TokenKind};
use crate::error::Result;

/// Prefix of every class the renderer emits
pub const CLASS_PREFIX: &str = "md-";

/// Substring whose presence marks text as already rendered
pub const RENDERED_MARKER: &str = "class=\"md-";

/// Heuristic check for output of a previous pass
pub fn is_rendered(content: &str) -> bool {
    content.contains(RENDERED_MARKER)
}

/// Render markdown into markup
///
/// Input that already carries rendered markup is returned unchanged, so
/// rendering twice never nests fragments inside fragments.
pub fn render(registry: &PatternRegistry, content: &str) -> Result<String> {
    if is_rendered(content) {
        warn!(
            target: "mdlive::render",
            len = content.len(),
            "input already contains rendered markup, returning it unchanged"
        );
        return Ok(content.to_string());
    }
    let tokens = tokenize(registry, content)?;
    Ok(render_tokens(&tokens))
}

/// Render a token tree produced by `tokenize`
pub fn render_tokens(tokens: &[Token<'_>]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.raw_match.len()).sum::<usize>() * 2);
    for token in tokens {
        write_token(&mut out, token);
    }
    out
}

fn write_token(out: &mut String, token: &Token<'_>) {
    if token.kind == TokenKind::Text {
        escape_into(out, token.raw_match);
        return;
    }

    let class = token.token_type().class_name();
    out.push_str("<span class=\"");
    out.push_str(CLASS_PREFIX);
    out.push_str(class);
    if let Some(level) = token.level() {
        out.push(' ');
        out.push_str(CLASS_PREFIX);
        out.push_str(class);
        out.push('-');
        out.push_str(&level.to_string());
    }
    out.push_str("\">");

    for part in &token.parts {
        let text = token.part_text(part);
        match part.role {
            PartRole::Plain => escape_into(out, text),
            PartRole::Marker => {
                open_span(out, class, "marker");
                escape_into(out, text);
                out.push_str("</span>");
            }
            PartRole::Meta(name) => {
                open_span(out, class, name);
                escape_into(out, text);
                out.push_str("</span>");
            }
            PartRole::Content => {
                open_span(out, class, "content");
                if token.children.is_empty() {
                    escape_into(out, text);
                } else {
                    for child in &token.children {
                        write_token(out, child);
                    }
                }
                out.push_str("</span>");
            }
        }
    }
    out.push_str("</span>");
}

fn open_span(out: &mut String, class: &str, suffix: &str) {
    out.push_str("<span class=\"");
    out.push_str(CLASS_PREFIX);
    out.push_str(class);
    out.push('-');
    out.push_str(suffix);
    out.push_str("\">");
}

/// Escape text for inclusion in markup
///
/// `<` and `>` are always escaped. `&` is escaped unless it already begins
/// an entity reference, which makes escaping idempotent.
pub fn escape_into(out: &mut String, text: &str) {
    let mut last = 0;
    for (idx, ch) in text.char_indices() {
        let replacement = match ch {
            '<' => "&lt;",
            '>' => "&gt;",
            '&' if !starts_entity(&text[idx + 1..]) => "&amp;",
            _ => continue,
        };
        out.push_str(&text[last..idx]);
        out.push_str(replacement);
        last = idx + 1;
    }
    out.push_str(&text[last..]);
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

/// Whether `rest` (the text after an `&`) is a named or numeric entity body
fn starts_entity(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    let (body, max_len): (&[u8], usize) = match bytes {
        [b'#', b'x' | b'X', tail @ ..] => {
            let len = tail.iter().take_while(|b| b.is_ascii_hexdigit()).count();
            return (1..=6).contains(&len) && tail.get(len) == Some(&b';');
        }
        [b'#', tail @ ..] => (tail, 7),
        [first, ..] if first.is_ascii_alphabetic() => (bytes, 32),
        _ => return false,
    };

    let numeric = bytes[0] == b'#';
    let len = body
        .iter()
        .take_while(|b| if numeric { b.is_ascii_digit() } else { b.is_ascii_alphanumeric() })
        .count();
    (1..=max_len).contains(&len) && body.get(len) == Some(&b';')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PatternRegistry {
        PatternRegistry::markdown().unwrap()
    }

    #[test]
    fn test_bold_fragment() {
        let out = render(&registry(), "**hi**").unwrap();
        assert_eq!(
            out,
            "<span class=\"md-bold\">\
             <span class=\"md-bold-marker\">**</span>\
             <span class=\"md-bold-content\">hi</span>\
             <span class=\"md-bold-marker\">**</span>\
             </span>"
        );
    }

    #[test]
    fn test_header_fragment_has_level() {
        let out = render(&registry(), "## Notes").unwrap();
        assert!(out.starts_with("<span class=\"md-header md-header-2\">"));
        assert!(out.contains("<span class=\"md-header-marker\">##</span> "));
        assert!(out.contains("<span class=\"md-header-content\">Notes</span>"));
    }

    #[test]
    fn test_link_metadata() {
        let out = render(&registry(), "[site](https://a.b)").unwrap();
        assert!(out.contains("<span class=\"md-link-content\">site</span>"));
        assert!(out.contains("<span class=\"md-link-url\">https://a.b</span>"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let inputs = [
            "# Title\n\n**bold** and *it* with `x < y`\n",
            "plain text & more <angle>",
            "> quote\n- [a](b)\n| c | d |",
            "",
        ];
        for input in inputs {
            let once = render(&registry(), input).unwrap();
            let twice = render(&registry(), &once).unwrap();
            assert_eq!(once, twice, "input: {input:?}");
        }
    }

    #[test]
    fn test_code_contents_not_reinterpreted() {
        let out = render(&registry(), "`[x](y) **z**`").unwrap();
        assert!(!out.contains("md-link"));
        assert!(!out.contains("md-bold"));
        assert!(out.contains("<span class=\"md-code-inline-content\">[x](y) **z**</span>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape("&amp; &#39; &#x1F600; &copy;"), "&amp; &#39; &#x1F600; &copy;");
        assert_eq!(escape("AT&T rocks &#; &#xZ;"), "AT&amp;T rocks &amp;#; &amp;#xZ;");
        assert_eq!(escape(&escape("x < & y")), escape("x < & y"));
    }

    #[test]
    fn test_is_rendered() {
        assert!(is_rendered("<span class=\"md-bold\">x</span>"));
        assert!(!is_rendered("**x**"));
    }
}
