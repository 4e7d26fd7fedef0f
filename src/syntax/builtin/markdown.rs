//! Markdown token grammar
//!
//! One regex and one extractor per token type. The regexes run over the
//! whole document, so line-anchored constructs use multi-line mode.

use regex::{Captures, Match};

use crate::error::{HighlightError, Result};
use crate::syntax::rules::{first_group, group, Parts, PatternDefinition};
use crate::syntax::tokens::{LinkTarget, Part, PartRole, Token, TokenKind, TokenType};

/// Columns a tab advances when measuring indentation
const TAB_WIDTH: usize = 4;

// The closing fence is only ever preceded by a newline, which keeps it at
// the start of a line. Unterminated fences never match.
const CODE_BLOCK: &str = r"(?m)^(```)([^\s`]*)([^\n]*\n)(?:((?s:.*?))\n)?(```)[ \t\r]*$";
const CODE_INLINE: &str = r"(`)([^`\n]+)(`)";
const HEADER: &str = r"(?m)^(#{1,6})[ \t]+([^\n]*?)[ \t\r]*$";
const BOLD: &str = r"(\*\*)([^\s*](?:[^\n]*?[^\s*])?)(\*\*)|\b(__)([^\s_](?:[^\n]*?[^\s_])?)(__)\b";
const ITALIC: &str = r"(\*)([^\s*](?:[^*\n]*?[^\s*])?)(\*)|\b(_)([^\s_](?:[^_\n]*?[^\s_])?)(_)\b";
const STRIKETHROUGH: &str = r"(~~)([^\s~](?:[^~\n]*?[^\s~])?)(~~)";
const LINK: &str =
    r#"(!?\[)([^\]\n]*)(?:(\]\()([^)\s]*(?:[ \t]+"[^"\n]*")?)(\))|(\]\[)([^\]\n]*)(\]))"#;
const BLOCKQUOTE: &str = r"(?m)^([ \t]*)((?:>[ \t]?)+)([^\n\r]*)\r?$";
const LIST: &str = r"(?m)^([ \t]*)([-*+]|\d{1,9}[.)])([ \t]+)([^\n\r]*)\r?$";
const TABLE: &str = r"(?m)^([ \t]*)(\|)([^\n\r]*)(\|)[ \t\r]*$";

/// Build the markdown patterns in processing order
pub fn markdown_patterns() -> Result<Vec<PatternDefinition>> {
    Ok(vec![
        PatternDefinition::new("code_block", TokenType::CodeBlock, CODE_BLOCK, extract_code_block)?,
        PatternDefinition::new("code_inline", TokenType::CodeInline, CODE_INLINE, extract_code_inline)?,
        PatternDefinition::new("header", TokenType::Header, HEADER, extract_header)?,
        PatternDefinition::new("bold", TokenType::Bold, BOLD, extract_bold)?,
        PatternDefinition::new("italic", TokenType::Italic, ITALIC, extract_italic)?,
        PatternDefinition::new(
            "strikethrough",
            TokenType::Strikethrough,
            STRIKETHROUGH,
            extract_strikethrough,
        )?,
        PatternDefinition::new("link", TokenType::Link, LINK, extract_link)?,
        PatternDefinition::new("blockquote", TokenType::Blockquote, BLOCKQUOTE, extract_blockquote)?,
        PatternDefinition::new("list", TokenType::List, LIST, extract_list)?,
        PatternDefinition::new("table", TokenType::Table, TABLE, extract_table)?,
    ])
}

fn token<'h>(kind: TokenKind<'h>, whole: Match<'h>, parts: Vec<Part>) -> Token<'h> {
    Token {
        kind,
        raw_match: whole.as_str(),
        range: whole.range(),
        parts,
        children: Vec::new(),
    }
}

fn indent_width(indent: &str) -> usize {
    indent
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn extract_code_block<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    const NAME: &str = "code_block";
    let whole = group(caps, 0, NAME)?;
    let open = group(caps, 1, NAME)?;
    let language = group(caps, 2, NAME)?;
    let info = group(caps, 3, NAME)?;
    let body = caps.get(4);
    let close = group(caps, 5, NAME)?;

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Marker, open.end())
        .push(PartRole::Meta("language"), language.end())
        .push(PartRole::Plain, info.end())
        .push(PartRole::Content, body.map_or(info.end(), |m| m.end()))
        .push(PartRole::Plain, close.start());
    let parts = parts.finish(PartRole::Marker, NAME)?;

    let kind = TokenKind::CodeBlock {
        language: Some(language.as_str()).filter(|lang| !lang.is_empty()),
        content: body.map_or("", |m| m.as_str()),
    };
    Ok(token(kind, whole, parts))
}

fn extract_code_inline<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    const NAME: &str = "code_inline";
    let whole = group(caps, 0, NAME)?;
    let content = group(caps, 2, NAME)?;

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Marker, content.start())
        .push(PartRole::Content, content.end());
    let parts = parts.finish(PartRole::Marker, NAME)?;

    Ok(token(TokenKind::CodeInline { content: content.as_str() }, whole, parts))
}

fn extract_header<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    const NAME: &str = "header";
    let whole = group(caps, 0, NAME)?;
    let hashes = group(caps, 1, NAME)?;
    let content = group(caps, 2, NAME)?;

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Marker, hashes.end())
        .push(PartRole::Plain, content.start())
        .push(PartRole::Content, content.end());
    let parts = parts.finish(PartRole::Plain, NAME)?;

    let kind = TokenKind::Header {
        level: hashes.as_str().len() as u8,
        content: content.as_str(),
    };
    Ok(token(kind, whole, parts))
}

/// Shared shape of bold, italic and strikethrough matches
///
/// Returns (delimiter, content) after tiling marker/content/marker parts.
fn delimited<'h>(
    caps: &Captures<'h>,
    name: &'static str,
    open_groups: &[usize],
    content_groups: &[usize],
) -> Result<(Match<'h>, Match<'h>, Match<'h>, Vec<Part>)> {
    let whole = group(caps, 0, name)?;
    let open = first_group(caps, open_groups)
        .ok_or_else(|| HighlightError::extract(name, "no delimiter alternative matched"))?;
    let content = first_group(caps, content_groups)
        .ok_or_else(|| HighlightError::extract(name, "no content alternative matched"))?;

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Marker, open.end())
        .push(PartRole::Content, content.end());
    let parts = parts.finish(PartRole::Marker, name)?;
    Ok((whole, open, content, parts))
}

fn extract_bold<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    let (whole, open, content, parts) = delimited(caps, "bold", &[1, 4], &[2, 5])?;
    let kind = TokenKind::Bold {
        content: content.as_str(),
        delimiter: open.as_str(),
    };
    Ok(token(kind, whole, parts))
}

fn extract_italic<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    let (whole, open, content, parts) = delimited(caps, "italic", &[1, 4], &[2, 5])?;
    let kind = TokenKind::Italic {
        content: content.as_str(),
        delimiter: open.as_str(),
    };
    Ok(token(kind, whole, parts))
}

fn extract_strikethrough<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    let (whole, open, content, parts) = delimited(caps, "strikethrough", &[1], &[2])?;
    let kind = TokenKind::Strikethrough {
        content: content.as_str(),
        delimiter: open.as_str(),
    };
    Ok(token(kind, whole, parts))
}

fn extract_link<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    const NAME: &str = "link";
    let whole = group(caps, 0, NAME)?;
    let open = group(caps, 1, NAME)?;
    let text = group(caps, 2, NAME)?;

    // Inline form fills groups 3-5, reference form fills 6-8
    let (separator, target, meta) = match (caps.get(3), caps.get(4), caps.get(6), caps.get(7)) {
        (Some(sep), Some(url), _, _) => (sep, LinkTarget::Url(url.as_str()), ("url", url)),
        (_, _, Some(sep), Some(reference)) => (
            sep,
            LinkTarget::Reference(reference.as_str()),
            ("ref", reference),
        ),
        _ => return Err(HighlightError::extract(NAME, "neither url nor reference matched")),
    };

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Marker, open.end())
        .push(PartRole::Content, text.end())
        .push(PartRole::Marker, separator.end())
        .push(PartRole::Meta(meta.0), meta.1.end());
    let parts = parts.finish(PartRole::Marker, NAME)?;

    let kind = TokenKind::Link {
        text: text.as_str(),
        target,
        image: open.as_str().starts_with('!'),
    };
    Ok(token(kind, whole, parts))
}

fn extract_blockquote<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    const NAME: &str = "blockquote";
    let whole = group(caps, 0, NAME)?;
    let indent = group(caps, 1, NAME)?;
    let markers = group(caps, 2, NAME)?;
    let content = group(caps, 3, NAME)?;

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Plain, indent.end())
        .push(PartRole::Marker, markers.end())
        .push(PartRole::Content, content.end());
    let parts = parts.finish(PartRole::Plain, NAME)?;

    let kind = TokenKind::Blockquote {
        level: markers.as_str().matches('>').count(),
        indent: indent_width(indent.as_str()),
        content: content.as_str(),
    };
    Ok(token(kind, whole, parts))
}

fn extract_list<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    const NAME: &str = "list";
    let whole = group(caps, 0, NAME)?;
    let indent = group(caps, 1, NAME)?;
    let marker = group(caps, 2, NAME)?;
    let gap = group(caps, 3, NAME)?;
    let content = group(caps, 4, NAME)?;

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Plain, indent.end())
        .push(PartRole::Marker, marker.end())
        .push(PartRole::Plain, gap.end())
        .push(PartRole::Content, content.end());
    let parts = parts.finish(PartRole::Plain, NAME)?;

    let kind = TokenKind::List {
        indent_depth: indent_width(indent.as_str()) / 2,
        marker: marker.as_str(),
        content: content.as_str(),
    };
    Ok(token(kind, whole, parts))
}

fn extract_table<'h>(caps: &Captures<'h>) -> Result<Token<'h>> {
    const NAME: &str = "table";
    let whole = group(caps, 0, NAME)?;
    let indent = group(caps, 1, NAME)?;
    let open = group(caps, 2, NAME)?;
    let content = group(caps, 3, NAME)?;
    let close = group(caps, 4, NAME)?;

    let mut parts = Parts::new(whole.range());
    parts
        .push(PartRole::Plain, indent.end())
        .push(PartRole::Marker, open.end())
        .push(PartRole::Content, content.end())
        .push(PartRole::Marker, close.end());
    let parts = parts.finish(PartRole::Plain, NAME)?;

    Ok(token(TokenKind::Table { content: content.as_str() }, whole, parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_token<'h>(token_type: TokenType, text: &'h str) -> Option<Token<'h>> {
        let patterns = markdown_patterns().unwrap();
        let pattern = patterns.iter().find(|p| p.token_type == token_type)?;
        let caps = pattern.captures_at(text, 0)?;
        Some(pattern.extract(&caps).unwrap())
    }

    fn assert_tiles(token: &Token<'_>) {
        let joined: String = token.parts.iter().map(|p| token.part_text(p)).collect();
        assert_eq!(joined, token.raw_match);
    }

    #[test]
    fn test_header_levels() {
        let token = first_token(TokenType::Header, "# Title").unwrap();
        assert_eq!(token.kind, TokenKind::Header { level: 1, content: "Title" });
        assert_tiles(&token);

        let token = first_token(TokenType::Header, "intro\n### Deep  \nmore").unwrap();
        assert_eq!(token.kind, TokenKind::Header { level: 3, content: "Deep" });
        assert_eq!(token.raw_match, "### Deep  ");

        assert!(first_token(TokenType::Header, "#hashtag").is_none());
        assert!(first_token(TokenType::Header, "####### seven").is_none());
    }

    #[test]
    fn test_code_block() {
        let text = "```rust\nfn main() {}\n```\n";
        let token = first_token(TokenType::CodeBlock, text).unwrap();
        assert_eq!(
            token.kind,
            TokenKind::CodeBlock { language: Some("rust"), content: "fn main() {}" }
        );
        assert_eq!(token.raw_match, "```rust\nfn main() {}\n```");
        assert_tiles(&token);
    }

    #[test]
    fn test_empty_and_unterminated_code_block() {
        let token = first_token(TokenType::CodeBlock, "```\n```").unwrap();
        assert_eq!(token.kind, TokenKind::CodeBlock { language: None, content: "" });
        assert_tiles(&token);

        assert!(first_token(TokenType::CodeBlock, "```js\nlet x = 1;\n").is_none());
    }

    #[test]
    fn test_bold_alternatives() {
        let token = first_token(TokenType::Bold, "a **strong** b").unwrap();
        assert_eq!(token.kind, TokenKind::Bold { content: "strong", delimiter: "**" });

        let token = first_token(TokenType::Bold, "a __strong__ b").unwrap();
        assert_eq!(token.kind, TokenKind::Bold { content: "strong", delimiter: "__" });
        assert_tiles(&token);

        assert!(first_token(TokenType::Bold, "snake__case__name").is_none());
        assert!(first_token(TokenType::Bold, "** loose **").is_none());
    }

    #[test]
    fn test_italic_delimiters() {
        // The opening `*` of `**` can never start an italic span
        let token = first_token(TokenType::Italic, "**bold**").unwrap();
        assert_eq!(token.range, 1..7);
        let token = first_token(TokenType::Italic, "an *aside* here").unwrap();
        assert_eq!(token.kind, TokenKind::Italic { content: "aside", delimiter: "*" });
        assert!(first_token(TokenType::Italic, "snake_case_name").is_none());
    }

    #[test]
    fn test_links() {
        let token = first_token(TokenType::Link, "see [docs](https://x.dev \"Docs\")").unwrap();
        assert_eq!(
            token.kind,
            TokenKind::Link {
                text: "docs",
                target: LinkTarget::Url("https://x.dev \"Docs\""),
                image: false,
            }
        );
        assert_tiles(&token);

        let token = first_token(TokenType::Link, "![logo][img]").unwrap();
        assert_eq!(
            token.kind,
            TokenKind::Link { text: "logo", target: LinkTarget::Reference("img"), image: true }
        );
        assert!(token.parts.iter().any(|p| p.role == PartRole::Meta("ref")));
    }

    #[test]
    fn test_blockquote_and_list() {
        let token = first_token(TokenType::Blockquote, "  > > nested").unwrap();
        assert_eq!(
            token.kind,
            TokenKind::Blockquote { level: 2, indent: 2, content: "nested" }
        );
        assert_tiles(&token);

        let token = first_token(TokenType::List, "\t- item").unwrap();
        assert_eq!(
            token.kind,
            TokenKind::List { indent_depth: 2, marker: "-", content: "item" }
        );
        let token = first_token(TokenType::List, "12. twelfth").unwrap();
        assert_eq!(token.level(), Some(0));
        assert!(first_token(TokenType::List, "---").is_none());
    }

    #[test]
    fn test_table_row() {
        let token = first_token(TokenType::Table, "| a | b |").unwrap();
        assert_eq!(token.kind, TokenKind::Table { content: " a | b " });
        assert_tiles(&token);
        assert!(first_token(TokenType::Table, "a | b").is_none());
    }
}
