//! Terminal preview using crossterm
//!
//! Paints a token tree with ANSI styling instead of emitting markup.
//! Styles nest: a bold span inside a header keeps the header color.

use std::io::Write;

use crossterm::{
    queue,
    style::{self, Attribute, Print, SetAttribute, SetForegroundColor},
};

use crate::error::Result;
use crate::syntax::{tokenize, Color, PartRole, PatternRegistry, Style, Token, TokenKind};
use crate::viewport::{ViewportExtractor, ViewportInfo};

/// Convert a style color to a crossterm color
fn to_crossterm(color: Color) -> Option<style::Color> {
    match color {
        Color::Default => None,
        Color::Red => Some(style::Color::DarkRed),
        Color::Green => Some(style::Color::DarkGreen),
        Color::Yellow => Some(style::Color::DarkYellow),
        Color::Blue => Some(style::Color::DarkBlue),
        Color::Magenta => Some(style::Color::DarkMagenta),
        Color::Cyan => Some(style::Color::DarkCyan),
        Color::BrightBlack => Some(style::Color::DarkGrey),
        Color::BrightBlue => Some(style::Color::Blue),
    }
}

/// Tokenize `content` and paint it to `out`
pub fn preview<W: Write>(out: &mut W, registry: &PatternRegistry, content: &str) -> Result<()> {
    let tokens = tokenize(registry, content)?;
    print_tokens(out, &tokens)?;
    out.flush()?;
    Ok(())
}

/// Paint a whole document, narrowing large ones to the viewport
///
/// Lines outside the extracted slice are printed unstyled, so the output
/// always covers every line of `content`.
pub fn preview_document<W: Write>(
    out: &mut W,
    registry: &PatternRegistry,
    extractor: &ViewportExtractor,
    content: &str,
    viewport: Option<ViewportInfo>,
) -> Result<()> {
    let lines: Vec<&str> = content.split('\n').collect();
    let extraction = extractor.extract(&lines, viewport);
    if extraction.is_full(lines.len()) {
        return preview(out, registry, content);
    }

    for line in &lines[..extraction.start_line_index] {
        queue!(out, Print(line), Print('\n'))?;
    }
    let tokens = tokenize(registry, &extraction.content)?;
    print_tokens(out, &tokens)?;
    for line in &lines[extraction.end_line_index + 1..] {
        queue!(out, Print('\n'), Print(line))?;
    }
    out.flush()?;
    Ok(())
}

/// Paint a token tree produced by `tokenize`
pub fn print_tokens<W: Write>(out: &mut W, tokens: &[Token<'_>]) -> Result<()> {
    for token in tokens {
        print_token(out, token, Style::default())?;
    }
    Ok(())
}

fn print_token<W: Write>(out: &mut W, token: &Token<'_>, base: Style) -> Result<()> {
    if token.kind == TokenKind::Text {
        return print_styled(out, token.raw_match, base);
    }

    let token_type = token.token_type();
    for part in &token.parts {
        let part_style = base.merge(Style::for_part(token_type, part.role));
        if part.role == PartRole::Content && !token.children.is_empty() {
            for child in &token.children {
                print_token(out, child, part_style)?;
            }
        } else {
            print_styled(out, token.part_text(part), part_style)?;
        }
    }
    Ok(())
}

fn print_styled<W: Write>(out: &mut W, text: &str, style: Style) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    if style.is_default() {
        queue!(out, Print(text))?;
        return Ok(());
    }

    if let Some(color) = to_crossterm(style.fg) {
        queue!(out, SetForegroundColor(color))?;
    }
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if style.strikethrough {
        queue!(out, SetAttribute(Attribute::CrossedOut))?;
    }
    queue!(out, Print(text), SetAttribute(Attribute::Reset))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(content: &str) -> String {
        let registry = PatternRegistry::markdown().unwrap();
        let mut out = Vec::new();
        preview(&mut out, &registry, content).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_text_is_unstyled() {
        assert_eq!(painted("just words"), "just words");
    }

    #[test]
    fn test_bold_is_styled() {
        let out = painted("a **b** c");
        assert!(out.starts_with("a "));
        assert!(out.ends_with(" c"));
        assert!(out.contains("\x1b["));
        assert!(out.contains('b'));
    }

    #[test]
    fn test_text_is_preserved() {
        let content = "# Head *it*\n- item `code`\n> quote";
        let out = painted(content);
        let stripped = strip_ansi(&out);
        assert_eq!(stripped, content);
    }

    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == '\x1b' {
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            } else {
                out.push(ch);
            }
        }
        out
    }

    #[test]
    fn test_large_document_previews_every_line() {
        let registry = PatternRegistry::markdown().unwrap();
        let content = (0..1500)
            .map(|i| match i {
                10 => "**far**".to_string(),
                100 => "**near**".to_string(),
                _ => format!("line {i}"),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut out = Vec::new();
        preview_document(
            &mut out,
            &registry,
            &ViewportExtractor::default(),
            &content,
            Some(ViewportInfo::new(100, 120)),
        )
        .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(strip_ansi(&out), content);
        // Outside the buffered viewport the line is printed as-is
        assert!(out.contains("\n**far**\n"));
        assert!(!out.contains("\n**near**\n"));
    }

    #[test]
    fn test_color_mapping() {
        assert_eq!(to_crossterm(Color::Default), None);
        assert_eq!(to_crossterm(Color::BrightBlack), Some(style::Color::DarkGrey));
    }
}
