//! Token types for markdown highlighting
//!
//! This module defines the semantic token types recognized in markdown
//! text and the transient `Token` values a render pass produces. Tokens
//! borrow from the source text and never outlive the pass.

use std::ops::Range;

use super::style::{Color, Style};

/// Semantic token types for markdown highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// ATX headers (# through ######)
    Header,
    /// Strong emphasis (**x** or __x__)
    Bold,
    /// Emphasis (*x* or _x_)
    Italic,
    /// Inline code spans (`x`)
    CodeInline,
    /// Fenced code blocks
    CodeBlock,
    /// Inline and reference links, images
    Link,
    /// Bullet and ordered list items
    List,
    /// Blockquote lines (> x)
    Blockquote,
    /// Strikethrough (~~x~~)
    Strikethrough,
    /// Pipe table rows
    Table,
    /// Source text no pattern claimed
    Text,
}

impl TokenType {
    /// Get the style for the semantic content of this token type
    pub fn content_style(&self) -> Style {
        match self {
            TokenType::Header => Style::fg(Color::Magenta).with_bold(),
            TokenType::Bold => Style::default().with_bold(),
            TokenType::Italic => Style::default().with_italic(),
            TokenType::CodeInline => Style::fg(Color::Green),
            TokenType::CodeBlock => Style::fg(Color::Green),
            TokenType::Link => Style::fg(Color::Blue).with_underline(),
            TokenType::List => Style::default(),
            TokenType::Blockquote => Style::fg(Color::BrightBlack).with_italic(),
            TokenType::Strikethrough => Style::default().with_strikethrough(),
            TokenType::Table => Style::fg(Color::Cyan),
            TokenType::Text => Style::default(),
        }
    }

    /// Get a human-readable name for this token type
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::Header => "Header",
            TokenType::Bold => "Bold",
            TokenType::Italic => "Italic",
            TokenType::CodeInline => "CodeInline",
            TokenType::CodeBlock => "CodeBlock",
            TokenType::Link => "Link",
            TokenType::List => "List",
            TokenType::Blockquote => "Blockquote",
            TokenType::Strikethrough => "Strikethrough",
            TokenType::Table => "Table",
            TokenType::Text => "Text",
        }
    }

    /// Class name fragment used in rendered markup (`md-<class>`)
    pub fn class_name(&self) -> &'static str {
        match self {
            TokenType::Header => "header",
            TokenType::Bold => "bold",
            TokenType::Italic => "italic",
            TokenType::CodeInline => "code-inline",
            TokenType::CodeBlock => "code-block",
            TokenType::Link => "link",
            TokenType::List => "list",
            TokenType::Blockquote => "blockquote",
            TokenType::Strikethrough => "strikethrough",
            TokenType::Table => "table",
            TokenType::Text => "text",
        }
    }

    /// Opaque tokens shield their contents from every other pattern
    pub fn is_opaque(&self) -> bool {
        matches!(self, TokenType::CodeBlock | TokenType::CodeInline)
    }
}

/// Where a link points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget<'a> {
    /// `[text](url)`
    Url(&'a str),
    /// `[text][ref]`
    Reference(&'a str),
}

/// Token payload, one variant per token type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Header {
        level: u8,
        content: &'a str,
    },
    Bold {
        content: &'a str,
        delimiter: &'a str,
    },
    Italic {
        content: &'a str,
        delimiter: &'a str,
    },
    Strikethrough {
        content: &'a str,
        delimiter: &'a str,
    },
    CodeBlock {
        language: Option<&'a str>,
        content: &'a str,
    },
    CodeInline {
        content: &'a str,
    },
    Link {
        text: &'a str,
        target: LinkTarget<'a>,
        image: bool,
    },
    List {
        indent_depth: usize,
        marker: &'a str,
        content: &'a str,
    },
    Blockquote {
        level: usize,
        indent: usize,
        content: &'a str,
    },
    Table {
        content: &'a str,
    },
    Text,
}

impl TokenKind<'_> {
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenKind::Header { .. } => TokenType::Header,
            TokenKind::Bold { .. } => TokenType::Bold,
            TokenKind::Italic { .. } => TokenType::Italic,
            TokenKind::Strikethrough { .. } => TokenType::Strikethrough,
            TokenKind::CodeBlock { .. } => TokenType::CodeBlock,
            TokenKind::CodeInline { .. } => TokenType::CodeInline,
            TokenKind::Link { .. } => TokenType::Link,
            TokenKind::List { .. } => TokenType::List,
            TokenKind::Blockquote { .. } => TokenType::Blockquote,
            TokenKind::Table { .. } => TokenType::Table,
            TokenKind::Text => TokenType::Text,
        }
    }
}

/// Role a slice of a token plays in the rendered fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartRole {
    /// Delimiter characters (`**`, `#`, fences)
    Marker,
    /// Semantic text; nested tokens live here
    Content,
    /// Named auxiliary text such as a link url or code language
    Meta(&'static str),
    /// Whitespace and indentation emitted without a wrapper
    Plain,
}

/// A contiguous slice of a token's raw match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub role: PartRole,
    /// Byte range in the tokenized text
    pub range: Range<usize>,
}

/// A recognized unit of markdown syntax
///
/// `parts` tile `range` exactly, in order. `children` tile the content
/// part once the tokenizer has filled the gaps with `Text` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Source text consumed by this token
    pub raw_match: &'a str,
    /// Byte range of `raw_match` in the tokenized text
    pub range: Range<usize>,
    pub parts: Vec<Part>,
    pub children: Vec<Token<'a>>,
}

impl<'a> Token<'a> {
    /// Create a plain text token over `range` of `source`
    pub fn text(source: &'a str, range: Range<usize>) -> Self {
        Self {
            kind: TokenKind::Text,
            raw_match: &source[range.clone()],
            range,
            parts: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn token_type(&self) -> TokenType {
        self.kind.token_type()
    }

    /// Byte range of the content part, if the token has one
    pub fn content_range(&self) -> Option<Range<usize>> {
        self.parts
            .iter()
            .find(|part| part.role == PartRole::Content)
            .map(|part| part.range.clone())
    }

    /// Source text covered by one of this token's parts
    pub fn part_text(&self, part: &Part) -> &'a str {
        let offset = self.range.start;
        &self.raw_match[part.range.start - offset..part.range.end - offset]
    }

    /// Header level, blockquote nesting or list depth
    pub fn level(&self) -> Option<usize> {
        match self.kind {
            TokenKind::Header { level, .. } => Some(usize::from(level)),
            TokenKind::Blockquote { level, .. } => Some(level),
            TokenKind::List { indent_depth, .. } => Some(indent_depth),
            _ => None,
        }
    }

    /// Depth-first walk over this token and all nested tokens
    pub fn walk<F: FnMut(&Token<'a>)>(&self, visit: &mut F) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
