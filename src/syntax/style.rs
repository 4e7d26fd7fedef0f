//! Style types for terminal preview
//!
//! Styles describe how a token part looks when the token tree is painted
//! on a terminal instead of being emitted as markup.

use super::tokens::{PartRole, TokenType};

/// Terminal colors (ANSI 16-color palette for compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    BrightBlack,
    BrightBlue,
}

/// Text style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl Style {
    /// Create a style with just foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    /// Builder: set bold
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: set italic
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Builder: set strikethrough
    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    /// Check if this is the default (no styling)
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Layer `inner` on top of this style
    ///
    /// Attributes accumulate; an inner color replaces the outer one.
    pub fn merge(self, inner: Style) -> Style {
        Style {
            fg: if inner.fg == Color::Default { self.fg } else { inner.fg },
            bold: self.bold || inner.bold,
            italic: self.italic || inner.italic,
            underline: self.underline || inner.underline,
            strikethrough: self.strikethrough || inner.strikethrough,
        }
    }

    /// Style for one part of a token
    pub fn for_part(token_type: TokenType, role: PartRole) -> Style {
        match role {
            PartRole::Marker => Style::fg(Color::BrightBlack),
            PartRole::Content => token_type.content_style(),
            PartRole::Meta("url") | PartRole::Meta("ref") => {
                Style::fg(Color::BrightBlue).with_underline()
            }
            PartRole::Meta(_) => Style::fg(Color::Yellow),
            PartRole::Plain => Style::default(),
        }
    }
}
