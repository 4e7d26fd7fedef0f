//! Pattern rules for markdown highlighting
//!
//! A pattern pairs a compiled regex with an extractor that decomposes a
//! match into a `Token`. Extractors are plain function pointers: they get
//! the captures and nothing else, so they cannot touch shared state.

use std::fmt;
use std::ops::Range;

use regex::{Captures, Match, Regex};

use super::tokens::{Part, PartRole, Token, TokenType};
use crate::error::{HighlightError, Result};

/// Decomposes one regex match into a token
pub type Extractor = for<'h> fn(&Captures<'h>) -> Result<Token<'h>>;

/// A token grammar: matcher plus extractor
pub struct PatternDefinition {
    /// Name for diagnostics
    pub name: &'static str,
    /// Token type this pattern produces
    pub token_type: TokenType,
    /// Compiled regex, matched against the whole document
    pub matcher: Regex,
    extractor: Extractor,
}

impl PatternDefinition {
    /// Compile a new pattern definition
    pub fn new(
        name: &'static str,
        token_type: TokenType,
        pattern: &str,
        extractor: Extractor,
    ) -> Result<Self> {
        let matcher = Regex::new(pattern).map_err(|source| HighlightError::Pattern {
            name,
            source: Box::new(source),
        })?;
        Ok(Self {
            name,
            token_type,
            matcher,
            extractor,
        })
    }

    /// Find the first match at or after `start`
    ///
    /// Anchors such as `^` still see the text before `start`.
    pub fn captures_at<'h>(&self, text: &'h str, start: usize) -> Option<Captures<'h>> {
        if start > text.len() {
            return None;
        }
        self.matcher.captures_at(text, start)
    }

    /// Run the extractor on a match of this pattern
    pub fn extract<'h>(&self, caps: &Captures<'h>) -> Result<Token<'h>> {
        let token = (self.extractor)(caps)?;
        if token.token_type() != self.token_type {
            return Err(HighlightError::extract(
                self.name,
                format!("extractor produced a {} token", token.token_type().name()),
            ));
        }
        Ok(token)
    }
}

impl fmt::Debug for PatternDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternDefinition")
            .field("name", &self.name)
            .field("token_type", &self.token_type)
            .field("matcher", &self.matcher.as_str())
            .finish()
    }
}

/// Fetch a capture group that must have participated in the match
pub fn group<'h>(caps: &Captures<'h>, idx: usize, pattern: &'static str) -> Result<Match<'h>> {
    caps.get(idx)
        .ok_or_else(|| HighlightError::extract(pattern, format!("missing capture group {idx}")))
}

/// First participating group among alternatives
///
/// Patterns written as `a|b` put each branch in its own groups; exactly one
/// branch participates in any match.
pub fn first_group<'h>(caps: &Captures<'h>, alternatives: &[usize]) -> Option<Match<'h>> {
    alternatives.iter().find_map(|&idx| caps.get(idx))
}

/// Builds the part list of a token left to right
///
/// Each push covers the text from the end of the previous part up to the
/// given offset, so parts tile the match without gaps by construction.
pub struct Parts {
    span: Range<usize>,
    cursor: usize,
    parts: Vec<Part>,
    misordered: bool,
}

impl Parts {
    pub fn new(span: Range<usize>) -> Self {
        Self {
            cursor: span.start,
            span,
            parts: Vec::new(),
            misordered: false,
        }
    }

    /// Cover `cursor..end` with a part of the given role
    ///
    /// Empty parts are dropped, except content, which is always recorded
    /// so the token has a place for nested tokens.
    pub fn push(&mut self, role: PartRole, end: usize) -> &mut Self {
        if end < self.cursor || end > self.span.end {
            self.misordered = true;
            return self;
        }
        if end > self.cursor || role == PartRole::Content {
            self.parts.push(Part {
                role,
                range: self.cursor..end,
            });
        }
        self.cursor = end;
        self
    }

    /// Finish the list, covering any remaining text with `tail`
    pub fn finish(mut self, tail: PartRole, pattern: &'static str) -> Result<Vec<Part>> {
        let end = self.span.end;
        self.push(tail, end);
        if self.misordered {
            return Err(HighlightError::extract(
                pattern,
                format!("capture groups out of order in {:?}", self.span),
            ));
        }
        Ok(self.parts)
    }
}
