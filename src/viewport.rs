//! Viewport extraction
//!
//! Large documents are only highlighted around what the editor shows.
//! The extractor narrows the work to the visible lines plus a buffer on
//! either side; everything else stays plain until it scrolls into view.

use crate::error::{HighlightError, Result};

/// Default line count below which the whole document is highlighted
pub const DEFAULT_MAX_LINES_FOR_FULL_HIGHLIGHT: usize = 1000;

/// Default number of lines highlighted beyond each edge of the viewport
pub const DEFAULT_VISIBLE_LINES_BUFFER: usize = 50;

/// Visible line range in the consuming editor (0-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportInfo {
    pub first_visible_line: usize,
    pub last_visible_line: usize,
}

impl ViewportInfo {
    pub fn new(first_visible_line: usize, last_visible_line: usize) -> Self {
        Self {
            first_visible_line,
            last_visible_line,
        }
    }

    /// Reject inverted ranges
    pub fn validate(&self) -> Result<()> {
        if self.first_visible_line > self.last_visible_line {
            return Err(HighlightError::InvalidViewport {
                first: self.first_visible_line,
                last: self.last_visible_line,
            });
        }
        Ok(())
    }

    /// Stable serialized form used in cache fingerprints
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.first_visible_line, self.last_visible_line)
    }
}

/// Text selected for highlighting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Lines `start_line_index..=end_line_index` joined with `\n`
    pub content: String,
    pub start_line_index: usize,
    pub end_line_index: usize,
}

impl Extraction {
    /// Whether the extraction spans every one of `line_count` lines
    pub fn is_full(&self, line_count: usize) -> bool {
        self.start_line_index == 0 && self.end_line_index + 1 >= line_count
    }
}

/// Narrows oversized documents to the viewport plus a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportExtractor {
    pub max_lines_for_full_highlight: usize,
    pub buffer: usize,
}

impl Default for ViewportExtractor {
    fn default() -> Self {
        Self {
            max_lines_for_full_highlight: DEFAULT_MAX_LINES_FOR_FULL_HIGHLIGHT,
            buffer: DEFAULT_VISIBLE_LINES_BUFFER,
        }
    }
}

impl ViewportExtractor {
    pub fn new(max_lines_for_full_highlight: usize, buffer: usize) -> Self {
        Self {
            max_lines_for_full_highlight,
            buffer,
        }
    }

    /// Select the lines to highlight
    ///
    /// Without a viewport, or for documents shorter than the full-highlight
    /// threshold, every line is selected. Viewports past the end of the
    /// document are clamped to its last line.
    pub fn extract(&self, lines: &[&str], viewport: Option<ViewportInfo>) -> Extraction {
        let last_line = lines.len().saturating_sub(1);
        let viewport = match viewport {
            Some(viewport)
                if !lines.is_empty() && lines.len() >= self.max_lines_for_full_highlight =>
            {
                viewport
            }
            _ => {
                return Extraction {
                    content: lines.join("\n"),
                    start_line_index: 0,
                    end_line_index: last_line,
                }
            }
        };

        let end = viewport
            .last_visible_line
            .saturating_add(self.buffer)
            .min(last_line);
        let start = viewport.first_visible_line.saturating_sub(self.buffer).min(end);

        Extraction {
            content: lines[start..=end].join("\n"),
            start_line_index: start,
            end_line_index: end,
        }
    }
}
