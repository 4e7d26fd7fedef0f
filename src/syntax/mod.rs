//! Markdown syntax module
//!
//! This module provides the token grammar and the renderer that turns
//! markdown text into styleable markup:
//! - Pattern registry (ordered regex grammars with extractors)
//! - Tokenizer (precedence-ordered range claiming)
//! - Markup renderer (marker/content fragments)
//! - Styles for terminal preview

mod builtin;
mod markup;
mod registry;
mod rules;
mod style;
mod tokenizer;
mod tokens;

pub use markup::{escape, escape_into, is_rendered, render, render_tokens, CLASS_PREFIX, RENDERED_MARKER};
pub use registry::{PatternRegistry, PROCESSING_ORDER};
pub use rules::{first_group, group, Extractor, Parts, PatternDefinition};
pub use style::{Color, Style};
pub use tokenizer::tokenize;
pub use tokens::{LinkTarget, Part, PartRole, Token, TokenKind, TokenType};
