//! Pattern registry
//!
//! Owns the compiled token grammars in their fixed processing order.
//! Code comes first so its contents are claimed before any inline
//! formatting can see them; bold precedes italic because `**` would
//! otherwise be read as two italic delimiters.

use super::builtin;
use super::rules::PatternDefinition;
use super::tokens::TokenType;
use crate::error::Result;

/// Order in which patterns claim text
pub const PROCESSING_ORDER: [TokenType; 10] = [
    TokenType::CodeBlock,
    TokenType::CodeInline,
    TokenType::Header,
    TokenType::Bold,
    TokenType::Italic,
    TokenType::Strikethrough,
    TokenType::Link,
    TokenType::Blockquote,
    TokenType::List,
    TokenType::Table,
];

/// Immutable, ordered set of pattern definitions
#[derive(Debug)]
pub struct PatternRegistry {
    patterns: Vec<PatternDefinition>,
}

impl PatternRegistry {
    /// Build the registry from the built-in markdown grammar
    pub fn markdown() -> Result<Self> {
        Ok(Self::from_patterns(builtin::markdown_patterns()?))
    }

    /// Build a registry from arbitrary patterns, ordered by precedence
    pub(crate) fn from_patterns(mut patterns: Vec<PatternDefinition>) -> Self {
        patterns.sort_by_key(|p| precedence(p.token_type));
        Self { patterns }
    }

    /// Patterns in processing order
    pub fn patterns(&self) -> &[PatternDefinition] {
        &self.patterns
    }

    /// Look up the pattern for a token type
    pub fn get(&self, token_type: TokenType) -> Option<&PatternDefinition> {
        self.patterns.iter().find(|p| p.token_type == token_type)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Position of a token type in `PROCESSING_ORDER`; `Text` sorts last
fn precedence(token_type: TokenType) -> usize {
    PROCESSING_ORDER
        .iter()
        .position(|&t| t == token_type)
        .unwrap_or(PROCESSING_ORDER.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let registry = PatternRegistry::markdown().unwrap();
        let order: Vec<TokenType> = registry.patterns().iter().map(|p| p.token_type).collect();
        assert_eq!(order, PROCESSING_ORDER.to_vec());
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_lookup() {
        let registry = PatternRegistry::markdown().unwrap();
        assert_eq!(registry.get(TokenType::Link).map(|p| p.name), Some("link"));
        assert!(registry.get(TokenType::Text).is_none());
    }

    #[test]
    fn test_precedence() {
        assert_eq!(precedence(TokenType::CodeBlock), 0);
        assert!(precedence(TokenType::Bold) < precedence(TokenType::Italic));
        assert_eq!(precedence(TokenType::Text), PROCESSING_ORDER.len());
    }
}
