//! Built-in token grammars
//!
//! Markdown is the only grammar the engine ships; the registry is built
//! from it at engine construction.

mod markdown;

pub use markdown::markdown_patterns;
