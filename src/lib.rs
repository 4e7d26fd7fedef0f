//! mdlive - live markdown syntax highlighting
//!
//! Turns markdown text into styleable markup for an editor surface:
//! debounced passes, viewport narrowing for large documents, and a
//! bounded cache of rendered output.

pub mod cache;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod perf;
pub mod preview;
pub mod syntax;
pub mod target;
pub mod viewport;

pub use config::{EngineOptions, OptionsUpdate};
pub use debounce::{Completion, PassStatus};
pub use engine::{Engine, EngineState};
pub use error::{HighlightError, Result};
pub use perf::PerformanceStats;
pub use target::{MarkupBuffer, RenderTarget};
pub use viewport::ViewportInfo;
