//! Highlighting engine
//!
//! Ties the pieces together: debounce, cache lookup, viewport narrowing,
//! tokenizing and rendering, instrumentation. Nothing here returns an
//! error to the caller. Failures are logged and degrade to a hidden,
//! empty render target.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::config::{EngineOptions, OptionsUpdate};
use crate::debounce::{Completion, DebounceScheduler, PassStatus, PendingHighlight};
use crate::error::{HighlightError, Result};
use crate::perf::{PerfTracker, PerformanceStats};
use crate::syntax::{escape_into, is_rendered, render, PatternRegistry};
use crate::target::RenderTarget;
use crate::viewport::{ViewportExtractor, ViewportInfo};

/// Where the engine is in its pass lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Scheduled,
    Rendering,
}

/// A markdown highlighting engine bound to one editor surface
#[derive(Debug)]
pub struct Engine {
    options: EngineOptions,
    registry: Option<PatternRegistry>,
    cache: ResultCache,
    scheduler: DebounceScheduler,
    perf: PerfTracker,
    rendering: bool,
    destroyed: bool,
}

impl Engine {
    /// Create an engine with the built-in markdown grammar
    pub fn new(options: EngineOptions) -> Result<Self> {
        Ok(Self::with_registry(options, PatternRegistry::markdown()?))
    }

    pub(crate) fn with_registry(options: EngineOptions, registry: PatternRegistry) -> Self {
        debug!(target: "mdlive::engine", patterns = registry.len(), ?options, "engine created");
        Self {
            cache: ResultCache::new(options.max_cache_size),
            scheduler: DebounceScheduler::new(options.debounce_delay()),
            registry: Some(registry),
            perf: PerfTracker::new(),
            rendering: false,
            destroyed: false,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The pattern registry, until the engine is destroyed
    pub fn registry(&self) -> Option<&PatternRegistry> {
        self.registry.as_ref()
    }

    pub fn state(&self) -> EngineState {
        if self.rendering {
            EngineState::Rendering
        } else if self.scheduler.is_pending() {
            EngineState::Scheduled
        } else {
            EngineState::Idle
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Viewport extractor for the current options
    pub fn extractor(&self) -> ViewportExtractor {
        ViewportExtractor::new(
            self.options.max_lines_for_full_highlight,
            self.options.visible_lines_buffer,
        )
    }

    /// Highlight `content` into `target` right away
    pub fn highlight(
        &mut self,
        content: &str,
        target: &mut dyn RenderTarget,
        viewport: Option<ViewportInfo>,
    ) -> PassStatus {
        self.execute(content, target, viewport)
    }

    /// Highlight after the debounce delay, coalescing with pending calls
    pub fn highlight_with_debounce(
        &mut self,
        content: impl Into<String>,
        target: impl RenderTarget + 'static,
        viewport: Option<ViewportInfo>,
    ) -> Completion {
        self.schedule_highlight_at(content, target, viewport, Instant::now())
    }

    /// `highlight_with_debounce` with an explicit clock reading
    pub fn schedule_highlight_at(
        &mut self,
        content: impl Into<String>,
        target: impl RenderTarget + 'static,
        viewport: Option<ViewportInfo>,
        now: Instant,
    ) -> Completion {
        if self.destroyed {
            warn!(target: "mdlive::engine", "highlight scheduled on a destroyed engine");
            return Completion::resolved(PassStatus::Skipped);
        }
        let request = PendingHighlight {
            content: content.into(),
            target: Box::new(target),
            viewport,
        };
        let completion = self.scheduler.schedule(request, now);
        debug!(
            target: "mdlive::engine",
            coalesced = self.scheduler.coalesced(),
            "highlight scheduled"
        );
        completion
    }

    /// When the pending highlight becomes due, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Run the pending highlight if its deadline has passed
    pub fn poll(&mut self) -> Option<PassStatus> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<PassStatus> {
        let (request, completion) = self.scheduler.take_due(now)?;
        Some(self.run_scheduled(request, completion))
    }

    /// Run the pending highlight without waiting for its deadline
    pub fn flush(&mut self) -> Option<PassStatus> {
        let (request, completion) = self.scheduler.take_pending()?;
        Some(self.run_scheduled(request, completion))
    }

    /// Merge an options update
    ///
    /// Changing how documents are narrowed clears the cache, since cached
    /// markup was produced under the old settings.
    pub fn update_options(&mut self, update: OptionsUpdate) {
        if self.destroyed {
            warn!(target: "mdlive::engine", "options updated on a destroyed engine");
            return;
        }
        if update.affects_extraction(&self.options) {
            self.cache.clear();
        }
        self.options.merge(&update);
        self.scheduler.set_delay(self.options.debounce_delay());
        debug!(target: "mdlive::engine", options = ?self.options, "options updated");
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.perf.snapshot(self.cache.len(), self.cache.capacity())
    }

    /// Cancel pending work and release the grammar and cache
    ///
    /// A pending completion resolves as cancelled. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if self.scheduler.cancel() {
            debug!(target: "mdlive::engine", "pending highlight cancelled");
        }
        self.registry = None;
        self.cache.clear();
        self.destroyed = true;
        debug!(target: "mdlive::engine", "engine destroyed");
    }

    fn run_scheduled(&mut self, mut request: PendingHighlight, completion: Completion) -> PassStatus {
        let status = self.execute(&request.content, &mut request.target, request.viewport);
        completion.resolve(status);
        status
    }

    fn execute(
        &mut self,
        content: &str,
        target: &mut dyn RenderTarget,
        viewport: Option<ViewportInfo>,
    ) -> PassStatus {
        if let Err(e) = self.check_request(viewport) {
            warn!(target: "mdlive::engine", error = %e, "highlight skipped");
            return PassStatus::Skipped;
        }

        self.rendering = true;
        let status = self.run_pass(content, target, viewport);
        self.rendering = false;
        status
    }

    fn check_request(&self, viewport: Option<ViewportInfo>) -> Result<()> {
        if self.destroyed {
            return Err(HighlightError::Destroyed);
        }
        match viewport {
            Some(viewport) => viewport.validate(),
            None => Ok(()),
        }
    }

    fn run_pass(
        &mut self,
        content: &str,
        target: &mut dyn RenderTarget,
        viewport: Option<ViewportInfo>,
    ) -> PassStatus {
        let start = Instant::now();
        let line_count = content.lines().count();
        let key = CacheKey::new(content, viewport);

        if let Some(markup) = self.cache.get(&key) {
            target.write_markup(markup);
            self.perf.record(
                start.elapsed(),
                line_count,
                true,
                self.options.enable_performance_logging,
            );
            return PassStatus::Cached;
        }

        let Some(registry) = self.registry.as_ref() else {
            return PassStatus::Skipped;
        };
        let extractor = self.extractor();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            render_document(registry, &extractor, content, viewport)
        }))
        .unwrap_or_else(|payload| Err(HighlightError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(markup) => {
                target.write_markup(&markup);
                self.cache.put(key, markup);
                self.perf.record(
                    start.elapsed(),
                    line_count,
                    false,
                    self.options.enable_performance_logging,
                );
                PassStatus::Rendered
            }
            Err(e) => {
                error!(target: "mdlive::engine", error = %e, lines = line_count, "highlight pass failed");
                target.hide();
                target.clear();
                PassStatus::Failed
            }
        }
    }
}

/// Render a whole document, narrowing large ones to the viewport
///
/// Lines outside the extracted slice are escaped but not highlighted, so
/// the result always covers every line of `content`.
pub fn render_document(
    registry: &PatternRegistry,
    extractor: &ViewportExtractor,
    content: &str,
    viewport: Option<ViewportInfo>,
) -> Result<String> {
    if is_rendered(content) {
        return render(registry, content);
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let extraction = extractor.extract(&lines, viewport);
    if extraction.is_full(lines.len()) {
        return render(registry, content);
    }

    let mut out = String::with_capacity(content.len() * 2);
    for line in &lines[..extraction.start_line_index] {
        escape_into(&mut out, line);
        out.push('\n');
    }
    out.push_str(&render(registry, &extraction.content)?);
    for line in &lines[extraction.end_line_index + 1..] {
        out.push('\n');
        escape_into(&mut out, line);
    }
    Ok(out)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use regex::Captures;

    use super::*;
    use crate::syntax::{Extractor, PatternDefinition, Token, TokenType};
    use crate::target::MarkupBuffer;

    fn engine() -> Engine {
        Engine::new(EngineOptions::default()).unwrap()
    }

    fn document(line_count: usize) -> String {
        (0..line_count)
            .map(|i| match i {
                10 => "**far**".to_string(),
                100 => "**near**".to_string(),
                _ => format!("line {i}"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_highlight_writes_markup() {
        let mut engine = engine();
        let mut target = MarkupBuffer::new();
        let status = engine.highlight("# Title\n**bold**", &mut target, None);

        assert_eq!(status, PassStatus::Rendered);
        assert!(target.markup().contains("md-header md-header-1"));
        assert!(target.markup().contains("<span class=\"md-bold-content\">bold</span>"));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_repeated_call_hits_cache() {
        let mut engine = engine();
        let content = (0..500)
            .map(|i| format!("- item {i} **b** *i* `c` [l](u)"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut first = String::new();
        let mut second = String::new();

        assert_eq!(engine.highlight(&content, &mut first, None), PassStatus::Rendered);
        let rendered_time = engine.performance_stats().last_highlight_time;
        assert_eq!(engine.highlight(&content, &mut second, None), PassStatus::Cached);
        let cached_time = engine.performance_stats().last_highlight_time;
        assert_eq!(first, second);
        assert!(
            cached_time < rendered_time,
            "cached pass took {cached_time:?}, rendered pass took {rendered_time:?}"
        );

        let stats = engine.performance_stats();
        assert_eq!(stats.total_highlights, 2);
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.max_cache_size, 100);
    }

    fn refuse_bold<'h>(_caps: &Captures<'h>) -> Result<Token<'h>> {
        Err(HighlightError::extract("bold", "refusing every match"))
    }

    fn panic_on_bold<'h>(_caps: &Captures<'h>) -> Result<Token<'h>> {
        panic!("bold extractor exploded")
    }

    fn engine_with_bold(extractor: Extractor) -> Engine {
        let pattern =
            PatternDefinition::new("bold", TokenType::Bold, r"\*\*(\w+)\*\*", extractor).unwrap();
        Engine::with_registry(
            EngineOptions::default(),
            PatternRegistry::from_patterns(vec![pattern]),
        )
    }

    fn assert_failed_pass(mut engine: Engine) {
        let mut target = MarkupBuffer::new();
        target.write_markup("stale");

        let status = engine.highlight("plain **bold** text", &mut target, None);
        assert_eq!(status, PassStatus::Failed);
        assert!(target.is_hidden());
        assert_eq!(target.markup(), "");

        let stats = engine.performance_stats();
        assert_eq!(stats.total_highlights, 0);
        assert_eq!(stats.cache_size, 0);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_extractor_error_hides_target() {
        assert_failed_pass(engine_with_bold(refuse_bold));
    }

    #[test]
    fn test_extractor_panic_hides_target() {
        assert_failed_pass(engine_with_bold(panic_on_bold));
    }

    #[test]
    fn test_failed_debounced_pass_resolves() {
        let mut engine = engine_with_bold(refuse_bold);
        let target = MarkupBuffer::new();
        let completion = engine.highlight_with_debounce("**x**", target.clone(), None);
        assert_eq!(engine.flush(), Some(PassStatus::Failed));
        assert_eq!(completion.status(), Some(PassStatus::Failed));
        assert!(target.is_hidden());
    }

    #[test]
    fn test_debounce_runs_only_last_request() {
        let mut engine = engine();
        let target = MarkupBuffer::new();
        let now = Instant::now();

        let completions: Vec<Completion> = ["# a", "# ab", "# abc"]
            .iter()
            .enumerate()
            .map(|(i, content)| {
                let at = now + Duration::from_millis(100 * i as u64);
                engine.schedule_highlight_at(*content, target.clone(), None, at)
            })
            .collect();
        assert_eq!(engine.state(), EngineState::Scheduled);

        // 300ms after the first call, but the window was re-armed at 200ms
        assert_eq!(engine.poll_at(now + Duration::from_millis(300)), None);
        assert_eq!(target.write_count(), 0);

        let status = engine.poll_at(now + Duration::from_millis(500));
        assert_eq!(status, Some(PassStatus::Rendered));
        assert_eq!(target.write_count(), 1);
        assert!(target.markup().contains(">abc</span>"));
        for completion in &completions {
            assert_eq!(completion.status(), Some(PassStatus::Rendered));
        }
        assert_eq!(engine.performance_stats().total_highlights, 1);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_flush_ignores_deadline() {
        let mut engine = engine();
        let target = MarkupBuffer::new();
        let completion = engine.highlight_with_debounce("`x`", target.clone(), None);
        assert!(engine.next_deadline().is_some());

        assert_eq!(engine.flush(), Some(PassStatus::Rendered));
        assert!(completion.is_resolved());
        assert!(engine.next_deadline().is_none());
        assert_eq!(engine.flush(), None);
    }

    #[test]
    fn test_large_document_highlights_viewport_only() {
        let mut engine = engine();
        let content = document(1500);
        let mut target = String::new();

        let status = engine.highlight(&content, &mut target, Some(ViewportInfo::new(100, 120)));
        assert_eq!(status, PassStatus::Rendered);

        // Every line is still present, but only [50, 170] is highlighted
        assert_eq!(target.split('\n').count(), 1500);
        assert!(target.contains("<span class=\"md-bold-content\">near</span>"));
        assert!(target.contains("\n**far**\n"));
    }

    #[test]
    fn test_small_document_ignores_viewport() {
        let mut engine = engine();
        let content = document(200);
        let mut target = String::new();
        engine.highlight(&content, &mut target, Some(ViewportInfo::new(150, 160)));
        assert!(target.contains("<span class=\"md-bold-content\">far</span>"));
    }

    #[test]
    fn test_unterminated_fence_renders() {
        let mut engine = engine();
        let mut target = MarkupBuffer::new();
        let status = engine.highlight("```rust\nfn main() {}\n", &mut target, None);
        assert_eq!(status, PassStatus::Rendered);
        assert!(!target.markup().contains("md-code-block"));
        assert!(!target.is_hidden());
    }

    #[test]
    fn test_already_rendered_input_is_unchanged() {
        let mut engine = engine();
        let mut first = String::new();
        engine.highlight("**b**", &mut first, None);

        let mut second = String::new();
        engine.highlight(&first, &mut second, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_viewport_is_skipped() {
        let mut engine = engine();
        let mut target = MarkupBuffer::new();
        let status = engine.highlight("# a", &mut target, Some(ViewportInfo::new(9, 3)));
        assert_eq!(status, PassStatus::Skipped);
        assert_eq!(target.write_count(), 0);
        assert_eq!(engine.performance_stats().total_highlights, 0);
    }

    #[test]
    fn test_destroy_cancels_and_disables() {
        let mut engine = engine();
        let target = MarkupBuffer::new();
        let completion = engine.highlight_with_debounce("# a", target.clone(), None);

        engine.destroy();
        assert_eq!(completion.status(), Some(PassStatus::Cancelled));
        assert!(engine.registry().is_none());
        assert!(engine.is_destroyed());
        assert_eq!(engine.flush(), None);

        let mut direct = MarkupBuffer::new();
        assert_eq!(engine.highlight("# a", &mut direct, None), PassStatus::Skipped);
        let late = engine.highlight_with_debounce("# b", target.clone(), None);
        assert_eq!(late.status(), Some(PassStatus::Skipped));
        assert_eq!(target.write_count(), 0);

        engine.destroy();
    }

    #[test]
    fn test_update_options() {
        let mut engine = engine();
        let mut target = String::new();
        engine.highlight("*a*", &mut target, None);
        assert_eq!(engine.performance_stats().cache_size, 1);

        engine.update_options(OptionsUpdate {
            debounce_delay: Some(20),
            enable_performance_logging: Some(true),
            ..OptionsUpdate::default()
        });
        assert_eq!(engine.performance_stats().cache_size, 1);
        assert_eq!(engine.options().debounce_delay, 20);

        engine.update_options(OptionsUpdate {
            visible_lines_buffer: Some(5),
            ..OptionsUpdate::default()
        });
        assert_eq!(engine.performance_stats().cache_size, 0);

        let now = Instant::now();
        engine.schedule_highlight_at("x", String::new(), None, now);
        assert_eq!(engine.next_deadline(), Some(now + Duration::from_millis(20)));
    }

    #[test]
    fn test_render_document_full() {
        let registry = PatternRegistry::markdown().unwrap();
        let extractor = ViewportExtractor::default();
        let out = render_document(&registry, &extractor, "a < b", None).unwrap();
        assert_eq!(out, "a &lt; b");
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }
}
