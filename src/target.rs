//! Render targets
//!
//! A render target is the sink a highlight pass writes markup into. The
//! engine never reads it back, and on failure it hides and clears it
//! rather than leaving half-rendered output behind.

use std::cell::RefCell;
use std::rc::Rc;

/// Sink for rendered markup
pub trait RenderTarget {
    /// Replace the target's markup and make it visible
    fn write_markup(&mut self, markup: &str);
    /// Remove any markup
    fn clear(&mut self);
    /// Stop displaying the target until the next write
    fn hide(&mut self);
}

impl<T: RenderTarget + ?Sized> RenderTarget for &mut T {
    fn write_markup(&mut self, markup: &str) {
        (**self).write_markup(markup);
    }

    fn clear(&mut self) {
        (**self).clear();
    }

    fn hide(&mut self) {
        (**self).hide();
    }
}

impl<T: RenderTarget + ?Sized> RenderTarget for Box<T> {
    fn write_markup(&mut self, markup: &str) {
        (**self).write_markup(markup);
    }

    fn clear(&mut self) {
        (**self).clear();
    }

    fn hide(&mut self) {
        (**self).hide();
    }
}

/// A plain string holds the latest markup; hiding it empties it
impl RenderTarget for String {
    fn write_markup(&mut self, markup: &str) {
        self.clear();
        self.push_str(markup);
    }

    fn clear(&mut self) {
        String::clear(self);
    }

    fn hide(&mut self) {
        String::clear(self);
    }
}

#[derive(Debug, Default)]
struct BufferState {
    markup: String,
    hidden: bool,
    writes: usize,
}

/// Shared in-memory target
///
/// Clones share the same buffer, so a caller can hand one clone to a
/// debounced request and keep another to read the result.
#[derive(Debug, Clone, Default)]
pub struct MarkupBuffer {
    inner: Rc<RefCell<BufferState>>,
}

impl MarkupBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current markup
    pub fn markup(&self) -> String {
        self.inner.borrow().markup.clone()
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.borrow().hidden
    }

    /// Number of markup writes received
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl RenderTarget for MarkupBuffer {
    fn write_markup(&mut self, markup: &str) {
        let mut state = self.inner.borrow_mut();
        state.markup.clear();
        state.markup.push_str(markup);
        state.hidden = false;
        state.writes += 1;
    }

    fn clear(&mut self) {
        self.inner.borrow_mut().markup.clear();
    }

    fn hide(&mut self) {
        self.inner.borrow_mut().hidden = true;
    }
}
