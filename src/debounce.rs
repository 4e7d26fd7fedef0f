//! Debounced highlight scheduling
//!
//! Rapid edits are coalesced into one pass. Each schedule call replaces
//! the pending request and pushes its deadline out by the debounce delay;
//! only the last request in a burst is rendered. Every caller in the burst
//! shares one `Completion`, which always resolves, whether the pass
//! succeeds, fails, or is cancelled.
//!
//! The scheduler does no I/O and owns no timer. The host event loop asks
//! for `next_deadline()`, sleeps until then, and calls `take_due()`. Time
//! is passed in so tests can drive it directly.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::target::RenderTarget;
use crate::viewport::ViewportInfo;

/// Default debounce delay in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Outcome of a highlight pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// Markup was rendered and written to the target
    Rendered,
    /// Markup came from the cache
    Cached,
    /// The request was invalid and nothing was written
    Skipped,
    /// The pass failed; the target was hidden and cleared
    Failed,
    /// The pending request was dropped before it ran
    Cancelled,
}

/// Handle resolved once the pass covering a request finishes
#[derive(Debug, Clone, Default)]
pub struct Completion {
    status: Rc<Cell<Option<PassStatus>>>,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// A completion that is already resolved
    pub fn resolved(status: PassStatus) -> Self {
        let completion = Self::new();
        completion.resolve(status);
        completion
    }

    pub fn is_resolved(&self) -> bool {
        self.status.get().is_some()
    }

    /// Status of the pass, once it has run
    pub fn status(&self) -> Option<PassStatus> {
        self.status.get()
    }

    /// Whether two handles belong to the same coalesced burst
    pub fn same_as(&self, other: &Completion) -> bool {
        Rc::ptr_eq(&self.status, &other.status)
    }

    pub(crate) fn resolve(&self, status: PassStatus) {
        self.status.set(Some(status));
    }
}

/// A request waiting for its deadline
pub struct PendingHighlight {
    pub content: String,
    pub target: Box<dyn RenderTarget>,
    pub viewport: Option<ViewportInfo>,
}

impl fmt::Debug for PendingHighlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHighlight")
            .field("content_len", &self.content.len())
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Scheduled {
    request: PendingHighlight,
    deadline: Instant,
    completion: Completion,
    coalesced: usize,
}

/// At most one pending highlight per engine
#[derive(Debug)]
pub struct DebounceScheduler {
    delay: Duration,
    pending: Option<Scheduled>,
}

impl DebounceScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the delay; takes effect at the next schedule call
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Arm (or re-arm) the deadline for `request`
    ///
    /// A request already pending is superseded; its completion carries
    /// over to the new request.
    pub fn schedule(&mut self, request: PendingHighlight, now: Instant) -> Completion {
        let deadline = now + self.delay;
        match &mut self.pending {
            Some(scheduled) => {
                scheduled.request = request;
                scheduled.deadline = deadline;
                scheduled.coalesced += 1;
                scheduled.completion.clone()
            }
            None => {
                let completion = Completion::new();
                self.pending = Some(Scheduled {
                    request,
                    deadline,
                    completion: completion.clone(),
                    coalesced: 1,
                });
                completion
            }
        }
    }

    /// Take the pending request if its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<(PendingHighlight, Completion)> {
        if self.pending.as_ref().is_some_and(|s| s.deadline <= now) {
            return self.take_pending();
        }
        None
    }

    /// Take the pending request regardless of its deadline
    pub fn take_pending(&mut self) -> Option<(PendingHighlight, Completion)> {
        self.pending
            .take()
            .map(|scheduled| (scheduled.request, scheduled.completion))
    }

    /// Drop the pending request, resolving its completion as cancelled
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(scheduled) => {
                scheduled.completion.resolve(PassStatus::Cancelled);
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|s| s.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of schedule calls folded into the pending request
    pub fn coalesced(&self) -> usize {
        self.pending.as_ref().map_or(0, |s| s.coalesced)
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}
