//! Debounced change log.
//!
//! Change descriptions are queued and printed as one block once no new
//! line has arrived for the debounce delay. The timer is a plain deadline
//! polled by the owner's event loop, so queueing and flushing never leave
//! the indexing thread.

use std::fmt;
use std::time::{Duration, Instant};

/// Quiet period before queued lines are flushed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// A reschedulable one-shot timer.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms the timer to fire `delay` from now, replacing any earlier deadline.
    pub fn schedule(&mut self) {
        self.schedule_at(Instant::now());
    }

    /// Arms the timer relative to `now`.
    pub fn schedule_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// Time left until the deadline; None when the timer is not armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

type Sink = Box<dyn FnMut(&str) + Send>;

/// Queue of human-readable change lines with a trailing-edge debounce.
pub struct LogAggregator {
    pending: Vec<String>,
    timer: DebounceTimer,
    sink: Sink,
}

impl LogAggregator {
    /// Creates an aggregator that prints flushed blocks to stdout.
    pub fn new(delay: Duration) -> Self {
        Self::with_sink(delay, |block| println!("{}", block))
    }

    /// Creates an aggregator that hands flushed blocks to `sink`.
    pub fn with_sink(delay: Duration, sink: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            pending: Vec::new(),
            timer: DebounceTimer::new(delay),
            sink: Box::new(sink),
        }
    }

    /// Queues a line and pushes the flush back by the full delay.
    pub fn push(&mut self, line: impl Into<String>) {
        self.push_at(line, Instant::now());
    }

    pub fn push_at(&mut self, line: impl Into<String>, now: Instant) {
        self.pending.push(line.into());
        self.timer.schedule_at(now);
    }

    /// Flushes if the timer has expired. Returns whether a block was emitted.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if !self.timer.is_due(now) {
            return false;
        }
        self.flush()
    }

    /// Flushes regardless of the timer.
    pub fn flush(&mut self) -> bool {
        self.timer.cancel();
        if self.pending.is_empty() {
            return false;
        }

        let block = std::mem::take(&mut self.pending).join("\n");
        (self.sink)(&block);
        true
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn timer(&self) -> &DebounceTimer {
        &self.timer
    }
}

impl Default for LogAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl fmt::Debug for LogAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogAggregator")
            .field("pending", &self.pending)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}
