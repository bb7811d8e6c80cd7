use crate::model::Event;
use crate::tree::TreeError;

/// Half-open analysis window `[start, end)`. `end` may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

/// An event restricted to a window, with the effective interval that falls
/// inside it.
#[derive(Debug, Clone, Copy)]
pub struct ClippedEvent<'a> {
    pub event: &'a Event,
    pub start: f64,
    pub end: f64,
}

impl ClippedEvent<'_> {
    /// Effective (partial-overlap weighted) duration.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, TreeError> {
        if start > end {
            return Err(TreeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering the whole trace.
    pub fn unbounded() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Clip one event to the window. Returns the effective interval, or
    /// `None` when the event lies entirely outside. Instantaneous events
    /// inside the half-open window are kept with zero duration.
    pub fn clip(&self, event: &Event) -> Option<(f64, f64)> {
        if event.is_instant() {
            let t = event.start_time;
            return (self.start <= t && t < self.end).then_some((t, t));
        }
        let start = event.start_time.max(self.start);
        let end = event.end_time.min(self.end);
        (end > start).then_some((start, end))
    }

    /// Restrict a start-time-sorted event sequence to the window, preserving
    /// order. The first in-window event is located with a binary search over
    /// start times; events that opened before the window and are still open
    /// at its start (the ancestor chain of the window start) are recovered
    /// by walking the prefix backward.
    pub fn clip_sequence<'a>(&self, events: &'a [Event]) -> Vec<ClippedEvent<'a>> {
        let first = events.partition_point(|e| e.start_time < self.start);
        // Proper nesting means every prefix event still open at the window
        // start contains it, so the open prefix events form one ancestor
        // chain. Collected innermost-first, then reversed; closed prefix
        // events cost one comparison each, and an open ancestor may sit
        // behind arbitrarily many of them, so there is no earlier stop.
        let mut clipped: Vec<ClippedEvent<'a>> = events[..first]
            .iter()
            .rev()
            .filter_map(|event| {
                let (start, end) = self.clip(event)?;
                Some(ClippedEvent { event, start, end })
            })
            .collect();
        clipped.reverse();
        for event in &events[first..] {
            if event.start_time >= self.end {
                break;
            }
            if let Some((start, end)) = self.clip(event) {
                clipped.push(ClippedEvent { event, start, end });
            }
        }
        clipped
    }
}
