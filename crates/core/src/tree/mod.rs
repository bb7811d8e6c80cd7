pub mod bottom_up;
pub mod node;
pub mod top_down;
pub mod window;

pub use bottom_up::build_bottom_up;
pub use node::{NodeId, ProfileNode, ProfileTree, SortBy};
pub use top_down::build_top_down;
pub use window::{ClippedEvent, TimeWindow};

use thiserror::Error;

use crate::model::Event;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("invalid time window: start {start} is after end {end}")]
    InvalidRange { start: f64, end: f64 },
    /// Two events overlap without one containing the other, which would
    /// corrupt self/total accounting. The engine never reorders input to
    /// repair this.
    #[error(
        "event `{inner}` [{inner_start}, {inner_end}) is not nested inside \
         `{outer}` [{outer_start}, {outer_end})"
    )]
    StructuralViolation {
        outer: String,
        outer_start: f64,
        outer_end: f64,
        inner: String,
        inner_start: f64,
        inner_end: f64,
    },
}

impl TreeError {
    pub(crate) fn overlap(outer: &Event, inner: &Event) -> Self {
        TreeError::StructuralViolation {
            outer: outer.name.clone(),
            outer_start: outer.start_time,
            outer_end: outer.end_time,
            inner: inner.name.clone(),
            inner_start: inner.start_time,
            inner_end: inner.end_time,
        }
    }
}
