//! stacksift core: turns a flat, time-ordered stream of nested trace events
//! into analyzable call trees.
//!
//! The engine consumes an ordered, properly nested event sequence plus a
//! time window, a filter chain, and a grouping strategy, and produces either
//! a top-down tree (preserving caller → callee nesting) or a bottom-up tree
//! (inverted, so top-level buckets are time sinks and children are their
//! callers). Builders are pure: every call allocates a fresh tree, and
//! re-invocation with new parameters is the only update mechanism.
//!
//! Rendering, settings persistence, and recording control are external
//! collaborators and have no representation here.

pub mod filter;
pub mod grouping;
pub mod model;
pub mod parsers;
pub mod tree;

pub use filter::{CallbackFilter, EventFilter, ExclusiveNameFilter, FilterChain, TextFilter};
pub use grouping::GroupBy;
pub use model::Event;
pub use tree::{
    NodeId, ProfileNode, ProfileTree, SortBy, TimeWindow, TreeError, build_bottom_up,
    build_top_down,
};
