use std::collections::HashSet;

use crate::filter::FilterChain;
use crate::grouping::{GroupBy, event_id};
use crate::model::Event;
use crate::tree::TreeError;
use crate::tree::node::ProfileTree;
use crate::tree::window::TimeWindow;

/// One event occurrence with its reconstructed stack position.
struct Occurrence<'a> {
    event: &'a Event,
    parent: Option<usize>,
    self_time: f64,
}

/// Build a bottom-up tree: top-level nodes bucket self time by identity
/// ("where time is spent"), children break a bucket down by caller,
/// recursively up to the original call roots.
///
/// Identities come from `group_by`; [`GroupBy::None`] falls back to the
/// name-and-source [`event_id`], since a bottom-up view with per-occurrence
/// buckets would never merge anything. A repeated identity within one
/// ancestor chain (direct or indirect recursion) is folded: it is counted at
/// its first position and skipped when it recurs further up the chain.
pub fn build_bottom_up(
    events: &[Event],
    filters: &FilterChain,
    window: TimeWindow,
    group_by: GroupBy,
) -> Result<ProfileTree, TreeError> {
    let clipped = window.clip_sequence(events);

    // Phase 1: reconstruct the stack and per-occurrence self time, with the
    // same arithmetic the top-down builder uses.
    let mut occurrences: Vec<Occurrence> = Vec::with_capacity(clipped.len());
    let mut stack: Vec<(usize, f64)> = Vec::new();
    for c in &clipped {
        if !filters.accepts(c.event) {
            continue;
        }
        while let Some(&(_, end)) = stack.last() {
            if end <= c.start {
                stack.pop();
            } else {
                break;
            }
        }
        if let Some(&(open, end)) = stack.last()
            && c.end > end
        {
            return Err(TreeError::overlap(occurrences[open].event, c.event));
        }
        let parent = stack.last().map(|frame| frame.0);
        let duration = c.duration();
        if let Some(p) = parent {
            occurrences[p].self_time -= duration;
        }
        let index = occurrences.len();
        occurrences.push(Occurrence {
            event: c.event,
            parent,
            self_time: duration,
        });
        stack.push((index, c.end));
    }

    // Phase 2: for every time-bearing occurrence, walk its ancestor chain
    // and accumulate its self time at each level of the inverted tree. The
    // chain's terminal node additionally absorbs the time as self time, so
    // total == self + Σ children holds below the top level; at the top
    // level a bucket's total and self are the same number by construction.
    let mut tree = ProfileTree::with_root();
    let root = tree.root();
    let mut seen: HashSet<String> = HashSet::new();
    for index in 0..occurrences.len() {
        let self_time = occurrences[index].self_time;
        if self_time <= 0.0 {
            continue;
        }
        seen.clear();
        let mut cursor = root;
        let mut bucket = root;
        let mut link = Some(index);
        while let Some(i) = link {
            let event = occurrences[i].event;
            let key = group_by
                .group_key(event)
                .unwrap_or_else(|| event_id(event));
            if seen.insert(key.clone()) {
                cursor = tree.child_or_insert(cursor, &key, event, true);
                let node = tree.node_mut(cursor);
                node.total_time += self_time;
                if bucket == root {
                    node.self_time += self_time;
                    bucket = cursor;
                }
            }
            link = occurrences[i].parent;
        }
        if cursor != bucket {
            tree.node_mut(cursor).self_time += self_time;
        }
        tree.node_mut(root).total_time += self_time;
    }
    Ok(tree)
}
