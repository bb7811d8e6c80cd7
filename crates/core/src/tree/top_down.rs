use crate::filter::FilterChain;
use crate::grouping::GroupBy;
use crate::model::Event;
use crate::tree::node::{NodeId, ProfileTree};
use crate::tree::window::TimeWindow;
use crate::tree::TreeError;

/// Build a top-down call tree: caller → callee nesting preserved, siblings
/// sharing a grouping identity merged.
///
/// With `do_not_aggregate` (or [`GroupBy::None`]) every retained occurrence
/// becomes its own node, so repeated calls at the same depth stay distinct
/// siblings. Self time is attributed incrementally: each event adds its
/// clipped duration to its own node and subtracts it from the enclosing
/// frame's self time.
pub fn build_top_down(
    events: &[Event],
    filters: &FilterChain,
    window: TimeWindow,
    group_by: GroupBy,
    do_not_aggregate: bool,
) -> Result<ProfileTree, TreeError> {
    let mut tree = ProfileTree::with_root();
    let root = tree.root();
    // Currently open frames: node, clipped end time, originating event.
    let mut stack: Vec<(NodeId, f64, &Event)> = Vec::new();
    let mut occurrence = 0usize;

    for clipped in window.clip_sequence(events) {
        if !filters.accepts(clipped.event) {
            continue;
        }
        while let Some(&(_, end, _)) = stack.last() {
            if end <= clipped.start {
                stack.pop();
            } else {
                break;
            }
        }
        if let Some(&(_, end, open_event)) = stack.last()
            && clipped.end > end
        {
            return Err(TreeError::overlap(open_event, clipped.event));
        }
        let parent = stack.last().map_or(root, |frame| frame.0);

        let grouped_key = if do_not_aggregate {
            None
        } else {
            group_by.group_key(clipped.event)
        };
        let node = match &grouped_key {
            Some(key) => tree.child_or_insert(parent, key, clipped.event, true),
            None => {
                occurrence += 1;
                let key = format!("{}#{occurrence}", clipped.event.name);
                tree.child_or_insert(parent, &key, clipped.event, false)
            }
        };

        let duration = clipped.duration();
        let entry = tree.node_mut(node);
        entry.self_time += duration;
        entry.total_time += duration;
        if parent == root {
            tree.node_mut(root).total_time += duration;
        } else {
            tree.node_mut(parent).self_time -= duration;
        }
        stack.push((node, clipped.end, clipped.event));
    }
    Ok(tree)
}
