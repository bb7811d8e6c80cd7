use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Event;

/// Handle into a [`ProfileTree`] arena. Parent links are stored as handles
/// so the parent/child graph never forms an ownership cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

/// Child orderings the tree-view consumers sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    SelfTime,
    TotalTime,
    Name,
}

/// One node of an aggregated call tree: either a single event occurrence or
/// a bucket of occurrences sharing a grouping identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileNode {
    /// Grouping identity; empty for the synthetic root.
    pub id: String,
    /// Representative event — the first occurrence merged into this node.
    /// Absent for the root.
    pub event: Option<Event>,
    /// Back-reference for path reconstruction; never an owning link.
    pub parent: Option<NodeId>,
    children: HashMap<String, NodeId>,
    /// Time attributed to this node's own intervals, excluding descendants.
    pub self_time: f64,
    /// `self_time` plus all descendant total time.
    pub total_time: f64,
    group: bool,
}

impl ProfileNode {
    fn new(id: String, parent: Option<NodeId>, event: Option<Event>, group: bool) -> Self {
        Self {
            id,
            event,
            parent,
            children: HashMap::new(),
            self_time: 0.0,
            total_time: 0.0,
            group,
        }
    }

    /// True when this node is an aggregation bucket rather than one
    /// concrete event occurrence.
    pub fn is_group_node(&self) -> bool {
        self.group
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, id: &str) -> Option<NodeId> {
        self.children.get(id).copied()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }
}

/// Arena-backed call tree produced by the builders. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileTree {
    nodes: Vec<ProfileNode>,
}

impl ProfileTree {
    pub(crate) fn with_root() -> Self {
        Self {
            nodes: vec![ProfileNode::new(String::new(), None, None, false)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &ProfileNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ProfileNode {
        &mut self.nodes[id.0]
    }

    /// Total node count, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Child under `key`, creating it when absent. A second occurrence under
    /// an existing key merges (the caller adds its timings) rather than
    /// replacing the node.
    pub(crate) fn child_or_insert(
        &mut self,
        parent: NodeId,
        key: &str,
        event: &Event,
        group: bool,
    ) -> NodeId {
        if let Some(existing) = self.nodes[parent.0].children.get(key) {
            return *existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(ProfileNode::new(
            key.to_string(),
            Some(parent),
            Some(event.clone()),
            group,
        ));
        self.nodes[parent.0].children.insert(key.to_string(), id);
        id
    }

    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.values().copied()
    }

    /// Children of `id` ordered for display: times descend, names ascend,
    /// with the identity as a deterministic tie-break.
    pub fn sorted_children(&self, id: NodeId, sort: SortBy) -> Vec<NodeId> {
        let mut children: Vec<NodeId> = self.children_of(id).collect();
        children.sort_by(|a, b| {
            let (a, b) = (self.node(*a), self.node(*b));
            match sort {
                SortBy::SelfTime => b
                    .self_time
                    .total_cmp(&a.self_time)
                    .then_with(|| a.id.cmp(&b.id)),
                SortBy::TotalTime => b
                    .total_time
                    .total_cmp(&a.total_time)
                    .then_with(|| a.id.cmp(&b.id)),
                SortBy::Name => a.id.cmp(&b.id),
            }
        });
        children
    }

    /// Drill-down path for a node: its ancestors from just below the root
    /// down to the node itself, then repeated descent into the child with
    /// the largest total time until a leaf.
    pub fn heaviest_stack(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root() {
                break;
            }
            path.push(current);
            cursor = self.node(current).parent;
        }
        path.reverse();

        let mut current = id;
        loop {
            let heaviest = self.children_of(current).max_by(|a, b| {
                let (a, b) = (self.node(*a), self.node(*b));
                a.total_time
                    .total_cmp(&b.total_time)
                    .then_with(|| b.id.cmp(&a.id))
            });
            match heaviest {
                Some(child) => {
                    path.push(child);
                    current = child;
                }
                None => break,
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> Event {
        Event::new(name, 0.0, 1.0)
    }

    /// a(10) -> b(6) -> d(2)
    ///       -> c(3)
    fn sample_tree() -> (ProfileTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = ProfileTree::with_root();
        let root = tree.root();
        let a = tree.child_or_insert(root, "a", &event("a"), true);
        tree.node_mut(a).total_time = 10.0;
        tree.node_mut(a).self_time = 1.0;
        let b = tree.child_or_insert(a, "b", &event("b"), true);
        tree.node_mut(b).total_time = 6.0;
        tree.node_mut(b).self_time = 4.0;
        let c = tree.child_or_insert(a, "c", &event("c"), true);
        tree.node_mut(c).total_time = 3.0;
        tree.node_mut(c).self_time = 3.0;
        let d = tree.child_or_insert(b, "d", &event("d"), true);
        tree.node_mut(d).total_time = 2.0;
        tree.node_mut(d).self_time = 2.0;
        (tree, a, b, c, d)
    }

    #[test]
    fn insert_under_existing_key_reuses_node() {
        let mut tree = ProfileTree::with_root();
        let root = tree.root();
        let first = tree.child_or_insert(root, "x", &event("x"), true);
        let second = tree.child_or_insert(root, "x", &event("x-later"), true);
        assert_eq!(first, second);
        assert_eq!(tree.node(root).child_count(), 1);
        // The representative event stays the first occurrence.
        assert_eq!(
            tree.node(first).event.as_ref().map(|e| e.name.as_str()),
            Some("x")
        );
    }

    #[test]
    fn sorted_children_orderings() {
        let (tree, a, b, c, _) = sample_tree();
        assert_eq!(tree.sorted_children(a, SortBy::TotalTime), vec![b, c]);
        assert_eq!(tree.sorted_children(a, SortBy::SelfTime), vec![b, c]);
        assert_eq!(tree.sorted_children(a, SortBy::Name), vec![b, c]);
    }

    #[test]
    fn heaviest_stack_descends_by_total_time() {
        let (tree, a, b, _, d) = sample_tree();
        assert_eq!(tree.heaviest_stack(a), vec![a, b, d]);
    }

    #[test]
    fn heaviest_stack_includes_ancestors() {
        let (tree, a, b, _, d) = sample_tree();
        // Starting mid-tree: ancestors back to the root, then descent.
        assert_eq!(tree.heaviest_stack(b), vec![a, b, d]);
        assert_eq!(tree.heaviest_stack(d), vec![a, b, d]);
    }

    #[test]
    fn root_is_not_a_group_node() {
        let tree = ProfileTree::with_root();
        let root = tree.node(tree.root());
        assert!(!root.is_group_node());
        assert!(!root.has_children());
        assert_eq!(root.id, "");
    }
}
