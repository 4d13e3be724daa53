//! Projection of the object graph into a lazily expandable tree
//!
//! Nodes live in an arena addressed by [`NodeId`]. Children are materialized
//! the first time a node is expanded and kept afterwards. A reference to an
//! object already on the path from the root becomes an
//! [`NodeKind::IndirectRefOnly`] leaf, so projection always terminates.
//! Objects reached through independent paths get independent nodes.
//!
//! Dictionary entries appear in declaration order, array elements in index
//! order.

mod node;

pub use node::{NodeId, NodeKind, NodeLabel, StructureNode};

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::graph::{ChildKey, ObjectGraph, ObjectRef, PdfObject};

pub struct StructureTree {
    graph: Arc<dyn ObjectGraph>,
    nodes: Vec<StructureNode>,
}

impl StructureTree {
    /// Tree rooted at the trailer dictionary, root expanded
    #[must_use]
    pub fn project(graph: Arc<dyn ObjectGraph>) -> Self {
        let root = StructureNode {
            parent: None,
            level: 0,
            label: NodeLabel::Root,
            value: PdfObject::Dictionary(graph.trailer().clone()),
            reference: None,
            kind: NodeKind::Dictionary,
            expanded: false,
            children: None,
        };
        Self::with_root(graph, root)
    }

    /// Tree rooted at one indirect object, root expanded
    #[must_use]
    pub fn project_object(graph: Arc<dyn ObjectGraph>, target: ObjectRef) -> Self {
        let (value, kind) = match graph.resolve(target) {
            Some(PdfObject::Reference(_)) | None => {
                (PdfObject::Reference(target), NodeKind::IndirectRefOnly)
            }
            Some(object) => (object.clone(), NodeKind::of(object)),
        };
        let root = StructureNode {
            parent: None,
            level: 0,
            label: NodeLabel::Root,
            value,
            reference: Some(target),
            kind,
            expanded: false,
            children: None,
        };
        Self::with_root(graph, root)
    }

    fn with_root(graph: Arc<dyn ObjectGraph>, root: StructureNode) -> Self {
        let mut tree = Self {
            graph,
            nodes: vec![root],
        };
        tree.expand(tree.root());
        tree
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&StructureNode> {
        self.nodes.get(id.0)
    }

    /// Number of materialized nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn graph(&self) -> &Arc<dyn ObjectGraph> {
        &self.graph
    }

    #[must_use]
    pub fn has_child(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(StructureNode::has_child)
    }

    pub fn expand(&mut self, id: NodeId) {
        self.set_expanded(id, true);
    }

    pub fn collapse(&mut self, id: NodeId) {
        self.set_expanded(id, false);
    }

    /// Flip the expanded flag, returning the new state
    pub fn toggle(&mut self, id: NodeId) -> bool {
        let expanded = !self.get(id).is_some_and(StructureNode::is_expanded);
        self.set_expanded(id, expanded);
        expanded
    }

    /// Set the expanded flag. Expanding materializes children on first use.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        node.expanded = expanded;
        if expanded {
            self.materialize(id);
        }
    }

    /// Children of `id`, materializing them if needed
    pub fn children(&mut self, id: NodeId) -> &[NodeId] {
        self.materialize(id);
        self.nodes
            .get(id.0)
            .and_then(|node| node.children.as_deref())
            .unwrap_or(&[])
    }

    /// Expanded nodes flattened in display order, root first
    pub fn visible_rows(&mut self) -> Vec<NodeId> {
        let mut rows = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            rows.push(id);
            if self.nodes[id.0].expanded {
                stack.extend(self.children(id).iter().rev().copied());
            }
        }
        rows
    }

    /// Expand every node with children up to and excluding `depth`
    pub fn expand_to_depth(&mut self, depth: usize) {
        let mut queue = vec![self.root()];
        while let Some(id) = queue.pop() {
            let node = &self.nodes[id.0];
            if node.level >= depth || !node.has_child() {
                continue;
            }
            self.expand(id);
            queue.extend_from_slice(self.children(id));
        }
    }

    /// Materialized nodes standing for `target`
    #[must_use]
    pub fn nodes_for(&self, target: ObjectRef) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.reference == Some(target))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Length of the longest root-to-node path among materialized nodes
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.nodes.iter().map(StructureNode::level).max().unwrap_or(0)
    }

    /// References of `id` and all its ancestors
    fn ancestor_refs(&self, id: NodeId) -> HashSet<ObjectRef> {
        let mut refs = HashSet::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(c.0)) {
            refs.extend(node.reference);
            current = node.parent;
        }
        refs
    }

    fn materialize(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        if node.children.is_some() {
            return;
        }
        if !node.kind.is_container() {
            self.nodes[id.0].children = Some(Vec::new());
            return;
        }

        let ancestors = self.ancestor_refs(id);
        let level = node.level + 1;
        let projected: Vec<StructureNode> = node
            .value
            .children()
            .into_iter()
            .map(|(key, value)| self.project_child(id, level, key, value, &ancestors))
            .collect();

        let first = self.nodes.len();
        let ids = (first..first + projected.len()).map(NodeId).collect();
        debug!(
            "Materialized {} children of node {} at level {level}",
            projected.len(),
            id.0
        );
        self.nodes.extend(projected);
        self.nodes[id.0].children = Some(ids);
    }

    fn project_child(
        &self,
        parent: NodeId,
        level: usize,
        key: ChildKey,
        value: &PdfObject,
        ancestors: &HashSet<ObjectRef>,
    ) -> StructureNode {
        let (value, reference, kind) = match value {
            PdfObject::Reference(target) => {
                let target = *target;
                match self.graph.resolve(target) {
                    Some(resolved) if !ancestors.contains(&target) => {
                        (resolved.clone(), Some(target), NodeKind::of(resolved))
                    }
                    _ => (value.clone(), Some(target), NodeKind::IndirectRefOnly),
                }
            }
            inline => (inline.clone(), None, NodeKind::of(inline)),
        };

        StructureNode {
            parent: Some(parent),
            level,
            label: NodeLabel::Child(key),
            value,
            reference,
            kind,
            expanded: false,
            children: None,
        }
    }
}
