//! Nodes of the structure tree

use std::fmt;

use crate::decode::StreamContent;
use crate::graph::{ChildKey, ObjectRef, PdfObject};

/// Index of a node in its [`StructureTree`](super::StructureTree) arena.
/// Stable for the lifetime of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Dictionary,
    Array,
    Stream,
    Primitive,
    /// Reference that is not followed: cycle back to an ancestor, dangling,
    /// or pointing at another bare reference
    IndirectRefOnly,
}

impl NodeKind {
    #[must_use]
    pub fn of(object: &PdfObject) -> Self {
        match object {
            PdfObject::Dictionary(_) => Self::Dictionary,
            PdfObject::Array(_) => Self::Array,
            PdfObject::Stream(_) => Self::Stream,
            PdfObject::Reference(_) => Self::IndirectRefOnly,
            _ => Self::Primitive,
        }
    }

    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Dictionary | Self::Array | Self::Stream)
    }
}

/// Where a node sits within its parent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeLabel {
    Root,
    Child(ChildKey),
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Trailer"),
            Self::Child(key) => write!(f, "{key}"),
        }
    }
}

/// One appearance of an object in the tree.
///
/// Only `expanded` and the memoized `children` ever change after creation.
#[derive(Clone, Debug)]
pub struct StructureNode {
    pub(super) parent: Option<NodeId>,
    pub(super) level: usize,
    pub(super) label: NodeLabel,
    /// Resolved value; the bare reference for `IndirectRefOnly` nodes
    pub(super) value: PdfObject,
    /// Indirect object this node stands for, if it came through a reference
    pub(super) reference: Option<ObjectRef>,
    pub(super) kind: NodeKind,
    pub(super) expanded: bool,
    /// `None` until first expanded
    pub(super) children: Option<Vec<NodeId>>,
}

impl StructureNode {
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    #[must_use]
    pub fn label(&self) -> &NodeLabel {
        &self.label
    }

    #[must_use]
    pub fn value(&self) -> &PdfObject {
        &self.value
    }

    #[must_use]
    pub fn reference(&self) -> Option<ObjectRef> {
        self.reference
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Whether the children have been materialized
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.children.is_some()
    }

    /// Cheap check that expanding would yield at least one child
    #[must_use]
    pub fn has_child(&self) -> bool {
        self.kind.is_container() && self.value.has_children()
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.kind == NodeKind::Stream
    }

    /// A stream with an object identity that can key the decode cache
    #[must_use]
    pub fn is_parseable(&self) -> bool {
        self.is_stream() && self.reference.is_some()
    }

    /// Declared content of a stream node
    #[must_use]
    pub fn stream_content(&self) -> Option<StreamContent> {
        match &self.value {
            PdfObject::Stream(stream) => Some(StreamContent::classify(&stream.dict)),
            _ => None,
        }
    }

    /// One-line summary, e.g. `/Kids: Array [2]` or `/Parent: 3 0 R`
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.kind, self.reference) {
            (NodeKind::IndirectRefOnly, _) | (_, None) => format!("{}: {}", self.label, self.value),
            (_, Some(r)) => format!("{}: {} ({r})", self.label, self.value),
        }
    }
}
