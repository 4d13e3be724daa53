//! Read-only view of a decoded PDF's object graph

mod memory;
mod object;

pub use memory::{GraphFixture, MemoryGraph, ObjectEntry};
pub use object::{ChildKey, ObjectRef, PdfDict, PdfObject, PdfStream};

/// Provider of a document's objects.
///
/// Implementations are immutable once the document is loaded; the structure
/// tree and the decode pipeline only ever read from them.
pub trait ObjectGraph: Send + Sync {
    /// Trailer dictionary, the conceptual root of the structure tree
    fn trailer(&self) -> &PdfDict;

    /// Look up an indirect object. `None` for dangling references.
    fn resolve(&self, target: ObjectRef) -> Option<&PdfObject>;

    /// Number of indirect objects in the document
    fn object_count(&self) -> usize;

    fn contains(&self, target: ObjectRef) -> bool {
        self.resolve(target).is_some()
    }
}

/// Errors raised while building a graph from external input
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("malformed graph fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object {0} is defined more than once")]
    Duplicate(ObjectRef),

    #[error("stream data supplied for {0}, which is not a stream")]
    NotAStream(ObjectRef),
}
