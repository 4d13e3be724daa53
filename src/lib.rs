// Export modules for use in tests
pub mod decode;
pub mod document;
pub mod graph;
pub mod settings;
pub mod structure;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use document::{DocumentInfo, DocumentMetadata, DocumentSession};
pub use structure::{NodeId, NodeKind, StructureNode, StructureTree};
pub use view::{SidePanelMode, ViewCoordinator};
