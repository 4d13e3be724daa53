//! One open document: object graph, structure tree and view state

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::decode::{DecodeService, DecodedStream, DerOutline, StreamContent, StreamDecoder};
use crate::graph::{GraphFixture, MemoryGraph, ObjectGraph, ObjectRef, PdfObject};
use crate::settings::{self, Settings};
use crate::structure::{NodeId, StructureTree};
use crate::view::{Command, PageTextSearcher, ScrollRegion, TextSearcher, ViewCoordinator};

/// Contents of the info side panel
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub file_name: String,
    pub page_count: usize,
    /// Entries of the trailer's `/Info` dictionary
    pub entries: Vec<(String, String)>,
}

impl DocumentInfo {
    #[must_use]
    pub fn from_graph(file_name: &str, page_count: usize, graph: &dyn ObjectGraph) -> Self {
        let info = match graph.trailer().get("Info") {
            Some(PdfObject::Reference(target)) => graph.resolve(*target),
            other => other,
        };
        let entries = info
            .and_then(PdfObject::as_dict)
            .map(|dict| {
                dict.iter()
                    .map(|(key, value)| (key.to_string(), display_text(value)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            file_name: file_name.to_string(),
            page_count,
            entries,
        }
    }
}

fn display_text(value: &PdfObject) -> String {
    match value {
        PdfObject::String(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        other => other.to_string(),
    }
}

/// Bookmark in the outlines side panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    /// Destination page (0-based)
    pub page: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineEntry>,
}

/// Entry in the signatures side panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub field_name: String,
    #[serde(default)]
    pub signer: Option<String>,
    /// Page carrying the signature widget (0-based)
    pub page: usize,
    /// Signature value object
    #[serde(default)]
    pub value: Option<ObjectRef>,
}

/// Everything about a document that is not part of its object graph
#[derive(Clone, Debug, Default)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub page_count: usize,
    pub outlines: Vec<OutlineEntry>,
    pub signatures: Vec<SignatureEntry>,
}

/// On-disk document fixture: a graph fixture plus page text, outlines and
/// signatures
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocumentFixture {
    #[serde(flatten)]
    pub graph: GraphFixture,
    /// Text of each page, in order
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub outlines: Vec<OutlineEntry>,
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
}

pub struct DocumentSession {
    info: DocumentInfo,
    outlines: Vec<OutlineEntry>,
    signatures: Vec<SignatureEntry>,
    tree: StructureTree,
    view: ViewCoordinator,
    closed: bool,
}

impl DocumentSession {
    pub fn open<G>(
        metadata: DocumentMetadata,
        graph: Arc<G>,
        searcher: Arc<dyn TextSearcher>,
        settings: &Settings,
    ) -> Self
    where
        G: ObjectGraph + StreamDecoder + 'static,
    {
        let info = DocumentInfo::from_graph(&metadata.file_name, metadata.page_count, &*graph);
        let decoder = DecodeService::with_config(
            Arc::clone(&graph) as Arc<dyn StreamDecoder>,
            Arc::new(DerOutline),
            settings.decode_workers,
            settings.structured_decode_limit,
        );
        let tree = StructureTree::project(graph as Arc<dyn ObjectGraph>);
        let mut view = ViewCoordinator::new(decoder, searcher, metadata.page_count);
        if let Some(mode) = settings.default_side_panel {
            view.select_side_panel(mode);
        }

        info!(
            "Opened {}: {} objects, {} pages",
            info.file_name,
            tree.graph().object_count(),
            info.page_count
        );

        Self {
            info,
            outlines: metadata.outlines,
            signatures: metadata.signatures,
            tree,
            view,
            closed: false,
        }
    }

    /// Open a JSON document fixture using the current global settings
    pub fn from_fixture_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let fixture: DocumentFixture = serde_json::from_str(&content)
            .with_context(|| format!("Malformed fixture {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_fixture(fixture, &file_name, &settings::current())
    }

    pub fn from_fixture(
        fixture: DocumentFixture,
        file_name: &str,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        let graph = MemoryGraph::from_fixture(fixture.graph)
            .with_context(|| format!("Invalid object graph in {file_name}"))?;
        let metadata = DocumentMetadata {
            file_name: file_name.to_string(),
            page_count: fixture.pages.len(),
            outlines: fixture.outlines,
            signatures: fixture.signatures,
        };
        let searcher = Arc::new(PageTextSearcher::new(fixture.pages));
        Ok(Self::open(metadata, Arc::new(graph), searcher, settings))
    }

    #[must_use]
    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    #[must_use]
    pub fn outlines(&self) -> &[OutlineEntry] {
        &self.outlines
    }

    #[must_use]
    pub fn signatures(&self) -> &[SignatureEntry] {
        &self.signatures
    }

    #[must_use]
    pub fn tree(&self) -> &StructureTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut StructureTree {
        &mut self.tree
    }

    #[must_use]
    pub fn view(&self) -> &ViewCoordinator {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewCoordinator {
        &mut self.view
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Scroll the page list to the outline entry at `path` (child indices
    /// from the top level). Returns the destination page.
    pub fn select_outline(&mut self, path: &[usize]) -> Option<usize> {
        let (&first, rest) = path.split_first()?;
        let mut entry = self.outlines.get(first)?;
        for &index in rest {
            entry = entry.children.get(index)?;
        }
        let page = entry.page;
        debug!("Outline {:?} -> page {page}", entry.title);
        self.view.request_scroll(ScrollRegion::PageList, page, 0);
        Some(page)
    }

    /// Scroll the page list to the page of signature `index`
    pub fn select_signature(&mut self, index: usize) -> Option<&SignatureEntry> {
        let page = self.signatures.get(index)?.page;
        self.view.request_scroll(ScrollRegion::PageList, page, 0);
        self.signatures.get(index)
    }

    /// Route a click on a structure node to the stream panel.
    /// Nodes that are not decodable streams are ignored.
    pub fn open_stream_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        self.view.open_stream(node)
    }

    /// Show the stream object `target` in the stream panel
    pub fn open_stream_object(&mut self, target: ObjectRef) -> Option<Arc<DecodedStream>> {
        let content = match self.tree.graph().resolve(target) {
            Some(PdfObject::Stream(stream)) => StreamContent::classify(&stream.dict),
            _ => return None,
        };
        self.view.apply(Command::OpenStream { target, content });
        self.view.displayed_stream().cloned()
    }

    /// Abandon pending decodes. The tree stays navigable.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        info!("Closing {}", self.info.file_name);
        self.view.close();
        self.closed = true;
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PdfDict;

    fn graph() -> MemoryGraph {
        MemoryGraph::new(
            PdfDict::new()
                .with("Root", PdfObject::reference(1, 0))
                .with("Info", PdfObject::reference(2, 0)),
        )
        .with(1, PdfObject::Dictionary(PdfDict::new()))
        .with(
            2,
            PdfObject::Dictionary(
                PdfDict::new()
                    .with("Title", PdfObject::text("Lease"))
                    .with("Trapped", PdfObject::name("False")),
            ),
        )
    }

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            file_name: "lease.pdf".into(),
            page_count: 4,
            outlines: vec![OutlineEntry {
                title: "Terms".into(),
                page: 1,
                children: vec![OutlineEntry {
                    title: "Rent".into(),
                    page: 2,
                    children: vec![],
                }],
            }],
            signatures: vec![SignatureEntry {
                field_name: "Sig1".into(),
                signer: Some("A. Tenant".into()),
                page: 3,
                value: None,
            }],
        }
    }

    fn session(settings: &Settings) -> DocumentSession {
        DocumentSession::open(
            metadata(),
            Arc::new(graph()),
            Arc::new(PageTextSearcher::default()),
            settings,
        )
    }

    #[test]
    fn info_entries_come_from_info_dictionary() {
        let doc = session(&Settings::default());
        assert_eq!(doc.info().page_count, 4);
        assert_eq!(
            doc.info().entries,
            vec![
                ("Title".to_string(), "Lease".to_string()),
                ("Trapped".to_string(), "/False".to_string()),
            ]
        );
    }

    #[test]
    fn outline_selection_scrolls_page_list() {
        let mut doc = session(&Settings::default());
        assert_eq!(doc.select_outline(&[0, 0]), Some(2));
        let scroll = doc.view().scroll(ScrollRegion::PageList);
        assert_eq!(scroll.target.map(|t| t.index), Some(2));

        assert_eq!(doc.select_outline(&[5]), None);
        assert_eq!(doc.select_outline(&[]), None);
    }

    #[test]
    fn signature_selection_scrolls_page_list() {
        let mut doc = session(&Settings::default());
        assert_eq!(
            doc.select_signature(0).map(|s| s.field_name.as_str()),
            Some("Sig1")
        );
        doc.view_mut().scroll_finish(ScrollRegion::PageList);
        assert_eq!(doc.view().page_indicator(), "4 / 4");
        assert!(doc.select_signature(1).is_none());
    }

    #[test]
    fn default_side_panel_is_applied() {
        let settings = Settings {
            default_side_panel: Some(crate::view::SidePanelMode::Structure),
            ..Settings::default()
        };
        let doc = session(&settings);
        assert_eq!(
            doc.view().side_panel(),
            Some(crate::view::SidePanelMode::Structure)
        );
    }

    #[test]
    fn non_stream_nodes_are_not_opened() {
        let mut doc = session(&Settings::default());
        let root = doc.tree().root();
        assert!(!doc.open_stream_node(root));
        assert!(!doc.view().stream_panel_visible());
        assert!(doc.open_stream_object(ObjectRef::new(1, 0)).is_none());
    }
}
