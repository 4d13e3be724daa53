pub mod test_helpers {
    use std::sync::Arc;

    use crate::decode::DecodeService;
    use crate::graph::{MemoryGraph, ObjectRef, PdfDict, PdfObject};
    use crate::view::{PageTextSearcher, ViewCoordinator};

    /// Builder for object graphs used in tests
    #[derive(Default)]
    pub struct GraphBuilder {
        graph: MemoryGraph,
        trailer: PdfDict,
    }

    impl GraphBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a trailer entry pointing at object `number`
        pub fn trailer_ref(mut self, key: &str, number: u32) -> Self {
            self.trailer
                .insert(key, PdfObject::reference(number, 0));
            self
        }

        /// Add a dictionary object whose entries reference other objects
        pub fn dict_refs(mut self, number: u32, refs: &[(&str, u32)]) -> Self {
            let dict = refs
                .iter()
                .map(|(key, target)| ((*key).to_string(), PdfObject::reference(*target, 0)))
                .collect();
            self.graph
                .insert(ObjectRef::new(number, 0), PdfObject::Dictionary(dict));
            self
        }

        /// Add an arbitrary object
        pub fn object(mut self, number: u32, object: PdfObject) -> Self {
            self.graph.insert(ObjectRef::new(number, 0), object);
            self
        }

        /// Add a stream with a plain (unfiltered) body
        pub fn stream(mut self, number: u32, dict: PdfDict, body: &[u8]) -> Self {
            self.graph
                .insert_stream(ObjectRef::new(number, 0), dict, body.to_vec());
            self
        }

        pub fn build(mut self) -> MemoryGraph {
            self.graph.set_trailer(self.trailer);
            self.graph
        }
    }

    /// Objects A(1) -> B(2) -> C(3) -> A, A -> D(4), and E(5) -> D.
    /// The trailer reaches A as /Root and E as /Extra.
    pub fn cyclic_graph() -> MemoryGraph {
        GraphBuilder::new()
            .trailer_ref("Root", 1)
            .trailer_ref("Extra", 5)
            .dict_refs(1, &[("B", 2), ("D", 4)])
            .dict_refs(2, &[("C", 3)])
            .dict_refs(3, &[("A", 1)])
            .object(
                4,
                PdfObject::Dictionary(PdfDict::new().with("Leaf", PdfObject::Integer(7))),
            )
            .dict_refs(5, &[("D", 4)])
            .build()
    }

    /// Page text with "contract" on pages 2, 5 and 5 (0-based)
    pub fn contract_pages() -> Vec<String> {
        vec![
            "Cover page".to_string(),
            "Table of contents".to_string(),
            "This contract is made between the parties.".to_string(),
            "Definitions".to_string(),
            "Payment terms".to_string(),
            "Termination of the Contract and survival of the contract terms.".to_string(),
        ]
    }

    /// Coordinator over `graph` with a single decode worker
    pub fn coordinator(graph: MemoryGraph, pages: Vec<String>) -> ViewCoordinator {
        let page_count = pages.len();
        let decoder = DecodeService::with_config(
            Arc::new(graph),
            Arc::new(crate::decode::DerOutline),
            1,
            crate::decode::DEFAULT_STRUCTURED_LIMIT,
        );
        ViewCoordinator::new(decoder, Arc::new(PageTextSearcher::new(pages)), page_count)
    }
}
