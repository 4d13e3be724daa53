//! Arena-backed object graph

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{GraphError, ObjectGraph, ObjectRef, PdfDict, PdfObject, PdfStream};
use crate::decode::{DecodeFault, RawStream, StreamDecoder, filters};

/// Objects stored by reference handle, with encoded stream bodies kept
/// alongside so the graph can serve as its own raw stream decoder.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    trailer: PdfDict,
    objects: BTreeMap<ObjectRef, PdfObject>,
    stream_data: HashMap<ObjectRef, Vec<u8>>,
}

impl MemoryGraph {
    #[must_use]
    pub fn new(trailer: PdfDict) -> Self {
        Self {
            trailer,
            ..Self::default()
        }
    }

    pub fn set_trailer(&mut self, trailer: PdfDict) {
        self.trailer = trailer;
    }

    /// Insert or replace an indirect object
    pub fn insert(&mut self, target: ObjectRef, object: PdfObject) {
        self.objects.insert(target, object);
    }

    /// Insert a stream object with its encoded body
    pub fn insert_stream(&mut self, target: ObjectRef, dict: PdfDict, data: impl Into<Vec<u8>>) {
        self.objects
            .insert(target, PdfObject::Stream(PdfStream::new(dict)));
        self.stream_data.insert(target, data.into());
    }

    /// Builder-style [`Self::insert`]
    #[must_use]
    pub fn with(mut self, number: u32, object: PdfObject) -> Self {
        self.insert(ObjectRef::new(number, 0), object);
        self
    }

    /// Builder-style [`Self::insert_stream`]
    #[must_use]
    pub fn with_stream(mut self, number: u32, dict: PdfDict, data: impl Into<Vec<u8>>) -> Self {
        self.insert_stream(ObjectRef::new(number, 0), dict, data);
        self
    }

    /// Encoded stream body as stored
    #[must_use]
    pub fn encoded_data(&self, target: ObjectRef) -> Option<&[u8]> {
        self.stream_data.get(&target).map(Vec::as_slice)
    }

    pub fn from_fixture(fixture: GraphFixture) -> Result<Self, GraphError> {
        let mut graph = Self::new(fixture.trailer);
        for entry in fixture.objects {
            let target = ObjectRef::new(entry.number, entry.generation);
            if graph.objects.contains_key(&target) {
                return Err(GraphError::Duplicate(target));
            }
            let data = match (entry.data, entry.data_hex) {
                (Some(text), _) => Some(text.into_bytes()),
                (None, Some(hex)) => Some(filters::decode_ascii_hex(hex.as_bytes())),
                (None, None) => None,
            };
            let is_stream = matches!(entry.object, PdfObject::Stream(_));
            if is_stream {
                graph.stream_data.insert(target, data.unwrap_or_default());
            } else if data.is_some() {
                return Err(GraphError::NotAStream(target));
            }
            graph.objects.insert(target, entry.object);
        }
        debug!("Loaded graph with {} objects", graph.objects.len());
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_fixture(serde_json::from_str(json)?)
    }
}

impl ObjectGraph for MemoryGraph {
    fn trailer(&self) -> &PdfDict {
        &self.trailer
    }

    fn resolve(&self, target: ObjectRef) -> Option<&PdfObject> {
        self.objects.get(&target)
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl StreamDecoder for MemoryGraph {
    fn decode(&self, target: ObjectRef) -> Result<RawStream, DecodeFault> {
        let Some(object) = self.objects.get(&target) else {
            return Err(DecodeFault::Missing(target));
        };
        let PdfObject::Stream(stream) = object else {
            return Err(DecodeFault::NotAStream(target));
        };
        let encoded = self
            .stream_data
            .get(&target)
            .map(Vec::as_slice)
            .unwrap_or_default();
        filters::decode_body(encoded, &stream.dict)
    }
}

/// On-disk form of a graph: the trailer plus a flat object list.
///
/// Stream bodies are given either as text (`data`) or hex (`data_hex`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphFixture {
    pub trailer: PdfDict,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub number: u32,
    #[serde(default)]
    pub generation: u16,
    pub object: PdfObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hex: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "trailer": [["Root", {"Reference": {"number": 1}}]],
        "objects": [
            {"number": 1, "object": {"Dictionary": [["Type", {"Name": "Catalog"}]]}},
            {"number": 2, "object": {"Stream": {"dict": [["Length", {"Integer": 5}]]}}, "data": "hello"},
            {"number": 3, "object": {"Stream": {"dict": []}}, "data_hex": "0a0b"}
        ]
    }"#;

    #[test]
    fn loads_json_fixture() {
        let graph = MemoryGraph::from_json(FIXTURE).unwrap();
        assert_eq!(graph.object_count(), 3);
        assert_eq!(
            graph.trailer().get("Root"),
            Some(&PdfObject::reference(1, 0))
        );
        assert_eq!(graph.encoded_data(ObjectRef::new(2, 0)), Some(&b"hello"[..]));
        assert_eq!(graph.encoded_data(ObjectRef::new(3, 0)), Some(&[0x0a, 0x0b][..]));
    }

    #[test]
    fn rejects_duplicates_and_data_on_non_streams() {
        let dup = r#"{"trailer": [], "objects": [
            {"number": 1, "object": "Null"},
            {"number": 1, "object": "Null"}
        ]}"#;
        assert!(matches!(
            MemoryGraph::from_json(dup),
            Err(GraphError::Duplicate(_))
        ));

        let bad = r#"{"trailer": [], "objects": [
            {"number": 1, "object": "Null", "data": "x"}
        ]}"#;
        assert!(matches!(
            MemoryGraph::from_json(bad),
            Err(GraphError::NotAStream(_))
        ));
    }

    #[test]
    fn decode_reports_missing_and_non_stream() {
        let graph = MemoryGraph::default().with(1, PdfObject::Integer(4));
        assert!(matches!(
            graph.decode(ObjectRef::new(9, 0)),
            Err(DecodeFault::Missing(_))
        ));
        assert!(matches!(
            graph.decode(ObjectRef::new(1, 0)),
            Err(DecodeFault::NotAStream(_))
        ));
    }

    #[test]
    fn decode_plain_stream() {
        let graph = MemoryGraph::default().with_stream(4, PdfDict::new(), b"BT ET".to_vec());
        let raw = graph.decode(ObjectRef::new(4, 0)).unwrap();
        assert_eq!(raw.data, b"BT ET");
        assert!(raw.filters.is_empty());
    }
}
