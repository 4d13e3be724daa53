use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use pdfloupe::decode::{DecodeStatus, StreamContent, Structured};
use pdfloupe::document::{DocumentMetadata, DocumentSession};
use pdfloupe::graph::{ObjectRef, PdfDict, PdfObject};
use pdfloupe::settings::Settings;
use pdfloupe::structure::NodeId;
use pdfloupe::test_utils::test_helpers::GraphBuilder;
use pdfloupe::view::PageTextSearcher;

const WAIT: Duration = Duration::from_secs(5);

const S: ObjectRef = ObjectRef::new(10, 0);
const T: ObjectRef = ObjectRef::new(11, 0);
const SIG: ObjectRef = ObjectRef::new(12, 0);
const BAD_SIG: ObjectRef = ObjectRef::new(13, 0);
const LZW: ObjectRef = ObjectRef::new(14, 0);

// SEQUENCE { OID 1.2.840.113549.1.7.2, [0] { INTEGER 1 } }
const SIGNED_DATA_HEX: &str = "3010 06092a864886f70d010702 a003020101>";

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn session() -> DocumentSession {
    let sig = PdfDict::new()
        .with("Type", PdfObject::name("Sig"))
        .with("Filter", PdfObject::name("ASCIIHexDecode"));
    let graph = GraphBuilder::new()
        .trailer_ref("Root", 1)
        .object(
            1,
            PdfObject::Dictionary(
                PdfDict::new()
                    .with("S", PdfObject::reference(10, 0))
                    .with("T", PdfObject::reference(11, 0))
                    .with("Sig", PdfObject::reference(12, 0))
                    .with("BadSig", PdfObject::reference(13, 0))
                    .with("Lzw", PdfObject::reference(14, 0)),
            ),
        )
        .stream(10, PdfDict::new(), b"BT (S) Tj ET")
        .stream(
            11,
            PdfDict::new().with("Filter", PdfObject::name("FlateDecode")),
            &zlib(b"BT (T) Tj ET"),
        )
        .stream(12, sig.clone(), SIGNED_DATA_HEX.as_bytes())
        .stream(13, sig, b"300501>")
        .stream(
            14,
            PdfDict::new().with("Filter", PdfObject::name("LZWDecode")),
            b"\x80\x0b",
        )
        .build();

    let mut session = DocumentSession::open(
        DocumentMetadata {
            file_name: "streams.pdf".into(),
            page_count: 1,
            ..DocumentMetadata::default()
        },
        Arc::new(graph),
        Arc::new(PageTextSearcher::default()),
        &Settings::default(),
    );
    session.tree_mut().expand_to_depth(2);
    session
}

fn node_for(session: &DocumentSession, target: ObjectRef) -> NodeId {
    session.tree().nodes_for(target)[0]
}

fn open(session: &mut DocumentSession, target: ObjectRef) {
    let node = session.tree().get(node_for(session, target)).unwrap().clone();
    assert!(session.view_mut().open_stream(&node));
}

#[test]
fn open_switch_and_reopen_from_cache() {
    let mut doc = session();

    open(&mut doc, S);
    assert!(doc.view().stream_panel_visible());
    doc.view_mut().wait_for_decodes(WAIT);
    let first_s = doc.view().displayed_stream().unwrap().clone();
    assert_eq!(first_s.target, S);
    assert!(first_s.is_success());
    assert_eq!(first_s.raw, b"BT (S) Tj ET");

    open(&mut doc, T);
    doc.view_mut().wait_for_decodes(WAIT);
    let t = doc.view().displayed_stream().unwrap().clone();
    assert_eq!(t.target, T);
    assert_eq!(t.raw, b"BT (T) Tj ET");
    assert_eq!(t.filters, vec!["FlateDecode".to_string()]);
    assert!(doc.view().is_cached(S));

    // Cache hit: no waiting, same instance
    open(&mut doc, S);
    let again = doc.view().displayed_stream().unwrap();
    assert!(Arc::ptr_eq(again, &first_s));
    assert!(doc.view().decode_service().is_idle());
    assert_eq!(doc.view().decode_service().cache_len(), 2);
}

#[test]
fn repeated_node_click_shows_same_stream() {
    let mut doc = session();
    let s = node_for(&doc, S);

    assert!(doc.open_stream_node(s));
    doc.view_mut().wait_for_decodes(WAIT);
    let first = doc.view().displayed_stream().unwrap().clone();
    assert!(first.is_success());

    assert!(doc.open_stream_node(s));
    assert!(doc.view().stream_panel_visible());
    let second = doc.view().displayed_stream().unwrap();
    assert!(Arc::ptr_eq(&first, second));
    assert_eq!(doc.view().decode_service().cache_len(), 1);

    doc.view_mut().close_stream_panel();
    assert!(!doc.view().stream_panel_visible());
    assert!(doc.view().displayed_stream().is_none());
    assert!(doc.view().is_cached(S));
}

#[test]
fn click_before_decode_finishes_keeps_panel_open() {
    let mut doc = session();
    let t = node_for(&doc, T);

    assert!(doc.open_stream_node(t));
    assert!(doc.open_stream_node(t));
    assert!(doc.view().stream_panel_visible());
    doc.view_mut().wait_for_decodes(WAIT);
    assert_eq!(doc.view().displayed_stream().unwrap().raw, b"BT (T) Tj ET");
}

#[test]
fn signature_stream_gets_structured_tree() {
    let mut doc = session();
    open(&mut doc, SIG);
    doc.view_mut().wait_for_decodes(WAIT);

    let stream = doc.view().displayed_stream().unwrap();
    assert_eq!(stream.content, StreamContent::Signature);
    assert!(stream.is_success());
    let tree = stream.structured_tree().unwrap();
    assert_eq!(tree.label, "SEQUENCE (2 elem)");
    assert_eq!(tree.children[0].label, "OBJECT IDENTIFIER 1.2.840.113549.1.7.2");
}

#[test]
fn structured_failure_keeps_raw_bytes() {
    let mut doc = session();
    open(&mut doc, BAD_SIG);
    doc.view_mut().wait_for_decodes(WAIT);

    let stream = doc.view().displayed_stream().unwrap();
    assert_eq!(stream.status, DecodeStatus::Success);
    assert_eq!(stream.raw, vec![0x30, 0x05, 0x01]);
    assert!(matches!(&stream.structured, Structured::Failed(reason) if reason.contains("truncated")));
}

#[test]
fn unsupported_filter_fails_without_breaking_the_view() {
    let mut doc = session();
    open(&mut doc, LZW);
    doc.view_mut().wait_for_decodes(WAIT);

    let stream = doc.view().displayed_stream().unwrap();
    assert!(matches!(&stream.status, DecodeStatus::Failed(reason) if reason.contains("LZWDecode")));
    assert!(stream.raw.is_empty());

    // The rest of the view keeps working
    open(&mut doc, S);
    doc.view_mut().wait_for_decodes(WAIT);
    assert!(doc.view().displayed_stream().unwrap().is_success());
}

#[test]
fn retargeting_still_fills_cache() {
    let mut doc = session();
    open(&mut doc, S);
    open(&mut doc, T);
    doc.view_mut().wait_for_decodes(WAIT);

    assert_eq!(doc.view().displayed_stream().unwrap().target, T);
    assert!(doc.view().is_cached(S));
    assert!(doc.view().is_cached(T));
}

#[test]
fn closing_document_abandons_decodes() {
    let mut doc = session();
    open(&mut doc, S);
    doc.close();
    assert!(doc.is_closed());
    assert!(!doc.view().stream_panel_visible());

    let reopened = doc.open_stream_object(T).unwrap();
    assert!(matches!(&reopened.status, DecodeStatus::Failed(reason) if reason == "document closed"));

    // Tree navigation still works
    let root = doc.tree().root();
    assert!(!doc.tree_mut().children(root).is_empty());
}

#[test]
fn fixture_file_round_trip() {
    let fixture = r#"{
        "trailer": [["Root", {"Reference": {"number": 1}}], ["Info", {"Reference": {"number": 3}}]],
        "objects": [
            {"number": 1, "object": {"Dictionary": [["Type", {"Name": "Catalog"}], ["Data", {"Reference": {"number": 2}}]]}},
            {"number": 2, "object": {"Stream": {"dict": [["Filter", {"Name": "AHx"}]]}}, "data": "68656c6c6f>"},
            {"number": 3, "object": {"Dictionary": [["Producer", {"String": [112, 100, 102]}]]}}
        ],
        "pages": ["first page", "second page"],
        "outlines": [{"title": "Start", "page": 1}]
    }"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(fixture.as_bytes()).unwrap();

    let mut doc = DocumentSession::from_fixture_path(file.path()).unwrap();
    assert_eq!(doc.info().page_count, 2);
    assert_eq!(doc.info().entries, vec![("Producer".to_string(), "pdf".to_string())]);
    assert_eq!(doc.select_outline(&[0]), Some(1));

    let pending = doc.open_stream_object(ObjectRef::new(2, 0)).unwrap();
    assert_eq!(pending.target, ObjectRef::new(2, 0));
    doc.view_mut().wait_for_decodes(WAIT);
    assert_eq!(doc.view().displayed_stream().unwrap().raw, b"hello");
}

#[test]
fn malformed_fixture_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{\"trailer\": 5}").unwrap();
    assert!(DocumentSession::from_fixture_path(file.path()).is_err());
}
