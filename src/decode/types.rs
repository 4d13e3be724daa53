//! Core types for stream decoding

use std::fmt;

use crate::graph::{ObjectRef, PdfDict};

/// Decoded body of a stream before any structured interpretation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawStream {
    /// Fully decoded bytes
    pub data: Vec<u8>,
    /// Filters that were applied, in order
    pub filters: Vec<String>,
}

/// What a stream's dictionary declares it to contain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamContent {
    /// Signature container (PKCS#7 / CMS / timestamp token)
    Signature,
    Image,
    /// XMP metadata
    Metadata,
    /// Embedded font program
    Font,
    EmbeddedFile,
    /// Page content or anything else
    Content,
}

const SIGNATURE_SUBFILTERS: [&str; 5] = [
    "adbe.pkcs7.detached",
    "adbe.pkcs7.sha1",
    "adbe.x509.rsa_sha1",
    "ETSI.CAdES.detached",
    "ETSI.RFC3161",
];

impl StreamContent {
    /// Classify a stream from its dictionary
    #[must_use]
    pub fn classify(dict: &PdfDict) -> Self {
        if dict.has_name("Type", "Sig")
            || dict.has_name("Type", "DocTimeStamp")
            || dict
                .get_name("SubFilter")
                .is_some_and(|sub| SIGNATURE_SUBFILTERS.contains(&sub))
        {
            return Self::Signature;
        }
        if dict.has_name("Subtype", "Image") {
            return Self::Image;
        }
        if dict.has_name("Type", "Metadata") {
            return Self::Metadata;
        }
        if dict.has_name("Type", "EmbeddedFile") {
            return Self::EmbeddedFile;
        }
        if ["Length1", "Length2", "Length3"]
            .iter()
            .any(|k| dict.contains_key(k))
            || ["Type1C", "CIDFontType0C", "OpenType"]
                .iter()
                .any(|s| dict.has_name("Subtype", s))
        {
            return Self::Font;
        }
        Self::Content
    }

    /// Whether the body should be handed to the structured decoder
    #[must_use]
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Signature)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signature => "Signature",
            Self::Image => "Image",
            Self::Metadata => "Metadata",
            Self::Font => "Font",
            Self::EmbeddedFile => "Embedded file",
            Self::Content => "Content",
        }
    }
}

/// One node of a structured interpretation (e.g. an ASN.1 element)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredNode {
    pub label: String,
    pub children: Vec<StructuredNode>,
}

impl StructuredNode {
    #[must_use]
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn new(label: impl Into<String>, children: Vec<StructuredNode>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    /// Total number of nodes in this subtree
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Depth-first walk yielding `(depth, label)`
    #[must_use]
    pub fn lines(&self) -> Vec<(usize, &str)> {
        let mut out = Vec::new();
        self.collect_lines(0, &mut out);
        out
    }

    fn collect_lines<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a str)>) {
        out.push((depth, self.label.as_str()));
        for child in &self.children {
            child.collect_lines(depth + 1, out);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeStatus {
    Pending,
    Success,
    Failed(String),
}

/// Outcome of the secondary decoder
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Structured {
    /// Content type is not a structured format
    NotApplicable,
    Parsed(StructuredNode),
    /// Raw bytes remain valid; only the interpretation failed
    Failed(String),
}

/// Result of decoding one stream object
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedStream {
    pub target: ObjectRef,
    pub content: StreamContent,
    pub status: DecodeStatus,
    pub raw: Vec<u8>,
    pub filters: Vec<String>,
    pub structured: Structured,
}

impl DecodedStream {
    #[must_use]
    pub fn pending(target: ObjectRef, content: StreamContent) -> Self {
        Self {
            target,
            content,
            status: DecodeStatus::Pending,
            raw: Vec::new(),
            filters: Vec::new(),
            structured: Structured::NotApplicable,
        }
    }

    #[must_use]
    pub fn failed(target: ObjectRef, content: StreamContent, reason: impl Into<String>) -> Self {
        Self {
            status: DecodeStatus::Failed(reason.into()),
            ..Self::pending(target, content)
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == DecodeStatus::Pending
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == DecodeStatus::Success
    }

    /// Structured tree, if one was parsed
    #[must_use]
    pub fn structured_tree(&self) -> Option<&StructuredNode> {
        match &self.structured {
            Structured::Parsed(tree) => Some(tree),
            _ => None,
        }
    }
}

impl fmt::Debug for DecodedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedStream")
            .field("target", &self.target)
            .field("content", &self.content)
            .field("status", &self.status)
            .field("raw_len", &self.raw.len())
            .field("filters", &self.filters)
            .field(
                "structured",
                &match &self.structured {
                    Structured::NotApplicable => "n/a".to_string(),
                    Structured::Parsed(tree) => format!("{} nodes", tree.node_count()),
                    Structured::Failed(reason) => format!("failed: {reason}"),
                },
            )
            .finish()
    }
}
