//! PDF object value model

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an indirect object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object number
    pub number: u32,
    /// Generation number
    #[serde(default)]
    pub generation: u16,
}

impl ObjectRef {
    #[must_use]
    pub const fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// A decoded PDF object. Streams carry only their dictionary; the body is
/// fetched through a [`crate::decode::StreamDecoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(String),
    String(Vec<u8>),
    Array(Vec<PdfObject>),
    Dictionary(PdfDict),
    Stream(PdfStream),
    Reference(ObjectRef),
}

/// Dictionary preserving declaration order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PdfDict {
    entries: Vec<(String, PdfObject)>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfStream {
    pub dict: PdfDict,
}

impl PdfDict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing the value if the key already exists.
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: PdfObject) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: PdfObject) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Name value of `key`, without the leading slash
    #[must_use]
    pub fn get_name(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(PdfObject::Name(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_name(&self, key: &str, value: &str) -> bool {
        self.get_name(key).is_some_and(|name| name == value)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PdfObject)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, PdfObject)> for PdfDict {
    fn from_iter<T: IntoIterator<Item = (String, PdfObject)>>(iter: T) -> Self {
        let mut dict = Self::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

impl PdfStream {
    #[must_use]
    pub fn new(dict: PdfDict) -> Self {
        Self { dict }
    }
}

impl PdfObject {
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::String(text.as_bytes().to_vec())
    }

    #[must_use]
    pub const fn reference(number: u32, generation: u16) -> Self {
        Self::Reference(ObjectRef::new(number, generation))
    }

    #[must_use]
    pub fn as_dict(&self) -> Option<&PdfDict> {
        match self {
            Self::Dictionary(dict) => Some(dict),
            Self::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// Structural children in display order: dictionary entries in
    /// declaration order, array elements in index order, stream dictionary
    /// entries for streams. Scalars have none.
    #[must_use]
    pub fn children(&self) -> Vec<(ChildKey, &PdfObject)> {
        match self {
            Self::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (ChildKey::Index(i), v))
                .collect(),
            Self::Dictionary(dict) | Self::Stream(PdfStream { dict }) => dict
                .iter()
                .map(|(k, v)| (ChildKey::Key(k.to_string()), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// True if [`Self::children`] would be non-empty
    #[must_use]
    pub fn has_children(&self) -> bool {
        match self {
            Self::Array(items) => !items.is_empty(),
            Self::Dictionary(dict) | Self::Stream(PdfStream { dict }) => !dict.is_empty(),
            _ => false,
        }
    }
}

/// Position of a child within its parent
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChildKey {
    Key(String),
    Index(usize),
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "/{key}"),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Inline rendering of scalar values, e.g. `/Catalog`, `(Hello)`, `<00ff>`
impl fmt::Display for PdfObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Name(name) => write!(f, "/{name}"),
            Self::String(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) if !text.chars().any(char::is_control) => write!(f, "({text})"),
                _ => {
                    f.write_str("<")?;
                    for b in bytes.iter().take(32) {
                        write!(f, "{b:02x}")?;
                    }
                    if bytes.len() > 32 {
                        f.write_str("...")?;
                    }
                    f.write_str(">")
                }
            },
            Self::Array(items) => write!(f, "Array [{}]", items.len()),
            Self::Dictionary(dict) => write!(f, "Dictionary [{}]", dict.len()),
            Self::Stream(_) => f.write_str("Stream"),
            Self::Reference(r) => write!(f, "{r}"),
        }
    }
}
