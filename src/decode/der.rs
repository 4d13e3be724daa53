//! BER/DER outline decoder for signature containers
//!
//! Walks tag-length-value elements into a [`StructuredNode`] tree. It does
//! not interpret CMS semantics; labels carry the tag name and a short value
//! preview.

use super::StructuredDecoder;
use super::request::StructuredDecodeError;
use super::types::StructuredNode;

const MAX_DEPTH: usize = 64;
const PREVIEW_BYTES: usize = 16;

#[derive(Clone, Copy, Debug, Default)]
pub struct DerOutline;

impl StructuredDecoder for DerOutline {
    fn parse(&self, bytes: &[u8]) -> Result<StructuredNode, StructuredDecodeError> {
        let mut reader = Reader {
            data: bytes,
            pos: 0,
        };
        let mut elements = Vec::new();
        // Signature /Contents are zero-padded to their reserved size
        while !reader.data[reader.pos..].iter().all(|&b| b == 0) {
            elements.push(reader.element(0)?);
        }
        if elements.is_empty() {
            return Err(StructuredDecodeError::Empty);
        }
        if elements.len() == 1 {
            Ok(elements.remove(0))
        } else {
            Ok(StructuredNode::new(
                format!("{} top-level elements", elements.len()),
                elements,
            ))
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

struct Header {
    class: u8,
    constructed: bool,
    number: u32,
    /// `None` for indefinite length
    len: Option<usize>,
}

impl Reader<'_> {
    fn byte(&mut self) -> Result<u8, StructuredDecodeError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(StructuredDecodeError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn header(&mut self) -> Result<Header, StructuredDecodeError> {
        let first = self.byte()?;
        let class = first >> 6;
        let constructed = first & 0x20 != 0;
        let mut number = u32::from(first & 0x1f);
        if number == 0x1f {
            number = 0;
            loop {
                let b = self.byte()?;
                number = number
                    .checked_mul(128)
                    .ok_or(StructuredDecodeError::BadLength { offset: self.pos })?
                    | u32::from(b & 0x7f);
                if b & 0x80 == 0 {
                    break;
                }
            }
        }

        let offset = self.pos;
        let len_byte = self.byte()?;
        let len = match len_byte {
            0x80 if constructed => None,
            0x80 => return Err(StructuredDecodeError::BadLength { offset }),
            b if b < 0x80 => Some(usize::from(b)),
            b => {
                let count = usize::from(b & 0x7f);
                if count > std::mem::size_of::<usize>() {
                    return Err(StructuredDecodeError::BadLength { offset });
                }
                let mut len = 0usize;
                for _ in 0..count {
                    len = (len << 8) | usize::from(self.byte()?);
                }
                Some(len)
            }
        };

        Ok(Header {
            class,
            constructed,
            number,
            len,
        })
    }

    fn element(&mut self, depth: usize) -> Result<StructuredNode, StructuredDecodeError> {
        let start = self.pos;
        if depth > MAX_DEPTH {
            return Err(StructuredDecodeError::TooDeep {
                offset: start,
                limit: MAX_DEPTH,
            });
        }
        let header = self.header()?;
        let name = tag_name(&header);

        if header.constructed {
            let mut children = Vec::new();
            match header.len {
                Some(len) => {
                    let end = self.content_end(len)?;
                    while self.pos < end {
                        children.push(self.element(depth + 1)?);
                    }
                    // A child may not run past its parent's content
                    if self.pos != end {
                        return Err(StructuredDecodeError::Truncated { offset: start });
                    }
                }
                None => loop {
                    if self.data.get(self.pos..self.pos + 2) == Some(&[0, 0]) {
                        self.pos += 2;
                        break;
                    }
                    if self.pos >= self.data.len() {
                        return Err(StructuredDecodeError::Truncated { offset: start });
                    }
                    children.push(self.element(depth + 1)?);
                },
            }
            return Ok(StructuredNode::new(
                format!("{name} ({} elem)", children.len()),
                children,
            ));
        }

        let len = header.len.unwrap_or_default();
        let end = self.content_end(len)?;
        let value = &self.data[self.pos..end];
        self.pos = end;
        let preview = preview(&header, value);
        Ok(StructuredNode::leaf(if preview.is_empty() {
            name
        } else {
            format!("{name} {preview}")
        }))
    }

    fn content_end(&self, len: usize) -> Result<usize, StructuredDecodeError> {
        self.pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(StructuredDecodeError::Truncated { offset: self.pos })
    }
}

fn tag_name(header: &Header) -> String {
    match header.class {
        0 => match header.number {
            1 => "BOOLEAN".into(),
            2 => "INTEGER".into(),
            3 => "BIT STRING".into(),
            4 => "OCTET STRING".into(),
            5 => "NULL".into(),
            6 => "OBJECT IDENTIFIER".into(),
            10 => "ENUMERATED".into(),
            12 => "UTF8String".into(),
            16 => "SEQUENCE".into(),
            17 => "SET".into(),
            19 => "PrintableString".into(),
            20 => "T61String".into(),
            22 => "IA5String".into(),
            23 => "UTCTime".into(),
            24 => "GeneralizedTime".into(),
            30 => "BMPString".into(),
            n => format!("UNIVERSAL {n}"),
        },
        1 => format!("[APPLICATION {}]", header.number),
        2 => format!("[{}]", header.number),
        _ => format!("[PRIVATE {}]", header.number),
    }
}

fn preview(header: &Header, value: &[u8]) -> String {
    if header.class != 0 {
        return format!("({} bytes)", value.len());
    }
    match header.number {
        1 => (value.first().copied().unwrap_or(0) != 0).to_string(),
        5 => String::new(),
        6 => oid_string(value),
        12 | 19 | 20 | 22 | 23 | 24 => String::from_utf8_lossy(value).into_owned(),
        2 | 10 => hex_preview(value),
        _ => format!("({} bytes)", value.len()),
    }
}

fn hex_preview(value: &[u8]) -> String {
    let mut out = String::from("0x");
    for b in value.iter().take(PREVIEW_BYTES) {
        out.push_str(&format!("{b:02x}"));
    }
    if value.len() > PREVIEW_BYTES {
        out.push_str("...");
    }
    out
}

fn oid_string(value: &[u8]) -> String {
    let mut arcs: Vec<u64> = Vec::new();
    let mut acc: u64 = 0;
    for &b in value {
        acc = (acc << 7) | u64::from(b & 0x7f);
        if b & 0x80 == 0 {
            if arcs.is_empty() {
                let first = (acc / 40).min(2);
                arcs.push(first);
                arcs.push(acc - first * 40);
            } else {
                arcs.push(acc);
            }
            acc = 0;
        }
    }
    arcs.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
