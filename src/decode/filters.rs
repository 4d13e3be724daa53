//! Stream filter decoding

use std::io::Read;

use super::request::DecodeFault;
use super::types::RawStream;
use crate::graph::{PdfDict, PdfObject};

/// Image codecs whose encoded form is the displayable payload
const PASSTHROUGH_FILTERS: [&str; 4] = ["DCTDecode", "JPXDecode", "CCITTFaxDecode", "JBIG2Decode"];

/// Filter names listed in `/Filter`, a single name or an array of names
#[must_use]
pub fn stream_filters(dict: &PdfDict) -> Vec<String> {
    match dict.get("Filter") {
        Some(PdfObject::Name(name)) => vec![name.clone()],
        Some(PdfObject::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                PdfObject::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Apply the stream's filter chain to its encoded body.
///
/// Decoding stops at the first image codec; the bytes from that point are
/// returned as-is.
pub fn decode_body(encoded: &[u8], dict: &PdfDict) -> Result<RawStream, DecodeFault> {
    let mut data = encoded.to_vec();
    let mut applied = Vec::new();

    for filter in stream_filters(dict) {
        if PASSTHROUGH_FILTERS.contains(&filter.as_str()) {
            break;
        }
        data = match filter.as_str() {
            "FlateDecode" | "Fl" => decode_flate(&data).map_err(|e| DecodeFault::Corrupt {
                filter: filter.clone(),
                detail: e.to_string(),
            })?,
            "ASCIIHexDecode" | "AHx" => decode_ascii_hex(&data),
            "RunLengthDecode" | "RL" => decode_run_length(&data),
            other => return Err(DecodeFault::UnsupportedFilter(other.to_string())),
        };
        applied.push(filter);
    }

    Ok(RawStream {
        data,
        filters: applied,
    })
}

fn decode_flate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Decode hex digits, skipping whitespace and stopping at `>`.
/// An odd trailing digit is padded with zero.
#[must_use]
pub fn decode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = data
        .iter()
        .copied()
        .take_while(|&b| b != b'>')
        .filter_map(hex_val)
        .collect();

    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn decode_run_length(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < data.len() {
        let n = data[i];
        i += 1;
        if n == 128 {
            break;
        } else if n <= 127 {
            let count = usize::from(n) + 1;
            if i + count > data.len() {
                break;
            }
            out.extend_from_slice(&data[i..i + count]);
            i += count;
        } else {
            let count = 257 - usize::from(n);
            let Some(&b) = data.get(i) else {
                break;
            };
            out.extend(std::iter::repeat_n(b, count));
            i += 1;
        }
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn flate_round_trip() {
        let dict = PdfDict::new().with("Filter", PdfObject::name("FlateDecode"));
        let raw = decode_body(&zlib(b"q 1 0 0 1 0 0 cm Q"), &dict).unwrap();
        assert_eq!(raw.data, b"q 1 0 0 1 0 0 cm Q");
        assert_eq!(raw.filters, vec!["FlateDecode".to_string()]);
    }

    #[test]
    fn filter_chain_applies_in_order() {
        let dict = PdfDict::new().with(
            "Filter",
            PdfObject::Array(vec![
                PdfObject::name("ASCIIHexDecode"),
                PdfObject::name("FlateDecode"),
            ]),
        );
        let hex: String = zlib(b"chained")
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        let raw = decode_body(format!("{hex}>").as_bytes(), &dict).unwrap();
        assert_eq!(raw.data, b"chained");
        assert_eq!(raw.filters.len(), 2);
    }

    #[test]
    fn corrupt_flate_is_a_fault() {
        let dict = PdfDict::new().with("Filter", PdfObject::name("FlateDecode"));
        let err = decode_body(b"not zlib at all", &dict).unwrap_err();
        assert!(matches!(err, DecodeFault::Corrupt { .. }));
    }

    #[test]
    fn image_codecs_pass_through() {
        let dict = PdfDict::new().with("Filter", PdfObject::name("DCTDecode"));
        let raw = decode_body(&[0xff, 0xd8, 0xff], &dict).unwrap();
        assert_eq!(raw.data, vec![0xff, 0xd8, 0xff]);
        assert!(raw.filters.is_empty());
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let dict = PdfDict::new().with("Filter", PdfObject::name("Crypt"));
        assert!(matches!(
            decode_body(b"", &dict),
            Err(DecodeFault::UnsupportedFilter(name)) if name == "Crypt"
        ));
    }

    #[test]
    fn ascii_hex_handles_whitespace_and_odd_digits() {
        assert_eq!(decode_ascii_hex(b"48 65\n6c6c 6f>"), b"Hello");
        assert_eq!(decode_ascii_hex(b"7"), vec![0x70]);
    }

    #[test]
    fn run_length_literal_and_repeat() {
        // 2 literal bytes, then 'z' repeated 3 times, then EOD
        let data = [1, b'a', b'b', 254, b'z', 128];
        assert_eq!(decode_run_length(&data), b"abzzz");
    }
}
