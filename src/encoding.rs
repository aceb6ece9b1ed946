use crate::errors::{Error, ReadFailure, Result, WriteFailure};
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Byte values that have no mapping in the Windows-1252 code page.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// The default probing order. Latin-1 goes last since every byte sequence is
/// valid Latin-1.
pub const DEFAULT_ENCODINGS: [&str; 4] = ["utf-8", "utf-16", "cp1252", "iso-8859-1"];

/// A candidate text encoding the prober can try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-16 with byte-order-mark sniffing; little endian when no mark is present.
    Utf16,
    Windows1252,
    /// ISO-8859-1, where each byte is the code point of the same value.
    Latin1,
    /// Any other single- or multi-byte encoding `encoding_rs` can round-trip.
    Other(&'static Encoding),
}

impl TextEncoding {
    /// The label printed next to processed files.
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Windows1252 => "cp1252",
            TextEncoding::Latin1 => "iso-8859-1",
            TextEncoding::Other(encoding) => encoding.name(),
        }
    }

    /// Strictly decodes `bytes`, returning `None` on the first malformed sequence.
    fn decode<'a>(&self, bytes: &'a [u8]) -> Option<(Cow<'a, str>, DetectedEncoding)> {
        match self {
            TextEncoding::Utf8 => {
                let text = UTF_8.decode_without_bom_handling_and_without_replacement(bytes)?;
                Some((text, DetectedEncoding::plain(*self)))
            }
            TextEncoding::Utf16 => {
                let (layout, body) = Utf16Layout::sniff(bytes);
                let encoding = if layout.big_endian { UTF_16BE } else { UTF_16LE };
                let text = encoding.decode_without_bom_handling_and_without_replacement(body)?;
                Some((
                    text,
                    DetectedEncoding {
                        candidate: *self,
                        utf16: Some(layout),
                    },
                ))
            }
            TextEncoding::Windows1252 => {
                if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                    return None;
                }
                let text = WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)?;
                Some((text, DetectedEncoding::plain(*self)))
            }
            TextEncoding::Latin1 => Some((
                encoding_rs::mem::decode_latin1(bytes),
                DetectedEncoding::plain(*self),
            )),
            TextEncoding::Other(encoding) => {
                let text = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
                Some((text, DetectedEncoding::plain(*self)))
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "utf-8" | "utf8" => return Ok(TextEncoding::Utf8),
            "utf-16" | "utf16" => return Ok(TextEncoding::Utf16),
            "cp1252" | "windows-1252" => return Ok(TextEncoding::Windows1252),
            "iso-8859-1" | "latin-1" | "latin1" => return Ok(TextEncoding::Latin1),
            _ => {}
        }

        // WHATWG labels. UTF-16 variants fold into the sniffing decoder because
        // encoding_rs cannot encode UTF-16, and encodings whose output encoding
        // differs from themselves (e.g. "replacement") cannot round-trip.
        let encoding = Encoding::for_label(normalized.as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(label.trim().to_string()))?;
        if encoding == UTF_16LE || encoding == UTF_16BE {
            Ok(TextEncoding::Utf16)
        } else if encoding == UTF_8 {
            Ok(TextEncoding::Utf8)
        } else if encoding.output_encoding() != encoding {
            Err(Error::UnknownEncoding(label.trim().to_string()))
        } else {
            Ok(TextEncoding::Other(encoding))
        }
    }
}

/// Byte order and byte-order-mark presence of a UTF-16 file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf16Layout {
    pub big_endian: bool,
    pub bom: bool,
}

impl Utf16Layout {
    fn sniff(bytes: &[u8]) -> (Self, &[u8]) {
        if let Some(body) = bytes.strip_prefix(&[0xFF, 0xFE]) {
            (Self { big_endian: false, bom: true }, body)
        } else if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
            (Self { big_endian: true, bom: true }, body)
        } else {
            (Self { big_endian: false, bom: false }, bytes)
        }
    }
}

/// The encoding a file was actually decoded with, including whatever is needed
/// to reproduce its bytes when writing back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedEncoding {
    pub candidate: TextEncoding,
    pub utf16: Option<Utf16Layout>,
}

impl DetectedEncoding {
    fn plain(candidate: TextEncoding) -> Self {
        Self {
            candidate,
            utf16: None,
        }
    }

    /// Encodes `text` back into bytes. Characters the encoding cannot represent
    /// are an error rather than being replaced.
    pub fn encode(&self, text: &str) -> std::result::Result<Vec<u8>, WriteFailure> {
        let unencodable = || WriteFailure::Unencodable {
            encoding: self.candidate.label().to_string(),
        };

        match self.candidate {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Utf16 => {
                let layout = self.utf16.unwrap_or(Utf16Layout {
                    big_endian: false,
                    bom: true,
                });
                let mut out = Vec::with_capacity(text.len() * 2 + 2);
                if layout.bom {
                    let bom: [u8; 2] = if layout.big_endian { [0xFE, 0xFF] } else { [0xFF, 0xFE] };
                    out.extend_from_slice(&bom);
                }
                for unit in text.encode_utf16() {
                    let bytes = if layout.big_endian {
                        unit.to_be_bytes()
                    } else {
                        unit.to_le_bytes()
                    };
                    out.extend_from_slice(&bytes);
                }
                Ok(out)
            }
            TextEncoding::Latin1 => {
                if !encoding_rs::mem::is_str_latin1(text) {
                    return Err(unencodable());
                }
                Ok(encoding_rs::mem::encode_latin1_lossy(text).into_owned())
            }
            TextEncoding::Windows1252 => encode_with(WINDOWS_1252, text).ok_or_else(unencodable),
            TextEncoding::Other(encoding) => encode_with(encoding, text).ok_or_else(unencodable),
        }
    }
}

impl fmt::Display for DetectedEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.candidate.label())
    }
}

fn encode_with(encoding: &'static Encoding, text: &str) -> Option<Vec<u8>> {
    let (bytes, _, had_unmappable) = encoding.encode(text);
    if had_unmappable {
        None
    } else {
        Some(bytes.into_owned())
    }
}

/// A file's text together with the encoding it decoded under.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub text: String,
    pub encoding: DetectedEncoding,
}

/// Reads files by trying an ordered list of candidate encodings.
#[derive(Debug, Clone)]
pub struct EncodingProber {
    candidates: Vec<TextEncoding>,
}

impl Default for EncodingProber {
    fn default() -> Self {
        Self {
            candidates: vec![
                TextEncoding::Utf8,
                TextEncoding::Utf16,
                TextEncoding::Windows1252,
                TextEncoding::Latin1,
            ],
        }
    }
}

impl EncodingProber {
    /// Creates a prober from an explicit, ordered candidate list.
    pub fn new(candidates: Vec<TextEncoding>) -> Result<Self> {
        if candidates.is_empty() {
            return Err("the encoding list must not be empty".into());
        }
        Ok(Self { candidates })
    }

    /// Parses each label and builds a prober from them, in order.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let candidates = labels
            .iter()
            .map(|label| label.as_ref().parse())
            .collect::<Result<Vec<TextEncoding>>>()?;
        Self::new(candidates)
    }

    pub fn candidates(&self) -> &[TextEncoding] {
        &self.candidates
    }

    /// Decodes `bytes` with the first candidate that accepts all of them.
    pub fn decode(&self, bytes: &[u8]) -> Option<DecodedFile> {
        self.candidates.iter().find_map(|candidate| {
            candidate.decode(bytes).map(|(text, encoding)| DecodedFile {
                text: text.into_owned(),
                encoding,
            })
        })
    }

    /// Reads and decodes a file.
    ///
    /// I/O failures return immediately since no other encoding can fix them.
    pub fn read(&self, path: &Path) -> Result<DecodedFile> {
        let bytes = fs::read(path).map_err(|err| Error::Unreadable {
            path: path.to_path_buf(),
            reason: err.into(),
        })?;

        self.decode(&bytes).ok_or_else(|| Error::Unreadable {
            path: path.to_path_buf(),
            reason: ReadFailure::Undecodable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn roundtrip(prober: &EncodingProber, bytes: &[u8]) -> (DecodedFile, Vec<u8>) {
        let decoded = prober.decode(bytes).unwrap();
        let encoded = decoded.encoding.encode(&decoded.text).unwrap();
        (decoded, encoded)
    }

    #[test]
    fn test_utf8_preferred_for_ascii() {
        let decoded = EncodingProber::default().decode(b"plain text").unwrap();
        assert_eq!(decoded.encoding.candidate, TextEncoding::Utf8);
        assert_eq!(decoded.text, "plain text");
    }

    #[test]
    fn test_utf8_bom_is_kept() {
        let bytes = b"\xEF\xBB\xBFhello";
        let (decoded, encoded) = roundtrip(&EncodingProber::default(), bytes);
        assert_eq!(decoded.text, "\u{FEFF}hello");
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_utf16_with_bom_roundtrips() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Grüße".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let (decoded, encoded) = roundtrip(&EncodingProber::default(), &bytes);
        assert_eq!(decoded.encoding.candidate, TextEncoding::Utf16);
        assert_eq!(
            decoded.encoding.utf16,
            Some(Utf16Layout {
                big_endian: true,
                bom: true
            })
        );
        assert_eq!(decoded.text, "Grüße");
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_utf16_le_without_bom_roundtrips() {
        let bytes: Vec<u8> = "naïve".encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect();
        let (decoded, encoded) = roundtrip(&EncodingProber::default(), &bytes);
        assert_eq!(decoded.encoding.candidate, TextEncoding::Utf16);
        assert_eq!(
            decoded.encoding.utf16,
            Some(Utf16Layout {
                big_endian: false,
                bom: false
            })
        );
        assert_eq!(decoded.text, "naïve");
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_cp1252_roundtrips() {
        // Odd length rules out UTF-16, 0x80 rules out UTF-8.
        let bytes = b"price \x80 5";
        let (decoded, encoded) = roundtrip(&EncodingProber::default(), bytes);
        assert_eq!(decoded.encoding.candidate, TextEncoding::Windows1252);
        assert_eq!(decoded.text, "price € 5");
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_latin1_catches_cp1252_holes() {
        let bytes = b"a\x81b";
        let (decoded, encoded) = roundtrip(&EncodingProber::default(), bytes);
        assert_eq!(decoded.encoding.candidate, TextEncoding::Latin1);
        assert_eq!(decoded.text, "a\u{81}b");
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_undecodable_without_latin1() {
        let prober = EncodingProber::from_labels(&["utf-8", "utf-16", "cp1252"]).unwrap();
        assert!(prober.decode(&[0x81]).is_none());
    }

    #[test]
    fn test_latin1_rejects_wide_characters() {
        let encoding = DetectedEncoding::plain(TextEncoding::Latin1);
        assert_eq!(encoding.encode("caf\u{e9}").unwrap(), b"caf\xe9");
        assert!(matches!(
            encoding.encode("€"),
            Err(WriteFailure::Unencodable { .. })
        ));
    }

    #[test]
    fn test_labels_parse() {
        assert_eq!("UTF8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!(" windows-1252 ".parse::<TextEncoding>().unwrap(), TextEncoding::Windows1252);
        assert_eq!("latin1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("utf-16be".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16);
        assert_eq!(
            "shift_jis".parse::<TextEncoding>().unwrap(),
            TextEncoding::Other(encoding_rs::SHIFT_JIS)
        );
        assert!(matches!(
            "klingon".parse::<TextEncoding>(),
            Err(Error::UnknownEncoding(label)) if label == "klingon"
        ));
    }

    #[test]
    fn test_empty_candidate_list_rejected() {
        let labels: [&str; 0] = [];
        assert!(EncodingProber::from_labels(&labels).is_err());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let err = EncodingProber::default()
            .read(&temp_dir.path().join("nope.txt"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Unreadable {
                reason: ReadFailure::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_read_reports_encoding() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, "héllo").unwrap();

        let decoded = EncodingProber::default().read(&path).unwrap();
        assert_eq!(decoded.text, "héllo");
        assert_eq!(decoded.encoding.to_string(), "utf-8");
    }
}
