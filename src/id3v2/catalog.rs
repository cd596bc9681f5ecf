//! Frame bodies, keyed by frame id.
//!
//! The codec only ever sees the raw payload of a frame; turning that into
//! something meaningful is the job of the body that `build` picks for the id.

use std::collections::HashMap;

use regex::Regex;

use crate::id3v2::structure::Frame;
use crate::tools::encoding::*;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Latin1,
    Utf16,
    Utf16Be,
    Utf8,
}

impl Default for TextEncoding {
    fn default() -> TextEncoding {
        TextEncoding::Latin1
    }
}

impl TextEncoding {
    fn from_byte(b: u8) -> Result<TextEncoding, String> {
        match b {
            0x00 => Ok(TextEncoding::Latin1),
            0x01 => Ok(TextEncoding::Utf16),
            0x02 => Ok(TextEncoding::Utf16Be),
            0x03 => Ok(TextEncoding::Utf8),
            _ => Err(format!("unknown text encoding {:#04x}", b)),
        }
    }

    fn byte(self) -> u8 {
        match self {
            TextEncoding::Latin1 => 0x00,
            TextEncoding::Utf16 => 0x01,
            TextEncoding::Utf16Be => 0x02,
            TextEncoding::Utf8 => 0x03,
        }
    }

    fn terminator(self) -> &'static [u8] {
        match self {
            TextEncoding::Utf16 | TextEncoding::Utf16Be => b"\x00\x00",
            TextEncoding::Latin1 | TextEncoding::Utf8 => b"\x00",
        }
    }

    fn encode(self, input: &str) -> Vec<u8> {
        match self {
            TextEncoding::Latin1 => encode_iso_8859_1(input),
            TextEncoding::Utf16 => encode_utf16(input),
            TextEncoding::Utf16Be => encode_utf16be(input),
            TextEncoding::Utf8 => encode_utf8(input),
        }
    }

    fn decode(self, input: &[u8]) -> String {
        match self {
            TextEncoding::Latin1 => decode_iso_8859_1(input),
            TextEncoding::Utf16 => decode_utf16(input),
            TextEncoding::Utf16Be => decode_utf16be(input),
            TextEncoding::Utf8 => decode_utf8(input),
        }
    }

    // UTF-16 terminators sit on even offsets
    fn find_terminator(self, input: &[u8]) -> Option<usize> {
        match self.terminator().len() {
            1 => input.iter().position(|&b| b == 0x00),
            _ => (0..input.len().saturating_sub(1))
                .step_by(2)
                .find(|&i| input[i] == 0x00 && input[i + 1] == 0x00),
        }
    }

    // split at the first terminator
    fn split_terminated(self, input: &[u8]) -> (&[u8], &[u8]) {
        match self.find_terminator(input) {
            Some(i) => (&input[..i], &input[i + self.terminator().len()..]),
            None => (input, &input[input.len()..]),
        }
    }

    // every terminator ends a value, so `a\0` holds "a" and ""
    fn split_values(self, mut input: &[u8]) -> Vec<&[u8]> {
        let mut values = Vec::new();
        while let Some(i) = self.find_terminator(input) {
            values.push(&input[..i]);
            input = &input[i + self.terminator().len()..];
        }
        values.push(input);
        values
    }
}

/// `T???` frames: one or more strings.
///
/// An empty `values` is written the same way as a single empty string, and
/// read back as one.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub encoding: TextEncoding,
    pub values: Vec<String>,
}

impl Default for Text {
    fn default() -> Text {
        Text::new(TextEncoding::default(), "")
    }
}

impl Text {
    pub fn new(encoding: TextEncoding, value: &str) -> Text {
        Text {
            encoding,
            values: vec![value.to_string()],
        }
    }
}

/// `TXXX`: a described string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserText {
    pub encoding: TextEncoding,
    pub description: String,
    pub value: String,
}

/// `COMM` and `USLT`: language, short description and the full text.
#[derive(Debug, Clone, PartialEq)]
pub struct FullText {
    pub encoding: TextEncoding,
    pub language: [u8; 3],
    pub description: String,
    pub text: String,
}

impl Default for FullText {
    fn default() -> FullText {
        FullText {
            encoding: TextEncoding::default(),
            // iTunes needs this set to eng
            language: *b"eng",
            description: String::new(),
            text: String::new(),
        }
    }
}

/// `APIC`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Picture {
    pub encoding: TextEncoding,
    pub mime: String,
    pub picture_type: u8,
    pub description: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(Text),
    UserText(UserText),
    FullText(FullText),
    Picture(Picture),
    Url(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    UserText,
    FullText,
    Picture,
    Url,
    Binary,
}

lazy_static! {
    static ref KINDS: HashMap<&'static str, Kind> = {
        let mut m = HashMap::new();
        m.insert("TXXX", Kind::UserText);
        m.insert("COMM", Kind::FullText);
        m.insert("USLT", Kind::FullText);
        m.insert("APIC", Kind::Picture);
        // kept as they are
        m.insert("WXXX", Kind::Binary);
        m.insert("PRIV", Kind::Binary);
        m.insert("MCDI", Kind::Binary);
        m.insert("UFID", Kind::Binary);
        m.insert("GEOB", Kind::Binary);
        m
    };
    static ref TEXT_ID: Regex = Regex::new(r"^T[A-Z0-9]{3}$").unwrap();
    static ref URL_ID: Regex = Regex::new(r"^W[A-Z0-9]{3}$").unwrap();
}

fn kind_of(type_code: &str) -> Option<Kind> {
    if let Some(kind) = KINDS.get(type_code) {
        return Some(*kind);
    }
    if TEXT_ID.is_match(type_code) {
        Some(Kind::Text)
    } else if URL_ID.is_match(type_code) {
        Some(Kind::Url)
    } else {
        None
    }
}

/// An empty frame of the right kind for `type_code`.
pub fn build(type_code: &str) -> Result<Frame, Error> {
    let body = match kind_of(type_code) {
        Some(Kind::Text) => Body::Text(Text::default()),
        Some(Kind::UserText) => Body::UserText(UserText::default()),
        Some(Kind::FullText) => Body::FullText(FullText::default()),
        Some(Kind::Picture) => Body::Picture(Picture::default()),
        Some(Kind::Url) => Body::Url(String::new()),
        Some(Kind::Binary) => Body::Binary(Vec::new()),
        None => return Err(Error::UnknownFrameType(type_code.to_string())),
    };
    Ok(Frame::new(type_code, body))
}

fn split_encoding(input: &[u8]) -> Result<(TextEncoding, &[u8]), String> {
    match input.split_first() {
        Some((b, rest)) => Ok((TextEncoding::from_byte(*b)?, rest)),
        None => Err("missing text encoding".to_string()),
    }
}

impl Body {
    /// Replace the contents with what `input` holds.
    pub fn parse(&mut self, input: &[u8]) -> Result<(), String> {
        match self {
            Body::Text(t) => {
                let (encoding, rest) = split_encoding(input)?;
                t.encoding = encoding;
                // every value may bring its own BOM
                t.values = encoding
                    .split_values(rest)
                    .into_iter()
                    .map(|v| {
                        encoding
                            .decode(v)
                            .trim_start_matches('\u{feff}')
                            .to_string()
                    })
                    .collect();
            }
            Body::UserText(t) => {
                let (encoding, rest) = split_encoding(input)?;
                let (description, value) = encoding.split_terminated(rest);
                t.encoding = encoding;
                t.description = encoding.decode(description);
                t.value = encoding.decode(value);
            }
            Body::FullText(t) => {
                let (encoding, rest) = split_encoding(input)?;
                if rest.len() < 3 {
                    return Err("too short for a language code".to_string());
                }
                let (description, text) = encoding.split_terminated(&rest[3..]);
                t.encoding = encoding;
                t.language.copy_from_slice(&rest[..3]);
                t.description = encoding.decode(description);
                t.text = encoding.decode(text);
            }
            Body::Picture(p) => {
                let (encoding, rest) = split_encoding(input)?;
                // the MIME type is always ISO-8859-1
                let (mime, rest) = TextEncoding::Latin1.split_terminated(rest);
                let (picture_type, rest) = match rest.split_first() {
                    Some((t, rest)) => (*t, rest),
                    None => return Err("missing picture type".to_string()),
                };
                let (description, data) = encoding.split_terminated(rest);
                p.encoding = encoding;
                p.mime = decode_iso_8859_1(mime);
                p.picture_type = picture_type;
                p.description = encoding.decode(description);
                p.data = data.to_vec();
            }
            Body::Url(u) => *u = decode_iso_8859_1(input),
            Body::Binary(b) => *b = input.to_vec(),
        }
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut vec = Vec::new();
        match self {
            Body::Text(t) => {
                vec.push(t.encoding.byte());
                for (i, value) in t.values.iter().enumerate() {
                    if i > 0 {
                        vec.extend_from_slice(t.encoding.terminator());
                    }
                    vec.append(&mut t.encoding.encode(value));
                }
            }
            Body::UserText(t) => {
                vec.push(t.encoding.byte());
                vec.append(&mut t.encoding.encode(&t.description));
                vec.extend_from_slice(t.encoding.terminator());
                vec.append(&mut t.encoding.encode(&t.value));
            }
            Body::FullText(t) => {
                vec.push(t.encoding.byte());
                vec.extend_from_slice(&t.language);
                vec.append(&mut t.encoding.encode(&t.description));
                vec.extend_from_slice(t.encoding.terminator());
                vec.append(&mut t.encoding.encode(&t.text));
            }
            Body::Picture(p) => {
                vec.push(p.encoding.byte());
                vec.append(&mut encode_iso_8859_1(&p.mime));
                vec.push(0x00);
                vec.push(p.picture_type);
                vec.append(&mut p.encoding.encode(&p.description));
                vec.extend_from_slice(p.encoding.terminator());
                vec.extend_from_slice(&p.data);
            }
            Body::Url(u) => vec.append(&mut encode_iso_8859_1(u)),
            Body::Binary(b) => vec.extend_from_slice(b),
        }
        vec
    }
}

impl Frame {
    /// Fill the body from a reconstructed payload.
    pub fn parse(&mut self, payload: &[u8]) -> Result<(), Error> {
        let type_code = &self.type_code;
        self.body
            .parse(payload)
            .map_err(|reason| Error::malformed(type_code, reason))
    }

    /// The payload before any flag-driven transform.
    pub fn serialize(&self) -> Vec<u8> {
        self.body.serialize()
    }
}
