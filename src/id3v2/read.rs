use std::io::prelude::*;
use std::io::{ErrorKind, SeekFrom};

use crc::crc32;
use tracing::{debug, warn};

use crate::id3v2::codec::FrameCodec;
use crate::id3v2::collection::TagCollection;
use crate::id3v2::structure::{ExtendedHeader, Header, FRAME_HEADER_SIZE, HEADER_SIZE};
use crate::id3v2::sync;
use crate::id3v2::tools::decode_frame_id;
use crate::id3v2::ReadSettings;
use crate::tools::{decode_int_be_u16, decode_int_be_u32, tag_error};
use crate::Error;

/// The 10 bytes in front of every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHeader {
    pub name: String,
    pub size: u32,
    pub flags: u16,
}

pub fn frame_header(input: &[u8], version: u8) -> Result<FrameHeader, Error> {
    if input.len() < FRAME_HEADER_SIZE {
        return Err(tag_error("Truncated frame header"));
    }

    // 4: Frame ID      $xx xx xx xx  (four characters)
    // 4: Size      4 * %0xxxxxxx in 2.4 / $xx in 2.3
    // 2: Flags         $xx xx
    let name = decode_frame_id(&input[0..4])?;
    let size = match version {
        3 => decode_int_be_u32(&input[4..8]),
        4 => sync::decode_safe_size([input[4], input[5], input[6], input[7]])
            .map_err(|e| Error::malformed(&name, e))?,
        _ => return Err(Error::UnsupportedFormatVersion(version)),
    };

    Ok(FrameHeader {
        name,
        size,
        flags: decode_int_be_u16(&input[8..10]),
    })
}

pub fn parse_header(arr: &[u8; HEADER_SIZE]) -> Result<Header, Error> {
    // ID3v2/file identifier      "ID3"
    if &arr[0..3] != b"ID3" {
        return Err(tag_error("ID3v2 header not found"));
    }

    // ID3v2 version              $0X 00
    let version = arr[3];
    if version == 0xFF || arr[4] == 0xFF {
        return Err(tag_error("Invalid ID3v2 version"));
    }
    if version != 3 && version != 4 {
        return Err(Error::UnsupportedFormatVersion(version));
    }

    // ID3v2 flags                %abcd0000 (no d in v2.3)
    let flags = arr[5];
    let known = if version == 3 { 0xE0 } else { 0xF0 };
    if flags & !known != 0 {
        return Err(tag_error("Unsupported flags found in ID3 header"));
    }

    let tag_size = sync::decode_safe_size([arr[6], arr[7], arr[8], arr[9]])
        .map_err(|e| tag_error(&format!("Invalid tag size: {}", e)))?;

    Ok(Header {
        version,
        revision: arr[4],
        tag_size,
        padding_size: 0,
        is_unsynchronized: flags & 0b1000_0000 != 0,
        has_extended_header: flags & 0b0100_0000 != 0,
        is_experimental: flags & 0b0010_0000 != 0,
        has_footer: flags & 0b0001_0000 != 0,
    })
}

pub fn header<T: Read + Seek>(input: &mut T) -> Result<Header, Error> {
    input.seek(SeekFrom::Start(0))?;

    let mut arr = [0; HEADER_SIZE];
    match input.read_exact(&mut arr) {
        Ok(()) => parse_header(&arr),
        Err(ref e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(tag_error("ID3v2 header not found"))
        }
        Err(e) => Err(e.into()),
    }
}

fn truncated_extended_header() -> Error {
    tag_error("Truncated extended header")
}

// every v2.4 extended header flag brings its data, prefixed by the data's length
fn flag_data<'a>(data: &'a [u8], pos: &mut usize, expected: usize) -> Result<&'a [u8], Error> {
    let start = *pos + 1;
    if data.get(*pos) != Some(&(expected as u8)) || data.len() < start + expected {
        return Err(tag_error("Invalid extended header flag data"));
    }
    *pos = start + expected;
    Ok(&data[start..*pos])
}

// the size of the result counts every byte the extended header takes up
pub fn extended_header(input: &[u8], version: u8) -> Result<ExtendedHeader, Error> {
    if input.len() < 6 {
        return Err(truncated_extended_header());
    }
    match version {
        3 => {
            // size excludes the size field itself: 6, or 10 with a CRC
            let size = decode_int_be_u32(&input[0..4]);
            if size != 6 && size != 10 {
                return Err(tag_error("Invalid extended header size"));
            }
            if input.len() < 4 + size as usize {
                return Err(truncated_extended_header());
            }
            let flags = decode_int_be_u16(&input[4..6]);
            let padding_size = decode_int_be_u32(&input[6..10]);
            let crc32 = if flags & 0x8000 != 0 {
                if size != 10 {
                    return Err(tag_error("Extended header is missing its CRC"));
                }
                Some(decode_int_be_u32(&input[10..14]))
            } else {
                None
            };
            Ok(ExtendedHeader {
                size: 4 + size,
                padding_size,
                tag_is_update: false,
                crc32,
                restrictions: None,
            })
        }
        4 => {
            let size = sync::decode_safe_size([input[0], input[1], input[2], input[3]])
                .map_err(|e| tag_error(&format!("Invalid extended header size: {}", e)))?;
            if size < 6 || input.len() < size as usize {
                return Err(truncated_extended_header());
            }
            if input[4] != 1 {
                return Err(tag_error("Unsupported number of extended header flag bytes"));
            }
            let flags = input[5];
            let data = &input[6..size as usize];
            let mut pos = 0;

            let tag_is_update = flags & 0x40 != 0;
            if tag_is_update {
                flag_data(data, &mut pos, 0)?;
            }
            let crc32 = if flags & 0x20 != 0 {
                let d = flag_data(data, &mut pos, 5)?;
                Some(
                    sync::decode_synch_int(d)
                        .map_err(|e| tag_error(&format!("Invalid extended header CRC: {}", e)))?,
                )
            } else {
                None
            };
            let restrictions = if flags & 0x10 != 0 {
                Some(flag_data(data, &mut pos, 1)?[0])
            } else {
                None
            };

            Ok(ExtendedHeader {
                size,
                padding_size: 0,
                tag_is_update,
                crc32,
                restrictions,
            })
        }
        _ => Err(Error::UnsupportedFormatVersion(version)),
    }
}

/// Read the tag at the start of `input`.
pub fn tag<T: Read + Seek>(input: &mut T, settings: &ReadSettings) -> Result<TagCollection, Error> {
    let header = header(input)?;

    let mut body = vec![0; header.tag_size as usize];
    input.read_exact(&mut body)?;

    parse_body(header, body, settings)
}

/// Read a tag held in memory, header included.
pub fn tag_from_bytes(input: &[u8], settings: &ReadSettings) -> Result<TagCollection, Error> {
    if input.len() < HEADER_SIZE {
        return Err(tag_error("ID3v2 header not found"));
    }
    let mut arr = [0; HEADER_SIZE];
    arr.copy_from_slice(&input[..HEADER_SIZE]);
    let header = parse_header(&arr)?;

    let end = HEADER_SIZE + header.tag_size as usize;
    if input.len() < end {
        return Err(tag_error("Tag is larger than the input"));
    }
    parse_body(header, input[HEADER_SIZE..end].to_vec(), settings)
}

fn parse_body(
    header: Header,
    mut body: Vec<u8>,
    settings: &ReadSettings,
) -> Result<TagCollection, Error> {
    // with older id3 versions, run unsynch on the whole tag
    if header.is_unsynchronized && header.version < 4 {
        let len = body.len();
        body = sync::unescape(&body, len)
            .map_err(|e| tag_error(&e.to_string()))?
            .bytes;
    }

    let version = header.version;
    let codec = FrameCodec::new(version).with_unsynchronised_tag(header.is_unsynchronized);
    let mut tag = TagCollection::with_header(header);

    let mut pos = 0;
    if tag.header.has_extended_header {
        let ext = extended_header(&body, version)?;
        pos = ext.size as usize;
        tag.extended_header = Some(ext);
    }
    let frames_start = pos;

    while pos < body.len() {
        // a zero where a frame id should be means we hit padding
        if body[pos] == 0x00 {
            break;
        }

        let f = match frame_header(&body[pos..], version) {
            Ok(f) => f,
            // fail gracefully on invalid frames, nothing after them can be found
            Err(e) if settings.skip_invalid_frames => {
                warn!(offset = pos, error = %e, "giving up on unreadable frame header");
                break;
            }
            Err(e) => return Err(e),
        };

        let start = pos + FRAME_HEADER_SIZE;
        let stop = start + f.size as usize;
        if stop > body.len() {
            let e = Error::malformed(&f.name, "frame runs past the end of the tag");
            if settings.skip_invalid_frames {
                warn!(frame = %f.name, error = %e, "dropping truncated frame");
                break;
            }
            return Err(e);
        }

        match codec.decode(&f.name, f.flags, &body[start..stop]) {
            Ok(frame) => tag.push(frame)?,
            // invalidate just a single frame instead of the whole tag
            Err(e) if settings.skip_invalid_frames => {
                warn!(frame = %f.name, error = %e, "skipping frame");
            }
            Err(e) => return Err(e),
        }
        pos = stop;
    }

    tag.header.padding_size = (body.len() - pos) as u32;

    if settings.verify_crc {
        if let Some(expected) = tag.extended_header.as_ref().and_then(|e| e.crc32) {
            let actual = crc32::checksum_ieee(&body[frames_start..pos]);
            if actual != expected {
                return Err(Error::ChecksumMismatch { expected, actual });
            }
        }
    }

    debug!(
        version,
        frames = tag.len(),
        padding = tag.header.padding_size,
        "read tag"
    );

    Ok(tag)
}
