use std::io::prelude::*;
use std::io::SeekFrom;

use tracing::debug;

use crate::id3v2::codec::FrameCodec;
use crate::id3v2::collection::TagCollection;
use crate::id3v2::read;
use crate::id3v2::structure::{ExtendedHeader, HEADER_SIZE};
use crate::id3v2::sync;
use crate::id3v2::WriteSettings;
use crate::tools::{encode_int_be_u16, encode_int_be_u32, tag_error};
use crate::Error;

fn extended_header_bytes(ext: &ExtendedHeader, version: u8) -> Result<Vec<u8>, Error> {
    let mut vec = Vec::new();
    match version {
        3 => {
            let size: u32 = if ext.crc32.is_some() { 10 } else { 6 };
            vec.extend_from_slice(&encode_int_be_u32(size));
            vec.extend_from_slice(&encode_int_be_u16(if ext.crc32.is_some() {
                0x8000
            } else {
                0x0000
            }));
            vec.extend_from_slice(&encode_int_be_u32(ext.padding_size));
            if let Some(crc) = ext.crc32 {
                vec.extend_from_slice(&encode_int_be_u32(crc));
            }
        }
        4 => {
            let mut flags = 0x00;
            let mut data = Vec::new();
            if ext.tag_is_update {
                flags |= 0x40;
                data.push(0x00);
            }
            if let Some(crc) = ext.crc32 {
                flags |= 0x20;
                data.push(0x05);
                data.extend_from_slice(&sync::encode_synch_int_wide(crc));
            }
            if let Some(r) = ext.restrictions {
                flags |= 0x10;
                data.push(0x01);
                data.push(r);
            }
            let size = sync::encode_safe_size(6 + data.len() as u32)
                .map_err(|e| tag_error(&e.to_string()))?;
            vec.extend_from_slice(&size);
            // one flag byte
            vec.push(0x01);
            vec.push(flags);
            vec.append(&mut data);
        }
        v => return Err(Error::UnsupportedFormatVersion(v)),
    }
    Ok(vec)
}

/// The whole tag as it goes on disk. Updates the header and extended
/// header of `tag` to describe what was rendered.
pub fn render(tag: &mut TagCollection, settings: &WriteSettings) -> Result<Vec<u8>, Error> {
    if !tag.is_valid() {
        return Err(tag_error("Cannot write a tag without frames"));
    }
    if let Some(padding) = settings.padding {
        tag.header.padding_size = padding;
    }

    let version = tag.header.version;
    let codec = FrameCodec::new(version).with_compression_level(settings.compression_level);
    let mut body = tag.render_with(&codec)?;

    let mut ext = match tag.extended_header.clone() {
        Some(ext) => Some(ext),
        None if settings.write_crc => Some(ExtendedHeader::default()),
        None => None,
    };
    if let Some(ext) = ext.as_mut() {
        ext.crc32 = if settings.write_crc {
            Some(tag.checksum_with(&codec)?)
        } else {
            None
        };
        ext.padding_size = tag.header.padding_size;
    }
    let mut ext_bytes = match &ext {
        Some(e) => extended_header_bytes(e, version)?,
        None => Vec::new(),
    };
    if let Some(ext) = ext.as_mut() {
        ext.size = ext_bytes.len() as u32;
    }

    let tag_size = (ext_bytes.len() + body.len()) as u32;
    let size = sync::encode_safe_size(tag_size).map_err(|e| tag_error(&e.to_string()))?;

    let mut vec: Vec<u8> = Vec::with_capacity(HEADER_SIZE + tag_size as usize);
    vec.extend_from_slice(b"ID3");
    vec.push(version);
    vec.push(0x00);
    // no unsynchronisation, experimental or footer flags
    vec.push(if ext.is_some() { 0b0100_0000 } else { 0x00 });
    vec.extend_from_slice(&size);
    vec.append(&mut ext_bytes);
    vec.append(&mut body);

    tag.header.revision = 0;
    tag.header.tag_size = tag_size;
    tag.header.is_unsynchronized = false;
    tag.header.has_extended_header = ext.is_some();
    tag.header.is_experimental = false;
    tag.header.has_footer = false;
    tag.extended_header = ext;

    debug!(
        version,
        frames = tag.len(),
        size = tag_size,
        padding = tag.header.padding_size,
        "rendered tag"
    );

    Ok(vec)
}

pub fn tag<W: Write>(
    tag: &mut TagCollection,
    output: &mut W,
    settings: &WriteSettings,
) -> Result<(), Error> {
    let vec = render(tag, settings)?;
    output.write_all(&vec)?;
    output.flush()?;
    Ok(())
}

/// Copy `input` to `output`, putting `tag` in place of any tag `input`
/// starts with.
pub fn replace<R: Read + Seek, W: Write>(
    input: &mut R,
    output: &mut W,
    tag: &mut TagCollection,
    settings: &WriteSettings,
) -> Result<(), Error> {
    let old_size = match read::header(input) {
        // id3v2 tag found
        Ok(h) => {
            let footer = if h.has_footer { HEADER_SIZE as u64 } else { 0 };
            HEADER_SIZE as u64 + u64::from(h.tag_size) + footer
        }
        // id3v2 not found, and it's not an I/O error
        Err(Error::Tag(_)) => 0,
        Err(e) => return Err(e),
    };

    let vec = render(tag, settings)?;

    // move to the start of music data in the input
    input.seek(SeekFrom::Start(old_size))?;

    output.write_all(&vec)?;
    std::io::copy(input, output)?;
    output.flush()?;
    Ok(())
}
