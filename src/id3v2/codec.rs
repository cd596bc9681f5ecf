//! Turning the bytes of a frame record into a frame and back.
//!
//! On disk, the data of a frame is laid out as
//!
//! ```text
//! [group id: 1]? [size: 4]? data
//! ```
//!
//! where `data` is the payload, deflated if the frame is compressed and then
//! unsynchronised if the frame asks for it. The size field holds the length
//! of the payload once every transform is undone; it is a plain big endian
//! integer in v2.3 and a synchsafe one in v2.4.

use std::borrow::Cow;
use std::io::prelude::*;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

use crate::id3v2::catalog;
use crate::id3v2::options;
use crate::id3v2::structure::Frame;
use crate::id3v2::sync;
use crate::id3v2::tools::encode_frame_id;
use crate::tools::{decode_int_be_u32, encode_int_be_u16, encode_int_be_u32};
use crate::Error;

/// Frame codec for one tag version.
///
/// Holds no per-frame state, so one value can serve any number of frames,
/// from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    version: u8,
    level: Compression,
    unsynchronised_tag: bool,
}

impl FrameCodec {
    pub fn new(version: u8) -> FrameCodec {
        FrameCodec {
            version,
            level: Compression::best(),
            unsynchronised_tag: false,
        }
    }

    /// In v2.4, a set unsynchronisation bit in the tag header means every
    /// frame is unsynchronised, whatever its own flags say.
    pub fn with_unsynchronised_tag(mut self, unsynchronised: bool) -> FrameCodec {
        self.unsynchronised_tag = unsynchronised;
        self
    }

    /// zlib level for compressed frames, 0 to 9.
    pub fn with_compression_level(mut self, level: u32) -> FrameCodec {
        self.level = Compression::new(level.min(9));
        self
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Rebuild a frame from its id, flag word and the bytes that follow the
    /// frame header.
    pub fn decode(&self, type_code: &str, flags: u16, raw: &[u8]) -> Result<Frame, Error> {
        let mut options = options::interpret(self.version, flags)?;
        if self.unsynchronised_tag && self.version == 4 {
            options.desynchronization = true;
        }
        if options.encryption {
            return Err(Error::UnimplementedFeature("frame encryption"));
        }

        let mut frame = catalog::build(type_code)?;
        frame.options = options;

        let mut rest = raw;
        if options.grouping {
            // the group id is not kept
            rest = rest
                .get(1..)
                .ok_or_else(|| Error::malformed(type_code, "missing group identifier"))?;
        }

        let declared = if options.has_size_field(self.version) {
            if rest.len() < 4 {
                return Err(Error::malformed(type_code, "missing data length"));
            }
            let (field, tail) = rest.split_at(4);
            rest = tail;
            Some(self.decode_size_field(type_code, field)? as usize)
        } else {
            None
        };

        let data: Cow<[u8]> = if options.desynchronization {
            let unescaped =
                sync::unescape(rest, rest.len()).map_err(|e| Error::malformed(type_code, e))?;
            Cow::Owned(unescaped.bytes)
        } else {
            Cow::Borrowed(rest)
        };

        let payload = match declared {
            Some(size) if options.compression => inflate(type_code, &data, size)?,
            Some(size) => {
                if data.len() != size {
                    return Err(Error::malformed(
                        type_code,
                        format!("data length says {} bytes, found {}", size, data.len()),
                    ));
                }
                data.into_owned()
            }
            None => data.into_owned(),
        };

        debug!(
            frame = type_code,
            version = self.version,
            raw = raw.len(),
            payload = payload.len(),
            compressed = options.compression,
            unsynchronised = options.desynchronization,
            "decoded frame"
        );

        frame.parse(&payload)?;
        Ok(frame)
    }

    /// Serialize a frame into the bytes that follow its frame header.
    ///
    /// The group id is always written as zero.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Error> {
        let type_code = frame.type_code.as_str();
        let options = frame.options;
        // fails for versions and options this codec cannot write
        options.to_bits(self.version)?;
        if options.encryption {
            return Err(Error::UnimplementedFeature("frame encryption"));
        }

        let payload = frame.serialize();
        let payload_len = payload.len();

        let mut data = if options.compression {
            self.deflate(type_code, &payload)?
        } else {
            payload
        };
        if options.desynchronization {
            data = sync::escape(&data);
        }

        let mut vec = Vec::with_capacity(data.len() + 5);
        if options.grouping {
            vec.push(0x00);
        }
        if options.has_size_field(self.version) {
            vec.extend_from_slice(&self.encode_size_field(type_code, payload_len)?);
        }
        vec.append(&mut data);

        debug!(
            frame = type_code,
            version = self.version,
            payload = payload_len,
            raw = vec.len(),
            compressed = options.compression,
            unsynchronised = options.desynchronization,
            "encoded frame"
        );

        Ok(vec)
    }

    /// Append the whole record for `frame`, frame header included.
    pub fn write_record(&self, frame: &Frame, out: &mut Vec<u8>) -> Result<(), Error> {
        let id = encode_frame_id(&frame.type_code)?;
        let flags = frame.options.to_bits(self.version)?;
        let data = self.encode(frame)?;

        // 4: Frame ID      $xx xx xx xx  (four characters)
        // 4: Size      4 * %0xxxxxxx in 2.4 / $xx in 2.3
        // 2: Flags         $xx xx
        out.extend_from_slice(&id);
        out.extend_from_slice(&self.encode_size_field(&frame.type_code, data.len())?);
        out.extend_from_slice(&encode_int_be_u16(flags));
        out.extend_from_slice(&data);
        Ok(())
    }

    fn decode_size_field(&self, type_code: &str, field: &[u8]) -> Result<u32, Error> {
        match self.version {
            3 => Ok(decode_int_be_u32(field)),
            4 => sync::decode_safe_size([field[0], field[1], field[2], field[3]])
                .map_err(|e| Error::malformed(type_code, e)),
            v => Err(Error::UnsupportedFormatVersion(v)),
        }
    }

    fn encode_size_field(&self, type_code: &str, size: usize) -> Result<[u8; 4], Error> {
        if size > u32::MAX as usize {
            return Err(Error::malformed(type_code, "frame is larger than 4 GiB"));
        }
        match self.version {
            3 => Ok(encode_int_be_u32(size as u32)),
            4 => sync::encode_safe_size(size as u32).map_err(|e| Error::malformed(type_code, e)),
            v => Err(Error::UnsupportedFormatVersion(v)),
        }
    }

    fn deflate(&self, type_code: &str, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(payload)
            .map_err(|e| Error::malformed(type_code, e))?;
        let compressed = encoder
            .finish()
            .map_err(|e| Error::malformed(type_code, e))?;

        if compressed.is_empty() && !payload.is_empty() {
            return Err(Error::malformed(type_code, "compressor produced no output"));
        }
        Ok(compressed)
    }
}

// the stream must hold exactly `size` bytes and nothing after them
fn inflate(type_code: &str, data: &[u8], size: usize) -> Result<Vec<u8>, Error> {
    let mut decoder = ZlibDecoder::new(data);
    let mut payload = Vec::with_capacity(size);
    // one extra byte is enough to tell an oversized stream apart
    (&mut decoder)
        .take(size as u64 + 1)
        .read_to_end(&mut payload)
        .map_err(|e| Error::malformed(type_code, format!("cannot decompress: {}", e)))?;

    if payload.len() != size {
        return Err(Error::malformed(
            type_code,
            format!("decompressed to {} bytes, expected {}", payload.len(), size),
        ));
    }
    if decoder.total_in() != data.len() as u64 {
        return Err(Error::malformed(
            type_code,
            format!(
                "{} trailing bytes after the compressed data",
                data.len() as u64 - decoder.total_in()
            ),
        ));
    }
    Ok(payload)
}
