//! ID3v2.3 and ID3v2.4 tags.

use std::io::prelude::*;

use crate::Error;

pub mod catalog;
pub mod codec;
pub mod collection;
pub mod options;
pub mod read;
pub mod structure;
pub mod sync;
pub mod write;

mod accessors;
mod tools;

use self::collection::TagCollection;

/// How forgiving `read::tag` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSettings {
    /// Drop frames that fail to decode instead of failing the whole tag.
    pub skip_invalid_frames: bool,
    /// Check the CRC of the extended header, if there is one.
    pub verify_crc: bool,
}

impl Default for ReadSettings {
    fn default() -> ReadSettings {
        ReadSettings {
            skip_invalid_frames: false,
            verify_crc: true,
        }
    }
}

impl ReadSettings {
    pub fn lenient() -> ReadSettings {
        ReadSettings {
            skip_invalid_frames: true,
            ..Default::default()
        }
    }

    pub fn with_verify_crc(mut self, verify_crc: bool) -> ReadSettings {
        self.verify_crc = verify_crc;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSettings {
    /// Padding to reserve after the frames; `None` keeps what the header says.
    pub padding: Option<u32>,
    /// Store a CRC-32 of the frames in the extended header.
    pub write_crc: bool,
    /// zlib level for compressed frames.
    pub compression_level: u32,
}

impl Default for WriteSettings {
    fn default() -> WriteSettings {
        WriteSettings {
            padding: None,
            write_crc: false,
            compression_level: 9,
        }
    }
}

impl WriteSettings {
    pub fn with_padding(mut self, padding: u32) -> WriteSettings {
        self.padding = Some(padding);
        self
    }

    pub fn with_crc(mut self, write_crc: bool) -> WriteSettings {
        self.write_crc = write_crc;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> WriteSettings {
        self.compression_level = level;
        self
    }
}

pub fn get<T: Read + Seek>(input: &mut T) -> Result<TagCollection, Error> {
    read::tag(input, &ReadSettings::default())
}

pub fn set<R: Read + Seek, W: Write>(
    input: &mut R,
    output: &mut W,
    tag: &mut TagCollection,
) -> Result<(), Error> {
    write::replace(input, output, tag, &WriteSettings::default())
}

#[cfg(test)]
mod tests;
