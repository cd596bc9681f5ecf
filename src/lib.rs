#[macro_use]
extern crate lazy_static;

pub mod id3v2;

mod tools;

pub use crate::id3v2::catalog::{Body, FullText, Picture, Text, TextEncoding, UserText};
pub use crate::id3v2::codec::FrameCodec;
pub use crate::id3v2::collection::TagCollection;
pub use crate::id3v2::structure::{ExtendedHeader, Frame, FrameOptions, Header};
pub use crate::id3v2::{ReadSettings, WriteSettings};

use std::io;

use thiserror::Error;

/// Everything that can go wrong while decoding or encoding a tag.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ID3v2.{0} is not supported")]
    UnsupportedFormatVersion(u8),

    #[error("{0} is not implemented")]
    UnimplementedFeature(&'static str),

    #[error("malformed frame {frame}: {reason}")]
    MalformedFrame { frame: String, reason: String },

    #[error("no handler for frame type {0:?}")]
    UnknownFrameType(String),

    #[error("invalid frame id {0:?}")]
    InvalidFrameId(String),

    #[error("index {index} is out of range for a tag with {len} frames")]
    IndexOutOfRange { index: usize, len: usize },

    /// The option has no bit in the requested version's frame flags.
    #[error("ID3v2.{version} frames cannot carry the {option} option")]
    UnrepresentableOption { version: u8, option: &'static str },

    #[error("checksum mismatch: tag says {expected:08x}, frames give {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("error reading tag: {0}")]
    Tag(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn malformed(frame: &str, reason: impl ToString) -> Error {
        Error::MalformedFrame {
            frame: frame.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
