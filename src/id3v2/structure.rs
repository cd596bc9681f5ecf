use crate::id3v2::catalog::Body;

pub const HEADER_SIZE: usize = 10;
pub const FRAME_HEADER_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: u8,
    pub revision: u8,
    // everything after the 10 header bytes, extended header and padding included
    pub tag_size: u32, // in bytes, goes up to 256 mb
    pub padding_size: u32,

    pub is_unsynchronized: bool,
    pub has_extended_header: bool,
    pub is_experimental: bool,
    pub has_footer: bool,
}

impl Header {
    pub fn new(version: u8) -> Header {
        Header {
            version,
            revision: 0,
            tag_size: 0,
            padding_size: 0,
            is_unsynchronized: false,
            has_extended_header: false,
            is_experimental: false,
            has_footer: false,
        }
    }
}

impl Default for Header {
    fn default() -> Header {
        Header::new(4)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedHeader {
    // bytes occupied on disk, size field included
    pub size: u32,
    // v2.3 keeps its own copy of the padding size here
    pub padding_size: u32,
    pub tag_is_update: bool,
    pub crc32: Option<u32>,
    pub restrictions: Option<u8>,
}

/// Per-frame flags, independent of the bit layout of any one version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOptions {
    // status
    pub tag_alter_preservation: bool,
    pub file_alter_preservation: bool,
    pub read_only: bool,

    // format
    pub grouping: bool,
    pub compression: bool,
    pub encryption: bool,
    pub desynchronization: bool,
    pub data_length_indicator: bool,
}

/// One typed record of the tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub type_code: String,
    pub options: FrameOptions,
    pub body: Body,
}

impl Frame {
    pub fn new(type_code: &str, body: Body) -> Frame {
        Frame {
            type_code: type_code.to_string(),
            options: FrameOptions::default(),
            body,
        }
    }

    pub fn with_options(mut self, options: FrameOptions) -> Frame {
        self.options = options;
        self
    }

    /// Frame ids are exactly four characters long.
    pub fn has_valid_id(&self) -> bool {
        self.type_code.chars().count() == 4
    }
}
