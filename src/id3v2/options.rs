//! Frame flag words.
//!
//! v2.3: `%abc00000 %ijk00000`
//!   a tag alter preservation, b file alter preservation, c read only,
//!   i compression, j encryption, k grouping identity
//!
//! v2.4: `%0abc0000 %0h00kmnp`
//!   a tag alter preservation, b file alter preservation, c read only,
//!   h grouping identity, k compression, m encryption, n unsynchronisation,
//!   p data length indicator

use crate::id3v2::structure::FrameOptions;
use crate::Error;

mod v3 {
    pub const TAG_ALTER: u16 = 0x8000;
    pub const FILE_ALTER: u16 = 0x4000;
    pub const READ_ONLY: u16 = 0x2000;

    pub const COMPRESSION: u16 = 0x0080;
    pub const ENCRYPTION: u16 = 0x0040;
    pub const GROUPING: u16 = 0x0020;
}

mod v4 {
    pub const TAG_ALTER: u16 = 0x4000;
    pub const FILE_ALTER: u16 = 0x2000;
    pub const READ_ONLY: u16 = 0x1000;

    pub const GROUPING: u16 = 0x0040;
    pub const COMPRESSION: u16 = 0x0008;
    pub const ENCRYPTION: u16 = 0x0004;
    pub const UNSYNCHRONISATION: u16 = 0x0002;
    pub const DATA_LENGTH_INDICATOR: u16 = 0x0001;
}

/// Decode the flag word of a frame in a tag of the given version.
pub fn interpret(version: u8, flags: u16) -> Result<FrameOptions, Error> {
    let set = |bit: u16| flags & bit != 0;
    match version {
        3 => Ok(FrameOptions {
            tag_alter_preservation: set(v3::TAG_ALTER),
            file_alter_preservation: set(v3::FILE_ALTER),
            read_only: set(v3::READ_ONLY),

            grouping: set(v3::GROUPING),
            compression: set(v3::COMPRESSION),
            encryption: set(v3::ENCRYPTION),
            // only the whole tag can be unsynchronised in v2.3
            desynchronization: false,
            data_length_indicator: false,
        }),
        4 => Ok(FrameOptions {
            tag_alter_preservation: set(v4::TAG_ALTER),
            file_alter_preservation: set(v4::FILE_ALTER),
            read_only: set(v4::READ_ONLY),

            grouping: set(v4::GROUPING),
            compression: set(v4::COMPRESSION),
            encryption: set(v4::ENCRYPTION),
            desynchronization: set(v4::UNSYNCHRONISATION),
            data_length_indicator: set(v4::DATA_LENGTH_INDICATOR),
        }),
        _ => Err(Error::UnsupportedFormatVersion(version)),
    }
}

impl FrameOptions {
    /// Encode into the flag word of the given version.
    pub fn to_bits(&self, version: u8) -> Result<u16, Error> {
        let bit = |on: bool, bit: u16| if on { bit } else { 0 };
        match version {
            3 => {
                if self.desynchronization {
                    return Err(Error::UnrepresentableOption {
                        version,
                        option: "unsynchronisation",
                    });
                }
                if self.data_length_indicator {
                    return Err(Error::UnrepresentableOption {
                        version,
                        option: "data length indicator",
                    });
                }
                Ok(bit(self.tag_alter_preservation, v3::TAG_ALTER)
                    | bit(self.file_alter_preservation, v3::FILE_ALTER)
                    | bit(self.read_only, v3::READ_ONLY)
                    | bit(self.grouping, v3::GROUPING)
                    | bit(self.compression, v3::COMPRESSION)
                    | bit(self.encryption, v3::ENCRYPTION))
            }
            4 => Ok(bit(self.tag_alter_preservation, v4::TAG_ALTER)
                | bit(self.file_alter_preservation, v4::FILE_ALTER)
                | bit(self.read_only, v4::READ_ONLY)
                | bit(self.grouping, v4::GROUPING)
                | bit(self.compression, v4::COMPRESSION)
                | bit(self.encryption, v4::ENCRYPTION)
                | bit(self.desynchronization, v4::UNSYNCHRONISATION)
                | bit(self.data_length_indicator, v4::DATA_LENGTH_INDICATOR)),
            _ => Err(Error::UnsupportedFormatVersion(version)),
        }
    }

    /// Whether the frame carries a 4-byte size field ahead of its data.
    pub fn has_size_field(&self, version: u8) -> bool {
        self.compression || (version == 4 && self.data_length_indicator)
    }
}
