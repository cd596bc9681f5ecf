use crc::crc32;
use tracing::debug;

use crate::id3v2::codec::FrameCodec;
use crate::id3v2::structure::{ExtendedHeader, Frame, Header};
use crate::Error;

/// The frames of one tag, in the order they are stored, together with the
/// tag's header.
///
/// A tag without frames cannot be written, but is fine to hold while
/// frames are being added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagCollection {
    pub header: Header,
    pub extended_header: Option<ExtendedHeader>,
    frames: Vec<Frame>,
}

fn check_frame(frame: &Frame) -> Result<(), Error> {
    if !frame.has_valid_id() {
        return Err(Error::InvalidFrameId(frame.type_code.clone()));
    }
    Ok(())
}

impl TagCollection {
    pub fn new(version: u8) -> TagCollection {
        TagCollection {
            header: Header::new(version),
            extended_header: None,
            frames: Vec::new(),
        }
    }

    pub fn with_header(header: Header) -> TagCollection {
        TagCollection {
            header,
            extended_header: None,
            frames: Vec::new(),
        }
    }

    pub fn insert(&mut self, index: usize, frame: Frame) -> Result<(), Error> {
        check_frame(&frame)?;
        if index > self.frames.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.frames.len(),
            });
        }
        self.frames.insert(index, frame);
        Ok(())
    }

    /// Put `frame` in place of the one at `index`, handing back the old one.
    pub fn replace(&mut self, index: usize, frame: Frame) -> Result<Frame, Error> {
        check_frame(&frame)?;
        match self.frames.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, frame)),
            None => Err(Error::IndexOutOfRange {
                index,
                len: self.frames.len(),
            }),
        }
    }

    pub fn push(&mut self, frame: Frame) -> Result<(), Error> {
        self.insert(self.frames.len(), frame)
    }

    /// Add every frame, stopping at the first invalid one.
    pub fn extend<I: IntoIterator<Item = Frame>>(&mut self, frames: I) -> Result<(), Error> {
        for frame in frames {
            self.push(frame)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Frame> {
        if index < self.frames.len() {
            Some(self.frames.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// First frame with the given id.
    pub fn find(&self, type_code: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.type_code == type_code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    // id3v2 tags can not have "no frames"
    pub fn is_valid(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Codec for this tag's version.
    pub fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.header.version)
    }

    /// Every frame record followed by the padding, as it goes on disk
    /// after the header and extended header.
    pub fn render_with(&self, codec: &FrameCodec) -> Result<Vec<u8>, Error> {
        let mut vec = Vec::new();
        for frame in &self.frames {
            codec.write_record(frame, &mut vec)?;
        }
        vec.resize(vec.len() + self.header.padding_size as usize, 0);
        Ok(vec)
    }

    /// On-disk length of the frames, padding excluded.
    ///
    /// The stored tag size is only touched for an invalid tag, where it is
    /// cleared.
    pub fn recompute_size(&mut self) -> Result<u32, Error> {
        if !self.is_valid() {
            // clear the size stored in the header
            self.header.tag_size = 0;
        }
        let rendered = self.render_with(&self.codec())?;
        let size = rendered.len() - self.header.padding_size as usize;
        debug!(frames = self.frames.len(), size, "measured tag");
        Ok(size as u32)
    }

    /// CRC-32 of the frames, padding excluded. Zero for an invalid tag.
    pub fn calculate_checksum(&self) -> Result<u32, Error> {
        self.checksum_with(&self.codec())
    }

    pub fn checksum_with(&self, codec: &FrameCodec) -> Result<u32, Error> {
        if !self.is_valid() {
            return Ok(0);
        }
        let mut buffer = self.render_with(codec)?;

        // padding changes neither the body of the tag nor the audio
        let size = buffer.len().saturating_sub(self.header.padding_size as usize);
        buffer.truncate(size);

        Ok(crc32::checksum_ieee(&buffer))
    }
}

impl<'a> IntoIterator for &'a TagCollection {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
