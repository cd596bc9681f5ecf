//! Named access to the frames most players show.
//!
//! Setting an empty value (or `None`) removes the frame. Frames that are
//! already there keep their position and flags.

use std::time::Duration;

use crate::id3v2::catalog::{self, Body, FullText, Picture, Text, TextEncoding};
use crate::id3v2::collection::TagCollection;
use crate::Error;

// picture type of a front cover
const FRONT_COVER: u8 = 0x03;

// ISO-8859-1 when it can hold the value, UTF-16 otherwise
fn encoding_for(value: &str) -> TextEncoding {
    if value.chars().all(|c| (c as u32) < 0x100) {
        TextEncoding::Latin1
    } else {
        TextEncoding::Utf16
    }
}

fn picture_mime(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG") {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else {
        // allowed when the format is unknown
        "image/"
    }
}

macro_rules! text_frame {
    ($get:ident, $set:ident, $id:expr) => {
        pub fn $get(&self) -> Option<&str> {
            self.text($id)
        }

        pub fn $set(&mut self, value: &str) -> Result<(), Error> {
            self.set_text($id, value)
        }
    };
}

macro_rules! full_text_frame {
    ($get:ident, $set:ident, $id:expr) => {
        pub fn $get(&self) -> Option<&str> {
            match self.find($id).map(|f| &f.body) {
                Some(Body::FullText(t)) => Some(t.text.as_str()),
                _ => None,
            }
        }

        pub fn $set(&mut self, value: &str) -> Result<(), Error> {
            let body = Body::FullText(FullText {
                encoding: encoding_for(value),
                text: value.to_string(),
                ..Default::default()
            });
            self.set_body($id, if value.is_empty() { None } else { Some(body) })
        }
    };
}

impl TagCollection {
    text_frame!(title, set_title, "TIT2");
    text_frame!(artist, set_artist, "TPE1");
    text_frame!(album, set_album, "TALB");
    text_frame!(year, set_year, "TYER");
    text_frame!(composer, set_composer, "TCOM");
    text_frame!(genre, set_genre, "TCON");
    text_frame!(track, set_track, "TRCK");
    text_frame!(disc, set_disc, "TPOS");

    full_text_frame!(lyrics, set_lyrics, "USLT");
    full_text_frame!(comment, set_comment, "COMM");

    /// `TLEN`, stored as a count of milliseconds.
    pub fn length(&self) -> Option<Duration> {
        self.text("TLEN")?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_millis)
    }

    pub fn padding_size(&self) -> u32 {
        self.header.padding_size
    }

    /// The first attached picture.
    pub fn picture(&self) -> Option<&Picture> {
        match self.find("APIC").map(|f| &f.body) {
            Some(Body::Picture(p)) => Some(p),
            _ => None,
        }
    }

    pub fn set_picture(&mut self, picture: Option<Picture>) -> Result<(), Error> {
        self.set_body("APIC", picture.map(Body::Picture))
    }

    pub fn picture_data(&self) -> Option<&[u8]> {
        self.picture().map(|p| p.data.as_slice())
    }

    /// Swap the image of the first picture, or add a front cover when
    /// there is none.
    pub fn set_picture_data(&mut self, data: Option<Vec<u8>>) -> Result<(), Error> {
        let picture = data.map(|data| match self.picture() {
            Some(p) => Picture {
                data,
                ..p.clone()
            },
            None => Picture {
                mime: picture_mime(&data).to_string(),
                picture_type: FRONT_COVER,
                data,
                ..Default::default()
            },
        });
        self.set_picture(picture)
    }

    // first value of a text frame
    fn text(&self, type_code: &str) -> Option<&str> {
        match self.find(type_code).map(|f| &f.body) {
            Some(Body::Text(t)) => t.values.first().map(String::as_str),
            _ => None,
        }
    }

    fn set_text(&mut self, type_code: &str, value: &str) -> Result<(), Error> {
        let body = if value.is_empty() {
            None
        } else {
            Some(Body::Text(Text::new(encoding_for(value), value)))
        };
        self.set_body(type_code, body)
    }

    fn set_body(&mut self, type_code: &str, body: Option<Body>) -> Result<(), Error> {
        let index = self.iter().position(|f| f.type_code == type_code);
        match (index, body) {
            (Some(i), Some(body)) => {
                let mut frame = catalog::build(type_code)?;
                if let Some(old) = self.get(i) {
                    frame.options = old.options;
                }
                frame.body = body;
                self.replace(i, frame)?;
            }
            (Some(i), None) => {
                self.remove(i);
            }
            (None, Some(body)) => {
                let mut frame = catalog::build(type_code)?;
                frame.body = body;
                self.push(frame)?;
            }
            (None, None) => {}
        }
        Ok(())
    }
}
