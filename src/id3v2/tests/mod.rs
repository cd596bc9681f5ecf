
use std::io::Cursor;

use crate::id3v2::catalog::{Body, FullText, Picture, Text, TextEncoding};
use crate::id3v2::codec::FrameCodec;
use crate::id3v2::collection::TagCollection;
use crate::id3v2::structure::{Frame, FrameOptions};
use crate::id3v2::sync::{encode_safe_size, escape};
use crate::id3v2::{read, write, ReadSettings, WriteSettings};
use crate::Error;

fn text(type_code: &str, value: &str) -> Frame {
    Frame::new(
        type_code,
        Body::Text(Text::new(TextEncoding::Utf16, value)),
    )
}

fn record(version: u8, frame: &Frame) -> Vec<u8> {
    let mut vec = Vec::new();
    FrameCodec::new(version).write_record(frame, &mut vec).unwrap();
    vec
}

fn raw_tag(version: u8, flags: u8, body: &[u8]) -> Vec<u8> {
    let mut vec = b"ID3".to_vec();
    vec.push(version);
    vec.push(0x00);
    vec.push(flags);
    vec.extend_from_slice(&encode_safe_size(body.len() as u32).unwrap());
    vec.extend_from_slice(body);
    vec
}

fn mixed(version: u8) -> TagCollection {
    let mut tag = TagCollection::new(version);
    tag.push(text("TIT2", "NEXT FLIP FLAPPING！")).unwrap();
    tag.push(text("TPE1", "TO-MAS")).unwrap();
    tag.push(Frame::new(
        "COMM",
        Body::FullText(FullText {
            encoding: TextEncoding::Latin1,
            language: *b"eng",
            description: String::new(),
            text: "Test Comments".to_string(),
        }),
    ))
    .unwrap();
    tag.push(
        Frame::new(
            "APIC",
            Body::Picture(Picture {
                encoding: TextEncoding::Latin1,
                mime: "image/png".to_string(),
                picture_type: 0x03,
                description: String::new(),
                data: vec![0x89, 0x50, 0x4E, 0x47, 0xFF, 0xE0, 0x00, 0x00],
            }),
        )
        .with_options(FrameOptions {
            compression: true,
            grouping: true,
            ..Default::default()
        }),
    )
    .unwrap();
    if version == 4 {
        tag.push(
            Frame::new("PRIV", Body::Binary(vec![0xFF, 0xFB, 0x90, 0x44, 0xFF, 0x00]))
                .with_options(FrameOptions {
                    desynchronization: true,
                    data_length_indicator: true,
                    ..Default::default()
                }),
        )
        .unwrap();
    }
    tag
}

#[test]
fn write_read_test() {
    for version in &[3, 4] {
        let mut tag = mixed(*version);
        let bytes = write::render(&mut tag, &WriteSettings::default().with_padding(64)).unwrap();

        assert_eq!(&bytes[..6], &[b'I', b'D', b'3', *version, 0x00, 0x00]);
        assert_eq!(bytes.len(), 10 + tag.header.tag_size as usize);
        assert!(bytes.ends_with(&[0x00; 64]));

        let read = read::tag_from_bytes(&bytes, &ReadSettings::default()).unwrap();
        assert_eq!(read.header.version, *version);
        assert_eq!(read.header.padding_size, 64);
        assert_eq!(read.header.tag_size, tag.header.tag_size);
        assert_eq!(read.extended_header, None);
        assert_eq!(read.iter().collect::<Vec<_>>(), tag.iter().collect::<Vec<_>>());
    }
}

#[test]
fn get_set_test() {
    let audio = vec![0xFF, 0xFB, 0x90, 0x44, 0x00, 0x00, 0x00, 0x00];

    // no tag yet
    let mut input = Cursor::new(audio.clone());
    let mut output = Vec::new();
    let mut tag = mixed(4);
    super::set(&mut input, &mut output, &mut tag).unwrap();
    assert!(output.ends_with(&audio));

    let read = super::get(&mut Cursor::new(output.clone())).unwrap();
    assert_eq!(read.len(), tag.len());

    // replace the tag that is there now
    let mut smaller = TagCollection::new(3);
    smaller.push(text("TALB", "100% Jazz")).unwrap();
    let mut replaced = Vec::new();
    write::replace(
        &mut Cursor::new(output),
        &mut replaced,
        &mut smaller,
        &WriteSettings::default(),
    )
    .unwrap();
    assert_eq!(
        replaced.len(),
        10 + smaller.header.tag_size as usize + audio.len()
    );
    assert!(replaced.ends_with(&audio));

    let read = super::get(&mut Cursor::new(replaced)).unwrap();
    assert_eq!(read.header.version, 3);
    assert_eq!(read.find("TALB"), Some(&text("TALB", "100% Jazz")));
    assert_eq!(read.find("TIT2"), None);
}

#[test]
fn crc_test() {
    for version in &[3, 4] {
        let mut tag = mixed(*version);
        let settings = WriteSettings::default().with_padding(16).with_crc(true);
        let mut bytes = write::render(&mut tag, &settings).unwrap();
        assert_eq!(bytes[5], 0b0100_0000);

        let expected = tag.calculate_checksum().unwrap();
        let ext = tag.extended_header.clone().unwrap();
        assert_eq!(ext.crc32, Some(expected));

        let read = read::tag_from_bytes(&bytes, &ReadSettings::default()).unwrap();
        assert_eq!(read.extended_header.as_ref().and_then(|e| e.crc32), Some(expected));
        assert_eq!(read.extended_header.as_ref().map(|e| e.size), Some(ext.size));
        assert_eq!(read.header.padding_size, 16);
        assert_eq!(read.len(), tag.len());

        // TO-MAS => TO-MAT, still a fine frame
        // id, size and flags, encoding, BOM, then "TO-MA" in UTF-16
        let at = bytes.windows(4).position(|w| w == b"TPE1").unwrap() + 10 + 1 + 2 + 10;
        assert_eq!(bytes[at], b'S');
        bytes[at] = b'T';
        match read::tag_from_bytes(&bytes, &ReadSettings::default()) {
            Err(Error::ChecksumMismatch { expected: e, .. }) => assert_eq!(e, expected),
            other => panic!("expected a checksum mismatch, got {:?}", other),
        }
        let read =
            read::tag_from_bytes(&bytes, &ReadSettings::default().with_verify_crc(false))
                .unwrap();
        assert_eq!(read.find("TPE1"), Some(&text("TPE1", "TO-MAT")));
    }
}

#[test]
fn v4_extended_header_test() {
    let mut body = vec![0x00, 0x00, 0x00, 0x09, 0x01, 0x50, 0x00, 0x01, 0x23];
    body.append(&mut record(4, &text("TIT2", "Test Name")));
    let bytes = raw_tag(4, 0b0100_0000, &body);

    let mut tag = read::tag_from_bytes(&bytes, &ReadSettings::default()).unwrap();
    let ext = tag.extended_header.clone().unwrap();
    assert_eq!(ext.size, 9);
    assert!(ext.tag_is_update);
    assert_eq!(ext.restrictions, Some(0x23));
    assert_eq!(ext.crc32, None);
    assert_eq!(tag.header.padding_size, 0);

    // kept on the way out
    let written = write::render(&mut tag, &WriteSettings::default()).unwrap();
    assert_eq!(written, bytes);
}

#[test]
fn v3_extended_header_test() {
    // no CRC, 0x20 bytes of padding
    let mut body = vec![0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x20];
    body.append(&mut record(3, &text("TIT2", "Test Name")));
    body.extend_from_slice(&[0x00; 0x20]);
    let bytes = raw_tag(3, 0b0100_0000, &body);

    let tag = read::tag_from_bytes(&bytes, &ReadSettings::default()).unwrap();
    let ext = tag.extended_header.clone().unwrap();
    assert_eq!(ext.size, 10);
    assert_eq!(ext.padding_size, 0x20);
    assert_eq!(tag.header.padding_size, 0x20);
    assert_eq!(tag.len(), 1);

    // the size must be 6 or 10
    let bad = raw_tag(3, 0b0100_0000, &[0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    assert!(matches!(
        read::tag_from_bytes(&bad, &ReadSettings::default()),
        Err(Error::Tag(_))
    ));
}

#[test]
fn v3_unsynchronised_tag_test() {
    let frame = Frame::new("PRIV", Body::Binary(vec![0xFF, 0xE0, 0x01]));
    let body = escape(&record(3, &frame));
    assert_eq!(body.len(), 14);
    let bytes = raw_tag(3, 0b1000_0000, &body);

    let tag = read::tag_from_bytes(&bytes, &ReadSettings::default()).unwrap();
    assert!(tag.header.is_unsynchronized);
    assert_eq!(tag.get(0), Some(&frame));
}

#[test]
fn header_test() {
    let mut tag = TagCollection::new(4);
    tag.push(text("TIT2", "x")).unwrap();
    let bytes = write::render(&mut tag, &WriteSettings::default()).unwrap();

    let mut not_id3 = bytes.clone();
    not_id3[0] = b'X';
    assert!(matches!(
        read::tag_from_bytes(&not_id3, &ReadSettings::default()),
        Err(Error::Tag(_))
    ));

    let mut v2 = bytes.clone();
    v2[3] = 2;
    assert!(matches!(
        read::tag_from_bytes(&v2, &ReadSettings::default()),
        Err(Error::UnsupportedFormatVersion(2))
    ));

    let mut bad_flags = bytes.clone();
    bad_flags[5] = 0x01;
    assert!(matches!(
        read::tag_from_bytes(&bad_flags, &ReadSettings::default()),
        Err(Error::Tag(_))
    ));

    let mut bad_size = bytes.clone();
    bad_size[9] = 0x80;
    assert!(matches!(
        read::tag_from_bytes(&bad_size, &ReadSettings::default()),
        Err(Error::Tag(_))
    ));

    assert!(matches!(
        read::tag_from_bytes(&bytes[..bytes.len() - 1], &ReadSettings::default()),
        Err(Error::Tag(_))
    ));
    assert!(matches!(
        read::header(&mut Cursor::new(b"ID3".to_vec())),
        Err(Error::Tag(_))
    ));
}

#[test]
fn write_invalid_test() {
    // no frames
    let mut empty = TagCollection::new(4);
    assert!(matches!(
        write::render(&mut empty, &WriteSettings::default()),
        Err(Error::Tag(_))
    ));

    let mut v2 = TagCollection::new(2);
    v2.push(text("TIT2", "x")).unwrap();
    assert!(matches!(
        write::render(&mut v2, &WriteSettings::default()),
        Err(Error::UnsupportedFormatVersion(2))
    ));

    let mut v3 = TagCollection::new(3);
    v3.push(text("TIT2", "x").with_options(FrameOptions {
        desynchronization: true,
        ..Default::default()
    }))
    .unwrap();
    assert!(matches!(
        write::render(&mut v3, &WriteSettings::default()),
        Err(Error::UnrepresentableOption { version: 3, .. })
    ));
}

fn with_unknown_frame() -> Vec<u8> {
    let mut body = record(4, &text("TIT2", "a"));
    body.extend_from_slice(b"ZZZZ\x00\x00\x00\x03\x00\x00abc");
    body.append(&mut record(4, &text("TPE1", "b")));
    body.extend_from_slice(&[0x00; 8]);
    raw_tag(4, 0x00, &body)
}

#[test]
fn strict_read_test() {
    match read::tag_from_bytes(&with_unknown_frame(), &ReadSettings::default()) {
        Err(Error::UnknownFrameType(id)) => assert_eq!(id, "ZZZZ"),
        other => panic!("expected an unknown frame, got {:?}", other),
    }
}

#[test]
fn lenient_read_test() {
    let tag = read::tag_from_bytes(&with_unknown_frame(), &ReadSettings::lenient()).unwrap();
    let ids: Vec<&str> = tag.iter().map(|f| f.type_code.as_str()).collect();
    assert_eq!(ids, vec!["TIT2", "TPE1"]);
    assert_eq!(tag.header.padding_size, 8);
}

#[test]
fn truncated_frame_test() {
    let mut body = record(4, &text("TIT2", "a"));
    // claims 0x20 bytes, has 3
    body.extend_from_slice(b"TPE1\x00\x00\x00\x20\x00\x00\x00ab");
    let bytes = raw_tag(4, 0x00, &body);

    assert!(matches!(
        read::tag_from_bytes(&bytes, &ReadSettings::default()),
        Err(Error::MalformedFrame { .. })
    ));

    // the frames read so far are kept
    let tag = read::tag_from_bytes(&bytes, &ReadSettings::lenient()).unwrap();
    assert_eq!(tag.len(), 1);
    assert_eq!(tag.get(0), Some(&text("TIT2", "a")));
}

#[test]
fn garbage_after_frames_test() {
    let mut body = record(3, &text("TIT2", "a"));
    body.extend_from_slice(b"\x01\x02\x03garbage!!!");
    let bytes = raw_tag(3, 0x00, &body);

    assert!(matches!(
        read::tag_from_bytes(&bytes, &ReadSettings::default()),
        Err(Error::InvalidFrameId(_))
    ));
    let tag = read::tag_from_bytes(&bytes, &ReadSettings::lenient()).unwrap();
    assert_eq!(tag.len(), 1);
}

#[test]
fn write_to_stream_test() {
    let mut tag = mixed(3);
    let mut output = Vec::new();
    write::tag(&mut tag, &mut output, &WriteSettings::default().with_padding(10)).unwrap();

    let read = read::tag(&mut Cursor::new(output), &ReadSettings::default()).unwrap();
    assert_eq!(read.header.padding_size, 10);
    assert_eq!(read, tag);
}

#[test]
fn v4_unsynchronised_tag_test() {
    // the frame's own flags say nothing, the header bit covers it
    let mut body = b"PRIV".to_vec();
    body.extend_from_slice(&encode_safe_size(4).unwrap());
    body.extend_from_slice(&[0x00, 0x00, 0xFF, 0x00, 0xE0, 0x01]);
    let bytes = raw_tag(4, 0b1000_0000, &body);

    let tag = read::tag_from_bytes(&bytes, &ReadSettings::default()).unwrap();
    assert!(tag.header.is_unsynchronized);
    let frame = tag.get(0).unwrap();
    assert_eq!(frame.body, Body::Binary(vec![0xFF, 0xE0, 0x01]));
    assert!(frame.options.desynchronization);

    // without the header bit the stuffed zero is data
    let tag = read::tag_from_bytes(&raw_tag(4, 0x00, &body), &ReadSettings::default()).unwrap();
    assert_eq!(tag.get(0).unwrap().body, Body::Binary(vec![0xFF, 0x00, 0xE0, 0x01]));
}

#[test]
fn v4_extended_header_crc_overflow_test() {
    // a CRC over 32 bits
    let mut body = vec![0x00, 0x00, 0x00, 0x0C, 0x01, 0x20, 0x05, 0x10, 0x00, 0x00, 0x00, 0x00];
    body.append(&mut record(4, &text("TIT2", "Test Name")));
    let bytes = raw_tag(4, 0b0100_0000, &body);

    assert!(matches!(
        read::tag_from_bytes(&bytes, &ReadSettings::default().with_verify_crc(false)),
        Err(Error::Tag(_))
    ));
}
