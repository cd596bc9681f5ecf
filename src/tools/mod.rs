pub mod encoding;

use crate::Error;
pub fn tag_error(err: &str) -> Error {
    Error::Tag(err.to_string())
}

// big endian, up to four bytes; shorter slices are read as the low bytes
pub fn decode_int_be_u32(input: &[u8]) -> u32 {
    debug_assert!(input.len() <= 4);
    input
        .iter()
        .fold(0u32, |result, b| (result << 8) | u32::from(*b))
}

pub fn decode_int_be_u16(input: &[u8]) -> u16 {
    debug_assert!(input.len() <= 2);
    input
        .iter()
        .fold(0u16, |result, b| (result << 8) | u16::from(*b))
}

pub fn encode_int_be_u16(input: u16) -> [u8; 2] {
    [(input >> 8) as u8, input as u8]
}

pub fn encode_int_be_u32(input: u32) -> [u8; 4] {
    let mut result = [0; 4];
    for (i, r) in result.iter_mut().enumerate() {
        *r = (input >> (8 * (3 - i))) as u8;
    }
    result
}
