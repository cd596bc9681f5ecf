//! Unsynchronisation and synchsafe integers.
//!
//! MPEG decoders look for `%11111111 111xxxxx` to find the start of an audio
//! frame, so a tag must never contain that bit pattern. Unsynchronisation
//! stuffs a zero byte after every `0xFF` that is followed by such a byte (or
//! by a zero byte, so the stuffing itself stays reversible). Sizes that have
//! to survive the scheme are written as synchsafe integers: 7 bits per byte,
//! high bit always clear.

use thiserror::Error;
use tracing::trace;

pub const MARKER: u8 = 0xFF;

/// Largest value a 4-byte synchsafe integer can hold.
pub const MAX_SAFE_SIZE: u32 = 0x0FFF_FFFF;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("invalid synchsafe byte {byte:#04x} at position {position}")]
    HighBitSet { byte: u8, position: usize },

    #[error("{0} does not fit in 28 bits")]
    TooLarge(u32),

    #[error("synchsafe integer does not fit in 32 bits")]
    Overflow,

    #[error("expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

/// Result of undoing unsynchronisation over a declared span of input.
#[derive(Debug, Clone, PartialEq)]
pub struct Unescaped {
    pub bytes: Vec<u8>,
    /// Number of input bytes the span occupied on disk.
    pub consumed: usize,
}

// a false sync is 0xFF followed by a byte with the top three bits set
fn needs_stuffing(next: u8) -> bool {
    next == 0x00 || next & 0xE0 == 0xE0
}

/// Undo unsynchronisation over exactly `size` bytes of `input`.
pub fn unescape(input: &[u8], size: usize) -> Result<Unescaped, SyncError> {
    if input.len() < size {
        return Err(SyncError::Truncated {
            expected: size,
            actual: input.len(),
        });
    }
    let input = &input[..size];

    let mut bytes = Vec::with_capacity(size);
    let mut i = 0;
    while i < input.len() {
        let b = input[i];
        bytes.push(b);
        i += 1;
        // drop the stuffed zero
        if b == MARKER && i < input.len() && input[i] == 0x00 {
            i += 1;
        }
    }

    trace!(
        removed = size - bytes.len(),
        size,
        "undid unsynchronisation"
    );

    Ok(Unescaped {
        bytes,
        consumed: size,
    })
}

/// Apply unsynchronisation. `unescape` of the result gives back `input`.
pub fn escape(input: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len() + input.len() / 16);
    for (i, &b) in input.iter().enumerate() {
        result.push(b);
        if b == MARKER {
            if let Some(&next) = input.get(i + 1) {
                if needs_stuffing(next) {
                    result.push(0x00);
                }
            }
        }
    }

    trace!(
        inserted = result.len() - input.len(),
        size = input.len(),
        "applied unsynchronisation"
    );

    result
}

pub fn decode_synch_int(input: &[u8]) -> Result<u32, SyncError> {
    debug_assert!(input.len() <= 5);
    let mut result: u32 = 0;
    for (i, b) in input.iter().enumerate() {
        // verify that this is a valid synchsafe int
        // (by checking that the msb of each byte is zero)
        if b & 0x80 != 0 {
            return Err(SyncError::HighBitSet {
                byte: *b,
                position: i,
            });
        }
        // the top 7 bits have to be free before the next shift
        if result >> 25 != 0 {
            return Err(SyncError::Overflow);
        }
        // moving the 7 bit parts to proper places
        // (0000 0001 0111 1111 => 1111 1111)
        result = (result << 7) | u32::from(*b);
    }
    Ok(result)
}

/// Decode the 4-byte, 28-bit form used for tag and frame sizes.
pub fn decode_safe_size(input: [u8; 4]) -> Result<u32, SyncError> {
    decode_synch_int(&input)
}

pub fn encode_safe_size(input: u32) -> Result<[u8; 4], SyncError> {
    if input > MAX_SAFE_SIZE {
        return Err(SyncError::TooLarge(input));
    }
    let mut result = [0; 4];
    for (i, r) in result.iter_mut().enumerate() {
        *r = ((input >> (7 * (3 - i))) & 0x7F) as u8;
    }
    Ok(result)
}

/// The 5-byte, 35-bit form that v2.4 extended headers use for the CRC.
pub fn encode_synch_int_wide(input: u32) -> [u8; 5] {
    let mut result = [0; 5];
    for (i, r) in result.iter_mut().enumerate() {
        *r = ((u64::from(input) >> (7 * (4 - i))) & 0x7F) as u8;
    }
    result
}
