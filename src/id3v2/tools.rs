use crate::Error;

fn is_frame_id_byte(c: u8) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit()
}

pub fn decode_frame_id(input: &[u8]) -> Result<String, Error> {
    if input.len() != 4 || !input.iter().all(|c| is_frame_id_byte(*c)) {
        // contains characters that are not A-Z or 0-9
        return Err(Error::InvalidFrameId(format!("{:X?}", input)));
    }
    Ok(input.iter().map(|c| *c as char).collect())
}

pub fn encode_frame_id(input: &str) -> Result<[u8; 4], Error> {
    let bytes = input.as_bytes();
    if bytes.len() != 4 || !bytes.iter().all(|c| is_frame_id_byte(*c)) {
        return Err(Error::InvalidFrameId(input.to_string()));
    }
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}
