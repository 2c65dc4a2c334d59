//! Fixed-width hexadecimal field decoding

use crate::command::ParseError;
use crate::token::TokenReader;

/// Value of one ASCII hex digit (either case)
pub const fn digit_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Read `width` hex digits as one big-endian number
fn read_number(reader: &mut TokenReader<'_>, width: usize) -> Result<u16, ParseError> {
    let mut value: u16 = 0;
    for _ in 0..width {
        let c = reader.read().ok_or(ParseError::UnexpectedEnd)?;
        let digit = digit_value(c).ok_or(ParseError::MalformedNumeric)?;
        value = (value << 4) | digit as u16;
    }
    Ok(value)
}

/// One hex digit (small enums and flags)
pub fn read_digit(reader: &mut TokenReader<'_>) -> Result<u8, ParseError> {
    read_number(reader, 1).map(|v| v as u8)
}

/// Two hex digits (byte values and palette indices)
pub fn read_byte(reader: &mut TokenReader<'_>) -> Result<u8, ParseError> {
    read_number(reader, 2).map(|v| v as u8)
}

/// Three hex digits (coordinates and sizes, 0-4095)
pub fn read_num3(reader: &mut TokenReader<'_>) -> Result<u16, ParseError> {
    read_number(reader, 3)
}

/// Decode hex pairs from `src` into `dst`
///
/// `src` must be exactly twice as long as `dst`.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<(), ParseError> {
    if src.len() != dst.len() * 2 {
        return Err(ParseError::UnexpectedEnd);
    }
    for (pair, out) in src.chunks_exact(2).zip(dst.iter_mut()) {
        let high = digit_value(pair[0]).ok_or(ParseError::MalformedNumeric)?;
        let low = digit_value(pair[1]).ok_or(ParseError::MalformedNumeric)?;
        *out = (high << 4) | low;
    }
    Ok(())
}
