//! Little-endian wire primitives: pack/unpack for the eight value kinds'
//! scalar bodies, plus the NUL-terminated string convention shared by
//! `STRING` values and `OBJECT` keys.
//!
//! Decoding is built on `nom`'s binary number combinators; this module is a
//! pure function layer with no notion of a frame or a record.

use nom::number::complete::{le_f32, le_i32, le_i8, le_u16, le_u32, le_u8};
use nom::IResult;

use crate::error::PrimitiveError;

type PResult<'a, O> = Result<(&'a [u8], O), PrimitiveError>;

fn map_incomplete<O>(result: IResult<&[u8], O>) -> PResult<O> {
    result.map_err(|_| PrimitiveError::Incomplete)
}

pub fn decode_bool(input: &[u8]) -> PResult<bool> {
    let (rest, byte) = map_incomplete(le_u8(input))?;
    Ok((rest, byte != 0))
}

pub fn decode_i8(input: &[u8]) -> PResult<i8> {
    map_incomplete(le_i8(input))
}

pub fn decode_u8(input: &[u8]) -> PResult<u8> {
    map_incomplete(le_u8(input))
}

pub fn decode_i32(input: &[u8]) -> PResult<i32> {
    map_incomplete(le_i32(input))
}

pub fn decode_u32(input: &[u8]) -> PResult<u32> {
    map_incomplete(le_u32(input))
}

pub fn decode_u16(input: &[u8]) -> PResult<u16> {
    map_incomplete(le_u16(input))
}

pub fn decode_f32(input: &[u8]) -> PResult<f32> {
    map_incomplete(le_f32(input))
}

/// Splits `input` at the first NUL byte, returning the bytes before it
/// (without the terminator) and the remainder after it. `Incomplete` if no
/// NUL terminator is present.
pub fn parse_cstring(input: &[u8]) -> PResult<&[u8]> {
    match input.iter().position(|&b| b == 0) {
        Some(pos) => Ok((&input[pos + 1..], &input[..pos])),
        None => Err(PrimitiveError::Incomplete),
    }
}

/// [`parse_cstring`], lossily decoded as UTF-8 (the wire does not guarantee
/// an encoding — strings are treated as opaque bytes).
pub fn parse_cstring_lossy(input: &[u8]) -> PResult<String> {
    let (rest, bytes) = parse_cstring(input)?;
    Ok((rest, String::from_utf8_lossy(bytes).into_owned()))
}

pub fn encode_bool(value: bool, out: &mut Vec<u8>) {
    out.push(value as u8);
}

pub fn encode_i8(value: i8, out: &mut Vec<u8>) {
    out.push(value as u8);
}

pub fn encode_u8(value: u8, out: &mut Vec<u8>) {
    out.push(value);
}

pub fn encode_i32(value: i32, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn encode_u32(value: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn encode_u16(value: u16, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn encode_f32(value: f32, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Appends `value` followed by a single NUL terminator.
pub fn encode_cstring(value: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(value.as_bytes());
    out.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_round_trip() {
        let mut out = Vec::new();
        encode_u32(0xDEAD_BEEF, &mut out);
        assert_eq!(decode_u32(&out).unwrap(), (&[][..], 0xDEAD_BEEF));

        out.clear();
        encode_f32(1.5, &mut out);
        assert_eq!(decode_f32(&out).unwrap(), (&[][..], 1.5));

        out.clear();
        encode_i8(-5, &mut out);
        assert_eq!(decode_i8(&out).unwrap(), (&[][..], -5));
    }

    #[test]
    fn cstring_round_trips_and_leaves_remainder() {
        let mut out = Vec::new();
        encode_cstring("foo", &mut out);
        out.extend_from_slice(b"trailing");
        let (rest, s) = parse_cstring_lossy(&out).unwrap();
        assert_eq!(s, "foo");
        assert_eq!(rest, b"trailing");
    }

    #[test]
    fn missing_nul_is_incomplete() {
        assert_eq!(parse_cstring(b"no-terminator"), Err(PrimitiveError::Incomplete));
    }

    #[test]
    fn short_buffer_is_incomplete() {
        assert_eq!(decode_u32(&[1, 2]), Err(PrimitiveError::Incomplete));
    }
}
