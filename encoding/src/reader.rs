//! Positioned, panic-free reading of little-endian primitives over an
//! in-memory byte slice.
//!
//! Unlike a `Read`-stream decoder, every read here also yields the exact
//! `[start, end)` byte range it consumed, which is what lets the decoders
//! in `chfx-parser` attach a precise [`chfx_core::ByteRange`] to every
//! [`chfx_core::AstNode`] they build.

use chfx_core::error::{LebOverflowSnafu, UnexpectedEndSnafu};
use chfx_core::{ByteRange, Result};
use num_bigint::{BigInt, BigUint};

/// A cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wraps `data` for reading from offset `0`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// The current cursor position, i.e. the number of bytes already read.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the cursor has reached the end of the input.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The total length of the wrapped input, regardless of position.
    pub fn total_len(&self) -> usize {
        self.data.len()
    }

    /// The full wrapped input, regardless of position. Lets callers look
    /// back at bytes already consumed, e.g. to recover the raw binary type
    /// index byte after [`crate::dynamic::decode_top_level`] has advanced
    /// past it.
    pub fn full_data(&self) -> &'a [u8] {
        self.data
    }

    fn take(&mut self, n: usize) -> Result<(&'a [u8], ByteRange)> {
        if self.remaining() < n {
            return UnexpectedEndSnafu {
                offset: self.pos,
                requested: n,
                remaining: self.remaining(),
            }
            .fail();
        }
        let start = self.pos;
        let bytes = &self.data[start..start + n];
        self.pos += n;
        Ok((bytes, ByteRange::new(start, self.pos)))
    }

    /// Reads `n` raw bytes, along with the range they span.
    pub fn read_bytes(&mut self, n: usize) -> Result<(&'a [u8], ByteRange)> {
        self.take(n)
    }

    pub fn read_u8(&mut self) -> Result<(u8, ByteRange)> {
        let (b, range) = self.take(1)?;
        Ok((b[0], range))
    }

    pub fn read_i8(&mut self) -> Result<(i8, ByteRange)> {
        let (b, range) = self.take(1)?;
        Ok((b[0] as i8, range))
    }

    pub fn read_u16(&mut self) -> Result<(u16, ByteRange)> {
        let (b, range) = self.take(2)?;
        Ok((u16::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_i16(&mut self) -> Result<(i16, ByteRange)> {
        let (b, range) = self.take(2)?;
        Ok((i16::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_u32(&mut self) -> Result<(u32, ByteRange)> {
        let (b, range) = self.take(4)?;
        Ok((u32::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_i32(&mut self) -> Result<(i32, ByteRange)> {
        let (b, range) = self.take(4)?;
        Ok((i32::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_u64(&mut self) -> Result<(u64, ByteRange)> {
        let (b, range) = self.take(8)?;
        Ok((u64::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_i64(&mut self) -> Result<(i64, ByteRange)> {
        let (b, range) = self.take(8)?;
        Ok((i64::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_u128(&mut self) -> Result<(u128, ByteRange)> {
        let (b, range) = self.take(16)?;
        Ok((u128::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_i128(&mut self) -> Result<(i128, ByteRange)> {
        let (b, range) = self.take(16)?;
        Ok((i128::from_le_bytes(b.try_into().unwrap()), range))
    }

    /// `UInt256`: 32 little-endian bytes, reconstructed as an unsigned
    /// arbitrary-precision integer.
    pub fn read_u256(&mut self) -> Result<(BigUint, ByteRange)> {
        let (b, range) = self.take(32)?;
        Ok((BigUint::from_bytes_le(b), range))
    }

    /// `Int256`: 32 little-endian two's-complement bytes.
    pub fn read_i256(&mut self) -> Result<(BigInt, ByteRange)> {
        let (b, range) = self.take(32)?;
        Ok((BigInt::from_signed_bytes_le(b), range))
    }

    pub fn read_f32(&mut self) -> Result<(f32, ByteRange)> {
        let (b, range) = self.take(4)?;
        Ok((f32::from_le_bytes(b.try_into().unwrap()), range))
    }

    pub fn read_f64(&mut self) -> Result<(f64, ByteRange)> {
        let (b, range) = self.take(8)?;
        Ok((f64::from_le_bytes(b.try_into().unwrap()), range))
    }

    /// `BFloat16`: the low 16 bits of an IEEE-754 single, stored as-is on
    /// the wire. Zero-extending to 32 bits and reinterpreting is exactly
    /// the bf16-to-f32 widening conversion, so no lossy rounding occurs.
    pub fn read_bfloat16(&mut self) -> Result<(f32, ByteRange)> {
        let (b, range) = self.take(2)?;
        let half = half::bf16::from_le_bytes(b.try_into().unwrap());
        Ok((half.to_f32(), range))
    }

    /// Decodes an unsigned LEB128 varint, used for string/array/map
    /// lengths and the `Dynamic`/`JSON` binary type index parameters.
    ///
    /// Per spec §8, a value that does not fit in 64 bits is a
    /// [`chfx_core::Error::LebOverflow`]; a stream that ends mid-varint
    /// surfaces the underlying [`chfx_core::Error::UnexpectedEnd`] from the
    /// byte it failed to read, matching the documented failure scenario
    /// for a truncated length prefix.
    pub fn read_leb128(&mut self) -> Result<(u64, ByteRange)> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let (byte, _) = self.read_u8()?;
            if shift >= 64 || (shift == 63 && (byte & 0x7F) > 1) {
                return LebOverflowSnafu { offset: start }.fail();
            }
            result |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok((result, ByteRange::new(start, self.pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_primitives_and_tracks_position() {
        let data = [0x2A, 0x01, 0x00, 0x00, 0x00];
        let mut r = ByteReader::new(&data);
        let (v, range) = r.read_u8().unwrap();
        assert_eq!(v, 0x2A);
        assert_eq!(range, ByteRange::new(0, 1));
        let (v, range) = r.read_u32().unwrap();
        assert_eq!(v, 1);
        assert_eq!(range, ByteRange::new(1, 5));
        assert!(r.is_empty());
    }

    #[test]
    fn unexpected_end_reports_offset_and_deficit() {
        let data = [0x01];
        let mut r = ByteReader::new(&data);
        let err = r.read_u32().unwrap_err();
        match err {
            chfx_core::Error::UnexpectedEnd {
                offset,
                requested,
                remaining,
                ..
            } => {
                assert_eq!(offset, 0);
                assert_eq!(requested, 4);
                assert_eq!(remaining, 1);
            }
            other => panic!("expected UnexpectedEnd, got {other:?}"),
        }
    }

    #[test]
    fn leb128_single_byte() {
        let data = [0x7F];
        let mut r = ByteReader::new(&data);
        let (v, range) = r.read_leb128().unwrap();
        assert_eq!(v, 127);
        assert_eq!(range, ByteRange::new(0, 1));
    }

    #[test]
    fn leb128_multi_byte() {
        // 300 = 0b1_0010_1100 -> low 7 bits 0b010_1100 with continuation,
        // then remaining bits 0b10.
        let data = [0xAC, 0x02];
        let mut r = ByteReader::new(&data);
        let (v, _) = r.read_leb128().unwrap();
        assert_eq!(v, 300);
    }

    #[test]
    fn leb128_truncated_is_unexpected_end() {
        let data = [0xFF];
        let mut r = ByteReader::new(&data);
        let err = r.read_leb128().unwrap_err();
        assert!(matches!(err, chfx_core::Error::UnexpectedEnd { .. }));
    }

    #[test]
    fn u256_round_trips_little_endian_bytes() {
        let mut data = [0u8; 32];
        data[0] = 0x2A;
        let mut r = ByteReader::new(&data);
        let (v, range) = r.read_u256().unwrap();
        assert_eq!(v, BigUint::from(0x2Au32));
        assert_eq!(range, ByteRange::new(0, 32));
    }

    #[test]
    fn bfloat16_reconstructs_exactly() {
        // BFloat16 representation of 1.0 is the top 16 bits of f32 1.0.
        let data = [0x80, 0x3F];
        let mut r = ByteReader::new(&data);
        let (v, _) = r.read_bfloat16().unwrap();
        assert_eq!(v, 1.0f32);
    }
}
