//! Scalar value decoding shared verbatim between the row-oriented and
//! column-oriented formats.
//!
//! Every non-container type in spec §4.4/§4.5 is encoded identically in
//! both formats — a row is just a column-oriented format with `rowCount ==
//! 1` for these leaves — so [`decode_scalar`] is the single place that
//! contract is implemented, and both `row.rs` and `column.rs` call it for
//! their respective leaf positions.

use chfx_core::{AstNode, ByteRange, IntWidth, NodeIdGen, PrimitiveType, Result, TypeDescriptor, Value};
use chfx_encoding::ByteReader;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use num_bigint::{BigInt, BigUint};
use num_traits::Pow;

/// Decodes one value of a non-container `TypeDescriptor`. Panics if given
/// a container variant (`Array`, `Tuple`, `Map`, `Nullable`,
/// `LowCardinality`, `Variant`, `Dynamic`, `JSON`, `Nested`, `QBit`,
/// `AggregateFunction`, or any geometry type) — those are always handled
/// by the format-specific recursive decoder before reaching here, so
/// reaching the fallback arm is an internal dispatch bug, not a malformed
/// input.
pub(crate) fn decode_scalar(reader: &mut ByteReader, ty: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let type_name = ty.to_string();
    match ty {
        TypeDescriptor::Primitive(PrimitiveType::UInt(width)) => {
            let (value, range, display) = decode_uint(reader, *width)?;
            Ok(AstNode::leaf(id, type_name, range, value, display))
        }
        TypeDescriptor::Primitive(PrimitiveType::Int(width)) => {
            let (value, range, display) = decode_int(reader, *width)?;
            Ok(AstNode::leaf(id, type_name, range, value, display))
        }
        TypeDescriptor::Primitive(PrimitiveType::Float32) => {
            let (v, range) = reader.read_f32()?;
            Ok(AstNode::leaf(id, type_name, range, Value::Float(v as f64), v.to_string()))
        }
        TypeDescriptor::Primitive(PrimitiveType::Float64) => {
            let (v, range) = reader.read_f64()?;
            Ok(AstNode::leaf(id, type_name, range, Value::Float(v), v.to_string()))
        }
        TypeDescriptor::Primitive(PrimitiveType::BFloat16) => {
            let (v, range) = reader.read_bfloat16()?;
            Ok(AstNode::leaf(id, type_name, range, Value::Float(v as f64), v.to_string()))
        }
        TypeDescriptor::Primitive(PrimitiveType::Bool) => {
            let (v, range) = reader.read_u8()?;
            let display = if v != 0 { "true" } else { "false" };
            Ok(AstNode::leaf(id, type_name, range, Value::Bool(v != 0), display))
        }
        TypeDescriptor::Primitive(PrimitiveType::String) => {
            let start = reader.position();
            let (len, _) = reader.read_leb128()?;
            let (bytes, _) = reader.read_bytes(len as usize)?;
            // Not validated as UTF-8 per spec §4.4; this decoder documents
            // a lossy choice rather than failing on binary payloads.
            let s = String::from_utf8_lossy(bytes).into_owned();
            let range = ByteRange::new(start, reader.position());
            Ok(AstNode::leaf(id, type_name, range, Value::Text(s.clone()), s))
        }
        TypeDescriptor::Primitive(PrimitiveType::Date) => {
            let (days, range) = reader.read_u16()?;
            let display = epoch_date(days as i64).format("%Y-%m-%d").to_string();
            Ok(AstNode::leaf(id, type_name, range, Value::UInt(days as u64), display))
        }
        TypeDescriptor::Primitive(PrimitiveType::Date32) => {
            let (days, range) = reader.read_i32()?;
            let display = epoch_date(days as i64).format("%Y-%m-%d").to_string();
            Ok(AstNode::leaf(id, type_name, range, Value::Int(days as i64), display))
        }
        TypeDescriptor::Primitive(PrimitiveType::Time) => {
            let (v, range) = reader.read_i32()?;
            Ok(AstNode::leaf(id, type_name, range, Value::Int(v as i64), v.to_string()))
        }
        TypeDescriptor::Primitive(PrimitiveType::Uuid) => {
            let (bytes, range) = reader.read_bytes(16)?;
            let s = format_uuid(bytes);
            Ok(AstNode::leaf(id, type_name, range, Value::Text(s.clone()), s))
        }
        TypeDescriptor::Primitive(PrimitiveType::IPv4) => {
            let (bytes, range) = reader.read_bytes(4)?;
            let s = format!("{}.{}.{}.{}", bytes[3], bytes[2], bytes[1], bytes[0]);
            Ok(AstNode::leaf(id, type_name, range, Value::Text(s.clone()), s))
        }
        TypeDescriptor::Primitive(PrimitiveType::IPv6) => {
            let (bytes, range) = reader.read_bytes(16)?;
            let s = bytes.chunks(2).map(|c| format!("{:02x}{:02x}", c[0], c[1])).collect::<Vec<_>>().join(":");
            Ok(AstNode::leaf(id, type_name, range, Value::Text(s.clone()), s))
        }
        TypeDescriptor::Primitive(PrimitiveType::Interval(_)) => {
            let (v, range) = reader.read_i64()?;
            let suffix = ty.canonical_name();
            let suffix = suffix.trim_start_matches("Interval").to_lowercase();
            let display = format!("{v} {suffix}");
            Ok(AstNode::leaf(id, type_name, range, Value::Int(v), display))
        }
        TypeDescriptor::FixedString { length } => {
            let (bytes, range) = reader.read_bytes(*length as usize)?;
            let actual_length = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            let display = String::from_utf8_lossy(&bytes[..actual_length]).into_owned();
            let node = AstNode::leaf(id, type_name, range, Value::Text(display.clone()), display)
                .with_metadata_entry("fixedLength", *length)
                .with_metadata_entry("actualLength", actual_length as u64);
            Ok(node)
        }
        TypeDescriptor::Primitive(PrimitiveType::Point) => {
            unreachable!("Point is a container type, decoded by the format-specific geometry decoder")
        }
        TypeDescriptor::DateTime { timezone } => {
            let (secs, range) = reader.read_u32()?;
            let display = DateTime::<Utc>::from_timestamp(secs as i64, 0)
                .unwrap_or(DateTime::<Utc>::from_timestamp(0, 0).unwrap())
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string();
            let mut node = AstNode::leaf(id, type_name, range, Value::UInt(secs as u64), display)
                .with_metadata_entry("secondsSinceEpoch", secs as u64);
            if let Some(tz) = timezone {
                node = node.with_metadata_entry("timezone", tz.clone());
            }
            Ok(node)
        }
        TypeDescriptor::DateTime64 { precision, timezone } => {
            let (ticks, range) = reader.read_i64()?;
            let pow = 10i64.checked_pow(u32::from(*precision)).unwrap_or(i64::MAX);
            let secs = ticks.div_euclid(pow);
            let rem = ticks.rem_euclid(pow);
            let base = DateTime::<Utc>::from_timestamp(secs, 0)
                .unwrap_or(DateTime::<Utc>::from_timestamp(0, 0).unwrap())
                .format("%Y-%m-%dT%H:%M:%S");
            let display = if *precision == 0 {
                format!("{base}Z")
            } else {
                format!("{base}.{:0width$}Z", rem, width = *precision as usize)
            };
            let mut node = AstNode::leaf(id, type_name, range, Value::Int(ticks), display)
                .with_metadata_entry("ticksSinceEpoch", ticks)
                .with_metadata_entry("precision", u64::from(*precision));
            if let Some(tz) = timezone {
                node = node.with_metadata_entry("timezone", tz.clone());
            }
            Ok(node)
        }
        TypeDescriptor::Time64 { precision } => {
            let (ticks, range) = reader.read_i64()?;
            let pow = 10i64.checked_pow(u32::from(*precision)).unwrap_or(i64::MAX);
            let secs = ticks.div_euclid(pow);
            let rem = ticks.rem_euclid(pow);
            let display = if *precision == 0 {
                secs.to_string()
            } else {
                format!("{secs}.{:0width$}", rem, width = *precision as usize)
            };
            let node = AstNode::leaf(id, type_name, range, Value::Int(ticks), display)
                .with_metadata_entry("ticksSinceEpoch", ticks)
                .with_metadata_entry("precision", u64::from(*precision));
            Ok(node)
        }
        TypeDescriptor::Decimal { width, scale, .. } => {
            let (raw, range) = read_signed_wide(reader, *width)?;
            let display = format_decimal(&raw, *scale);
            let node = AstNode::leaf(id, type_name, range, Value::BigInt(raw.clone()), display)
                .with_metadata_entry("scale", u64::from(*scale))
                .with_metadata_entry("rawValue", raw.to_string());
            Ok(node)
        }
        TypeDescriptor::Enum { width, values } => {
            let (code, range) = if *width == IntWidth::W8 {
                let (v, r) = reader.read_i8()?;
                (i32::from(v), r)
            } else {
                let (v, r) = reader.read_u16()?;
                (i32::from(v), r)
            };
            let label = values
                .iter()
                .find(|(c, _)| *c == code)
                .map(|(_, l)| l.clone())
                .unwrap_or_else(|| format!("<unknown:{code}>"));
            let node = AstNode::leaf(id, type_name, range, Value::Int(i64::from(code)), label.clone())
                .with_metadata_entry("enumValue", i64::from(code))
                .with_metadata_entry("enumName", label);
            Ok(node)
        }
        other => unreachable!("{other:?} is a container type, not a scalar"),
    }
}

/// Reads a `LEB128 len + UTF-8 bytes` field, used for column/type-string
/// names in both format headers. Lossy-decoded for the same reason as the
/// `String` scalar type.
pub(crate) fn read_len_prefixed_string(reader: &mut ByteReader) -> Result<(String, ByteRange)> {
    let start = reader.position();
    let (len, _) = reader.read_leb128()?;
    let (bytes, _) = reader.read_bytes(len as usize)?;
    let s = String::from_utf8_lossy(bytes).into_owned();
    Ok((s, ByteRange::new(start, reader.position())))
}

fn epoch_date(days: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + Duration::days(days)
}

fn decode_uint(reader: &mut ByteReader, width: IntWidth) -> Result<(Value, ByteRange, String)> {
    Ok(match width {
        IntWidth::W8 => {
            let (v, r) = reader.read_u8()?;
            (Value::UInt(u64::from(v)), r, v.to_string())
        }
        IntWidth::W16 => {
            let (v, r) = reader.read_u16()?;
            (Value::UInt(u64::from(v)), r, v.to_string())
        }
        IntWidth::W32 => {
            let (v, r) = reader.read_u32()?;
            (Value::UInt(u64::from(v)), r, v.to_string())
        }
        IntWidth::W64 => {
            let (v, r) = reader.read_u64()?;
            (Value::UInt(v), r, v.to_string())
        }
        IntWidth::W128 => {
            let (v, r) = reader.read_u128()?;
            (Value::BigUInt(BigUint::from(v)), r, v.to_string())
        }
        IntWidth::W256 => {
            let (v, r) = reader.read_u256()?;
            let s = v.to_string();
            (Value::BigUInt(v), r, s)
        }
    })
}

fn decode_int(reader: &mut ByteReader, width: IntWidth) -> Result<(Value, ByteRange, String)> {
    Ok(match width {
        IntWidth::W8 => {
            let (v, r) = reader.read_i8()?;
            (Value::Int(i64::from(v)), r, v.to_string())
        }
        IntWidth::W16 => {
            let (v, r) = reader.read_i16()?;
            (Value::Int(i64::from(v)), r, v.to_string())
        }
        IntWidth::W32 => {
            let (v, r) = reader.read_i32()?;
            (Value::Int(i64::from(v)), r, v.to_string())
        }
        IntWidth::W64 => {
            let (v, r) = reader.read_i64()?;
            (Value::Int(v), r, v.to_string())
        }
        IntWidth::W128 => {
            let (v, r) = reader.read_i128()?;
            (Value::BigInt(BigInt::from(v)), r, v.to_string())
        }
        IntWidth::W256 => {
            let (v, r) = reader.read_i256()?;
            let s = v.to_string();
            (Value::BigInt(v), r, s)
        }
    })
}

/// Reads the raw signed integer backing a `DecimalN` value, regardless of
/// width, as a [`BigInt`] — the uniform representation `format_decimal`
/// and the `rawValue` metadata both need.
fn read_signed_wide(reader: &mut ByteReader, width: IntWidth) -> Result<(BigInt, ByteRange)> {
    match width {
        IntWidth::W32 => {
            let (v, r) = reader.read_i32()?;
            Ok((BigInt::from(v), r))
        }
        IntWidth::W64 => {
            let (v, r) = reader.read_i64()?;
            Ok((BigInt::from(v), r))
        }
        IntWidth::W128 => {
            let (v, r) = reader.read_i128()?;
            Ok((BigInt::from(v), r))
        }
        IntWidth::W256 => reader.read_i256(),
        IntWidth::W8 | IntWidth::W16 => {
            unreachable!("Decimal is only ever built for widths 32/64/128/256")
        }
    }
}

/// Fixed-point rendering of a `DecimalN(precision, scale)` raw integer:
/// integer division/modulo on the raw value, never float (spec §9), with
/// the fractional part zero-padded to exactly `scale` digits.
pub(crate) fn format_decimal(raw: &BigInt, scale: u32) -> String {
    let sign = if raw.sign() == num_bigint::Sign::Minus { "-" } else { "" };
    let magnitude = raw.magnitude();
    if scale == 0 {
        return format!("{sign}{magnitude}");
    }
    let divisor = BigUint::from(10u32).pow(scale);
    let int_part = magnitude / &divisor;
    let frac_part = magnitude % &divisor;
    let frac_str = frac_part.to_str_radix(10);
    let padded = format!("{:0>width$}", frac_str, width = scale as usize);
    format!("{sign}{int_part}.{padded}")
}

/// Renders 16 UUID bytes per spec §4.4's byte-order rule: the first eight
/// hex pairs are bytes 7,6,5,4,3,2,1,0 and the last eight are
/// 15,14,13,12,11,10,9,8 — two independently little-endian 8-byte halves.
fn format_uuid(bytes: &[u8]) -> String {
    let mut buf = [0u8; 16];
    buf[0..8].copy_from_slice(&[bytes[7], bytes[6], bytes[5], bytes[4], bytes[3], bytes[2], bytes[1], bytes[0]]);
    buf[8..16].copy_from_slice(&[
        bytes[15], bytes[14], bytes[13], bytes[12], bytes[11], bytes[10], bytes[9], bytes[8],
    ]);
    uuid::Uuid::from_bytes(buf).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chfx_core::PrimitiveType;

    #[test]
    fn decodes_uint8() {
        let data = [0x2A];
        let mut r = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_scalar(&mut r, &TypeDescriptor::Primitive(PrimitiveType::UInt(IntWidth::W8)), &mut ids).unwrap();
        assert_eq!(node.value, Value::UInt(42));
        assert_eq!(node.display_value, "42");
    }

    #[test]
    fn fixed_string_trims_at_first_zero() {
        let data = *b"hi\0\0";
        let mut r = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_scalar(&mut r, &TypeDescriptor::FixedString { length: 4 }, &mut ids).unwrap();
        assert_eq!(node.display_value, "hi");
        assert_eq!(node.value, Value::Text("hi".into()));
    }

    #[test]
    fn decimal_display_uses_integer_math() {
        let raw = BigInt::from(12345);
        assert_eq!(format_decimal(&raw, 2), "123.45");
        assert_eq!(format_decimal(&BigInt::from(-500), 2), "-5.00");
        assert_eq!(format_decimal(&BigInt::from(7), 0), "7");
    }

    #[test]
    fn uuid_byte_order_matches_spec_scenario() {
        let bytes: [u8; 16] = [
            0xE7, 0x11, 0xB3, 0x5C, 0x04, 0xC4, 0xF0, 0x61, 0xA0, 0xDB, 0xD3, 0x6A, 0x00, 0xA6, 0x7B, 0x90,
        ];
        assert_eq!(format_uuid(&bytes), "61f0c404-5cb3-11e7-907b-a6006ad3dba0");
    }

    #[test]
    fn ipv4_display_is_reversed() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut r = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_scalar(&mut r, &TypeDescriptor::Primitive(PrimitiveType::IPv4), &mut ids).unwrap();
        assert_eq!(node.display_value, "4.3.2.1");
    }
}
