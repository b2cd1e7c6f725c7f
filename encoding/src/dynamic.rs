//! `DynamicTypeDecoder`: decodes the one-byte binary type index (spec §6)
//! into a [`TypeDescriptor`], consuming whatever parameter bytes that index
//! requires. Shared by `Dynamic` value decoding and `JSON` dynamic-path
//! decoding in `chfx-parser`, since both carry their type inline rather
//! than from the header.

use chfx_core::error::{InvalidUtf8Snafu, NothingAsSubTypeSnafu, UnknownBinaryTypeIndexSnafu};
use chfx_core::{ByteRange, IntWidth, PrimitiveType, Result, TypeDescriptor};
use snafu::ResultExt;

use crate::reader::ByteReader;

/// Decodes a type index that is required to name a concrete type: used
/// everywhere a `0x00` ("Nothing") index is a decode error — array
/// elements, `Nullable` inners, tuple elements, map keys/values, variant
/// alternatives (spec §4.3).
///
/// `context` names the position for the resulting
/// [`chfx_core::Error::NothingAsSubType`] message, e.g. `"array element"`.
pub fn decode_subtype(reader: &mut ByteReader, context: &'static str) -> Result<(TypeDescriptor, ByteRange)> {
    let start = reader.position();
    let (index, _) = reader.read_u8()?;
    if index == 0x00 {
        return NothingAsSubTypeSnafu { context, offset: start }.fail();
    }
    let descriptor = decode_body(reader, index, start)?;
    Ok((descriptor, ByteRange::new(start, reader.position())))
}

/// Decodes a type index at a position where `0x00` ("Nothing") is a
/// meaningful, non-error outcome: the top of a `Dynamic` value, where it
/// signals that the value itself is `NULL` with no payload bytes.
///
/// Returns `None` for `Nothing`, `Some(descriptor)` otherwise, alongside
/// the byte range the type definition itself occupied.
pub fn decode_top_level(reader: &mut ByteReader) -> Result<(Option<TypeDescriptor>, ByteRange)> {
    let start = reader.position();
    let (index, _) = reader.read_u8()?;
    if index == 0x00 {
        return Ok((None, ByteRange::new(start, reader.position())));
    }
    let descriptor = decode_body(reader, index, start)?;
    Ok((Some(descriptor), ByteRange::new(start, reader.position())))
}

fn read_leb128_string(reader: &mut ByteReader) -> Result<String> {
    let (len, _) = reader.read_leb128()?;
    let (bytes, range) = reader.read_bytes(len as usize)?;
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .context(InvalidUtf8Snafu { offset: range.start })
}

fn decode_body(reader: &mut ByteReader, index: u8, start: usize) -> Result<TypeDescriptor> {
    use IntWidth::*;
    use PrimitiveType::*;

    Ok(match index {
        0x01 => TypeDescriptor::Primitive(UInt(W8)),
        0x02 => TypeDescriptor::Primitive(UInt(W16)),
        0x03 => TypeDescriptor::Primitive(UInt(W32)),
        0x04 => TypeDescriptor::Primitive(UInt(W64)),
        0x05 => TypeDescriptor::Primitive(UInt(W128)),
        0x06 => TypeDescriptor::Primitive(UInt(W256)),
        0x07 => TypeDescriptor::Primitive(Int(W8)),
        0x08 => TypeDescriptor::Primitive(Int(W16)),
        0x09 => TypeDescriptor::Primitive(Int(W32)),
        0x0A => TypeDescriptor::Primitive(Int(W64)),
        0x0B => TypeDescriptor::Primitive(Int(W128)),
        0x0C => TypeDescriptor::Primitive(Int(W256)),
        0x0D => TypeDescriptor::Primitive(Float32),
        0x0E => TypeDescriptor::Primitive(Float64),
        0x0F => TypeDescriptor::Primitive(Date),
        0x10 => TypeDescriptor::Primitive(Date32),
        0x11 => TypeDescriptor::DateTime { timezone: None },
        0x12 => TypeDescriptor::DateTime {
            timezone: Some(read_leb128_string(reader)?),
        },
        0x13 => {
            let (precision, _) = reader.read_u8()?;
            TypeDescriptor::DateTime64 {
                precision,
                timezone: None,
            }
        }
        0x14 => {
            let (precision, _) = reader.read_u8()?;
            let timezone = Some(read_leb128_string(reader)?);
            TypeDescriptor::DateTime64 { precision, timezone }
        }
        0x15 => TypeDescriptor::Primitive(PrimitiveType::String),
        0x16 => {
            let (length, _) = reader.read_leb128()?;
            TypeDescriptor::FixedString { length }
        }
        0x17 => decode_enum(reader, IntWidth::W8)?,
        0x18 => decode_enum(reader, IntWidth::W16)?,
        0x19 => decode_decimal(reader, IntWidth::W32)?,
        0x1A => decode_decimal(reader, IntWidth::W64)?,
        0x1B => decode_decimal(reader, IntWidth::W128)?,
        0x1C => decode_decimal(reader, IntWidth::W256)?,
        0x1D => TypeDescriptor::Primitive(Uuid),
        0x1E => {
            let (element, _) = decode_subtype(reader, "array element")?;
            TypeDescriptor::Array {
                element: Box::new(element),
            }
        }
        0x1F => {
            let (count, _) = reader.read_leb128()?;
            let mut elements = Vec::with_capacity(count as usize);
            for _ in 0..count {
                elements.push(decode_subtype(reader, "tuple element")?.0);
            }
            TypeDescriptor::Tuple { elements, names: None }
        }
        0x20 => {
            let (count, _) = reader.read_leb128()?;
            let mut elements = Vec::with_capacity(count as usize);
            let mut names = Vec::with_capacity(count as usize);
            for _ in 0..count {
                names.push(read_leb128_string(reader)?);
                elements.push(decode_subtype(reader, "tuple element")?.0);
            }
            TypeDescriptor::Tuple {
                elements,
                names: Some(names),
            }
        }
        0x23 => {
            let (inner, _) = decode_subtype(reader, "nullable inner")?;
            TypeDescriptor::Nullable { inner: Box::new(inner) }
        }
        0x26 => {
            let (inner, _) = decode_subtype(reader, "low cardinality inner")?;
            TypeDescriptor::LowCardinality { inner: Box::new(inner) }
        }
        0x27 => {
            let (key, _) = decode_subtype(reader, "map key")?;
            let (value, _) = decode_subtype(reader, "map value")?;
            TypeDescriptor::Map {
                key: Box::new(key),
                value: Box::new(value),
            }
        }
        0x28 => TypeDescriptor::Primitive(IPv4),
        0x29 => TypeDescriptor::Primitive(IPv6),
        0x2A => {
            let (count, _) = reader.read_leb128()?;
            let mut variants = Vec::with_capacity(count as usize);
            for _ in 0..count {
                variants.push(decode_subtype(reader, "variant alternative")?.0);
            }
            TypeDescriptor::normalize_variant_order(&mut variants);
            TypeDescriptor::Variant { variants }
        }
        0x2B => {
            let (max_types, _) = reader.read_leb128()?;
            TypeDescriptor::Dynamic {
                max_types: (max_types != 0).then_some(max_types),
            }
        }
        0x2D => TypeDescriptor::Primitive(Bool),
        0x30 => decode_json(reader)?,
        0x31 => TypeDescriptor::Primitive(BFloat16),
        0x32 => TypeDescriptor::Primitive(Time),
        0x34 => {
            let (precision, _) = reader.read_u8()?;
            TypeDescriptor::Time64 { precision }
        }
        _ => {
            return UnknownBinaryTypeIndexSnafu { index, offset: start }.fail();
        }
    })
}

fn decode_enum(reader: &mut ByteReader, width: IntWidth) -> Result<TypeDescriptor> {
    let (count, _) = reader.read_leb128()?;
    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = read_leb128_string(reader)?;
        let code = if width == IntWidth::W8 {
            reader.read_i8()?.0 as i32
        } else {
            reader.read_i16()?.0 as i32
        };
        values.push((code, name));
    }
    Ok(TypeDescriptor::Enum { width, values })
}

fn decode_decimal(reader: &mut ByteReader, width: IntWidth) -> Result<TypeDescriptor> {
    let (precision, _) = reader.read_leb128()?;
    let (scale, _) = reader.read_leb128()?;
    Ok(TypeDescriptor::Decimal {
        width,
        precision: precision as u32,
        scale: scale as u32,
    })
}

/// `JSON`'s binary type index (`0x30`, spec §4.3): a serialization version
/// byte and `max_dynamic_types` are consumed only to advance the cursor —
/// neither has a field on [`TypeDescriptor::Json`] — as are the skip-path
/// and skip-regexp name lists, which exist on the wire purely as metadata
/// for the source server's own dynamic-path discovery and carry no
/// decodable value here.
fn decode_json(reader: &mut ByteReader) -> Result<TypeDescriptor> {
    let _serialization_version = reader.read_u8()?;
    let (max_dynamic_paths, _) = reader.read_leb128()?;
    let _max_dynamic_types = reader.read_u8()?;

    let (typed_path_count, _) = reader.read_leb128()?;
    let mut typed_paths = Vec::with_capacity(typed_path_count as usize);
    for _ in 0..typed_path_count {
        let path = read_leb128_string(reader)?;
        let (ty, _) = decode_subtype(reader, "JSON typed path")?;
        typed_paths.push((path, ty));
    }

    let (skip_path_count, _) = reader.read_leb128()?;
    for _ in 0..skip_path_count {
        read_leb128_string(reader)?;
    }

    let (skip_regexp_count, _) = reader.read_leb128()?;
    for _ in 0..skip_regexp_count {
        read_leb128_string(reader)?;
    }

    Ok(TypeDescriptor::Json {
        typed_paths,
        max_dynamic_paths: Some(max_dynamic_paths),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_uint8_index() {
        let data = [0x01];
        let mut r = ByteReader::new(&data);
        let (ty, range) = decode_top_level(&mut r).unwrap();
        assert_eq!(ty, Some(TypeDescriptor::Primitive(PrimitiveType::UInt(IntWidth::W8))));
        assert_eq!(range, ByteRange::new(0, 1));
    }

    #[test]
    fn nothing_at_top_level_is_none() {
        let data = [0x00];
        let mut r = ByteReader::new(&data);
        let (ty, _) = decode_top_level(&mut r).unwrap();
        assert_eq!(ty, None);
    }

    #[test]
    fn nothing_as_subtype_is_an_error() {
        let data = [0x00];
        let mut r = ByteReader::new(&data);
        let err = decode_subtype(&mut r, "array element").unwrap_err();
        match err {
            chfx_core::Error::NothingAsSubType { context, .. } => assert_eq!(context, "array element"),
            other => panic!("expected NothingAsSubType, got {other:?}"),
        }
    }

    #[test]
    fn unknown_index_fails() {
        let data = [0xFE];
        let mut r = ByteReader::new(&data);
        let err = decode_top_level(&mut r).unwrap_err();
        match err {
            chfx_core::Error::UnknownBinaryTypeIndex { index, offset } => {
                assert_eq!(index, 0xFE);
                assert_eq!(offset, 0);
            }
            other => panic!("expected UnknownBinaryTypeIndex, got {other:?}"),
        }
    }

    #[test]
    fn decodes_nested_array_of_nullable() {
        // Array(Nullable(UInt8)): 0x1E, 0x23, 0x01
        let data = [0x1E, 0x23, 0x01];
        let mut r = ByteReader::new(&data);
        let (ty, range) = decode_top_level(&mut r).unwrap();
        assert_eq!(
            ty,
            Some(TypeDescriptor::Array {
                element: Box::new(TypeDescriptor::Nullable {
                    inner: Box::new(TypeDescriptor::Primitive(PrimitiveType::UInt(IntWidth::W8))),
                }),
            })
        );
        assert_eq!(range, ByteRange::new(0, 3));
    }

    #[test]
    fn decodes_variant_with_normalized_order() {
        // Variant(UInt64, String): 0x2A, count=2, 0x04 (UInt64), 0x15 (String)
        let data = [0x2A, 0x02, 0x04, 0x15];
        let mut r = ByteReader::new(&data);
        let (ty, _) = decode_top_level(&mut r).unwrap();
        match ty.unwrap() {
            TypeDescriptor::Variant { variants } => {
                // "String" < "UInt64" lexicographically.
                assert_eq!(variants[0], TypeDescriptor::Primitive(PrimitiveType::String));
            }
            other => panic!("expected Variant, got {other:?}"),
        }
    }
}
