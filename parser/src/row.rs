//! `RowDecoder`: the row-oriented format (spec §4.4) — a shared header
//! followed by rows until EOF, each row a full value per column in
//! declaration order.

use chfx_core::error::{DiscriminantKind, InvalidDiscriminantSnafu, UnsupportedAggregateSnafu};
use chfx_core::{
    AstNode, ByteRange, ColumnHeaderEntry, Header, NodeIdGen, ParsedData, PrimitiveType, Result, TypeDescriptor, Value,
};
use chfx_encoding::ByteReader;
use num_traits::ToPrimitive;

use crate::value::{self, decode_scalar};

/// Decodes a complete row-oriented buffer: header, then rows until the
/// input is exhausted.
pub fn decode_row_binary(bytes: &[u8]) -> Result<ParsedData> {
    let mut reader = ByteReader::new(bytes);
    let mut ids = NodeIdGen::new();
    let header = read_header(&mut reader)?;
    tracing::debug!(columns = header.entries.len(), total_bytes = bytes.len(), "decoding row-oriented buffer");

    let mut rows = Vec::new();
    while !reader.is_empty() {
        let row_id = ids.next();
        let mut children = Vec::with_capacity(header.entries.len());
        for entry in &header.entries {
            let node = decode_value(&mut reader, &entry.type_descriptor, &mut ids)?.with_label(entry.name.clone());
            children.push(node);
        }
        rows.push(AstNode::container(row_id, "Row", "", children));
    }

    Ok(ParsedData::from_rows(header, bytes.len(), rows))
}

fn read_header(reader: &mut ByteReader) -> Result<Header> {
    let header_start = reader.position();
    let (count, _) = reader.read_leb128()?;

    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        names.push(value::read_len_prefixed_string(reader)?);
    }

    let mut entries = Vec::with_capacity(count as usize);
    for (name, name_range) in names {
        let (type_string, type_range) = value::read_len_prefixed_string(reader)?;
        let type_descriptor = chfx_encoding::parse_type(&type_string)?;
        entries.push(ColumnHeaderEntry {
            name,
            name_range,
            type_string,
            type_range,
            type_descriptor,
        });
    }

    Ok(Header {
        entries,
        byte_range: ByteRange::new(header_start, reader.position()),
    })
}

/// Decodes one value of `ty` from `reader`'s current position, per the
/// row-oriented encoding table in spec §4.4. Container types recurse
/// here; leaves delegate to [`decode_scalar`].
///
/// `pub(crate)` rather than private: `column.rs` reuses this directly for
/// the handful of types spec §4.5 never re-specifies a contiguous layout
/// for (`Nested`, `QBit`, `AggregateFunction`, the geometry family) — for
/// those, the column format is just this same per-value encoding applied
/// `rowCount` times in a row.
pub(crate) fn decode_value(reader: &mut ByteReader, ty: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    match ty {
        TypeDescriptor::Array { element } => decode_array(reader, ty, element, ids),
        TypeDescriptor::Tuple { elements, names } => decode_tuple(reader, ty, elements, names, ids),
        TypeDescriptor::Map { key, value } => decode_map(reader, ty, key, value, ids),
        TypeDescriptor::Nullable { inner } => decode_nullable(reader, ty, inner, ids),
        TypeDescriptor::LowCardinality { inner } => {
            let mut node = decode_value(reader, inner, ids)?;
            node.type_name = ty.to_string();
            Ok(node)
        }
        TypeDescriptor::Variant { variants } => decode_variant(reader, ty, variants, ids),
        TypeDescriptor::Dynamic { .. } => decode_dynamic(reader, ty, ids),
        TypeDescriptor::Json { typed_paths, .. } => decode_json(reader, ty, typed_paths, ids),
        TypeDescriptor::Nested { fields } => decode_nested(reader, ty, fields, ids),
        TypeDescriptor::QBit { element, dimension } => decode_qbit(reader, ty, element, *dimension, ids),
        TypeDescriptor::AggregateFunction {
            function_name,
            arg_types,
        } => decode_aggregate(reader, ty, function_name, arg_types, ids),
        TypeDescriptor::Primitive(PrimitiveType::Point) => decode_point(reader, ty, ids),
        TypeDescriptor::Primitive(PrimitiveType::Ring) => decode_array_of(reader, ty, PrimitiveType::Point, ids),
        TypeDescriptor::Primitive(PrimitiveType::LineString) => decode_array_of(reader, ty, PrimitiveType::Point, ids),
        TypeDescriptor::Primitive(PrimitiveType::Polygon) => decode_array_of(reader, ty, PrimitiveType::Ring, ids),
        TypeDescriptor::Primitive(PrimitiveType::MultiPolygon) => {
            decode_array_of(reader, ty, PrimitiveType::Polygon, ids)
        }
        TypeDescriptor::Primitive(PrimitiveType::MultiLineString) => {
            decode_array_of(reader, ty, PrimitiveType::LineString, ids)
        }
        TypeDescriptor::Primitive(PrimitiveType::Geometry) => decode_geometry(reader, ty, ids),
        _ => decode_scalar(reader, ty, ids),
    }
}

fn decode_array(reader: &mut ByteReader, ty: &TypeDescriptor, element: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let (count, len_range) = reader.read_leb128()?;
    let length_node = AstNode::leaf(ids.next(), "UInt64", len_range, Value::UInt(count), count.to_string()).with_label("length");
    let mut children = vec![length_node];
    for i in 0..count {
        children.push(decode_value(reader, element, ids)?.with_label(format!("[{i}]")));
    }
    Ok(AstNode::container(id, ty.to_string(), format!("[{count} items]"), children))
}

/// `Ring`/`LineString`/`Polygon`/`MultiPolygon`/`MultiLineString` are all
/// `Array(element)` in disguise (spec §4.4); this decodes the array and
/// relabels it with the geometry alias's own type name.
fn decode_array_of(reader: &mut ByteReader, ty: &TypeDescriptor, element: PrimitiveType, ids: &mut NodeIdGen) -> Result<AstNode> {
    let array_ty = TypeDescriptor::Array {
        element: Box::new(TypeDescriptor::Primitive(element)),
    };
    let mut node = decode_value(reader, &array_ty, ids)?;
    node.type_name = ty.to_string();
    Ok(node)
}

fn decode_tuple(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    elements: &[TypeDescriptor],
    names: &Option<Vec<String>>,
    ids: &mut NodeIdGen,
) -> Result<AstNode> {
    let id = ids.next();
    let mut children = Vec::with_capacity(elements.len());
    for (i, elem_ty) in elements.iter().enumerate() {
        let label = match names {
            Some(ns) if !ns[i].is_empty() => ns[i].clone(),
            _ => format!("[{i}]"),
        };
        children.push(decode_value(reader, elem_ty, ids)?.with_label(label));
    }
    Ok(AstNode::container(id, ty.to_string(), "(...)", children))
}

fn decode_map(reader: &mut ByteReader, ty: &TypeDescriptor, key: &TypeDescriptor, value: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let (count, len_range) = reader.read_leb128()?;
    let length_node = AstNode::leaf(ids.next(), "UInt64", len_range, Value::UInt(count), count.to_string()).with_label("length");
    let mut children = vec![length_node];
    for i in 0..count {
        let pair_id = ids.next();
        let key_node = decode_value(reader, key, ids)?.with_label("key");
        let value_node = decode_value(reader, value, ids)?.with_label("value");
        let pair = AstNode::container(pair_id, format!("({key}, {value})"), "", vec![key_node, value_node]).with_label(format!("[{i}]"));
        children.push(pair);
    }
    Ok(AstNode::container(id, ty.to_string(), format!("{{{count} pairs}}"), children))
}

fn decode_nullable(reader: &mut ByteReader, ty: &TypeDescriptor, inner: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let flag_start = reader.position();
    let (is_null, _) = reader.read_u8()?;
    if is_null != 0 {
        let range = ByteRange::new(flag_start, reader.position());
        return Ok(AstNode::leaf(id, ty.to_string(), range, Value::Null, "NULL"));
    }
    let inner_node = decode_value(reader, inner, ids)?;
    let range = ByteRange::new(flag_start, inner_node.byte_range.end);
    Ok(AstNode {
        id,
        type_name: ty.to_string(),
        byte_range: range,
        value: inner_node.value.clone(),
        display_value: inner_node.display_value.clone(),
        children: vec![inner_node],
        label: None,
        metadata: None,
    })
}

fn decode_variant(reader: &mut ByteReader, ty: &TypeDescriptor, variants: &[TypeDescriptor], ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let disc_start = reader.position();
    let (disc, _) = reader.read_u8()?;
    if disc == 0xFF {
        let range = ByteRange::new(disc_start, reader.position());
        return Ok(AstNode::leaf(id, ty.to_string(), range, Value::Null, "NULL").with_metadata_entry("discriminant", 0xFFu64));
    }
    if disc as usize >= variants.len() {
        return InvalidDiscriminantSnafu {
            kind: DiscriminantKind::Variant,
            value: u32::from(disc),
            bound: variants.len() as u32,
            offset: disc_start,
        }
        .fail();
    }
    let selected = &variants[disc as usize];
    let value_node = decode_value(reader, selected, ids)?;
    let range = ByteRange::new(disc_start, value_node.byte_range.end);
    Ok(AstNode {
        id,
        type_name: ty.to_string(),
        byte_range: range,
        value: value_node.value.clone(),
        display_value: value_node.display_value.clone(),
        children: vec![value_node],
        label: None,
        metadata: None,
    }
    .with_metadata_entry("discriminant", u64::from(disc))
    .with_metadata_entry("selectedType", selected.to_string()))
}

fn decode_dynamic(reader: &mut ByteReader, ty: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let type_def_start = reader.position();
    let (maybe_ty, type_def_range) = chfx_encoding::decode_top_level(reader)?;
    let index_byte = reader.full_data()[type_def_start];

    match maybe_ty {
        None => {
            let type_leaf = AstNode::leaf(ids.next(), "Nothing", type_def_range, Value::Text("Nothing".into()), "Nothing").with_label("type");
            Ok(AstNode {
                id,
                type_name: ty.to_string(),
                byte_range: type_def_range,
                value: Value::Null,
                display_value: "NULL".to_string(),
                children: vec![type_leaf],
                label: None,
                metadata: None,
            }
            .with_metadata_entry("typeIndex", u64::from(index_byte))
            .with_metadata_entry("decodedType", "Nothing"))
        }
        Some(inner_ty) => {
            let type_leaf = AstNode::leaf(ids.next(), inner_ty.to_string(), type_def_range, Value::Text(inner_ty.to_string()), inner_ty.to_string())
                .with_label("type");
            let value_node = decode_value(reader, &inner_ty, ids)?.with_label("value");
            let range = ByteRange::new(type_def_start, value_node.byte_range.end);
            Ok(AstNode {
                id,
                type_name: ty.to_string(),
                byte_range: range,
                value: value_node.value.clone(),
                display_value: value_node.display_value.clone(),
                children: vec![type_leaf, value_node],
                label: None,
                metadata: None,
            }
            .with_metadata_entry("typeIndex", u64::from(index_byte))
            .with_metadata_entry("decodedType", inner_ty.to_string()))
        }
    }
}

fn decode_json(reader: &mut ByteReader, ty: &TypeDescriptor, typed_paths: &[(String, TypeDescriptor)], ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let (count, len_range) = reader.read_leb128()?;
    let length_node = AstNode::leaf(ids.next(), "UInt64", len_range, Value::UInt(count), count.to_string()).with_label("length");
    let mut children = vec![length_node];
    for _ in 0..count {
        let entry_id = ids.next();
        let (path, path_range) = value::read_len_prefixed_string(reader)?;
        let path_leaf = AstNode::leaf(ids.next(), "String", path_range, Value::Text(path.clone()), path.clone()).with_label("path");
        let declared = typed_paths.iter().find(|(p, _)| p == &path).map(|(_, t)| t.clone());
        let value_node = match declared {
            Some(t) => decode_value(reader, &t, ids)?,
            None => decode_value(reader, &TypeDescriptor::Dynamic { max_types: None }, ids)?,
        }
        .with_label("value");
        let entry = AstNode::container(entry_id, value_node.type_name.clone(), value_node.display_value.clone(), vec![path_leaf, value_node])
            .with_label(path);
        children.push(entry);
    }
    Ok(AstNode::container(id, ty.to_string(), format!("{{{count} paths}}"), children))
}

fn decode_nested(reader: &mut ByteReader, ty: &TypeDescriptor, fields: &[(String, TypeDescriptor)], ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let mut children = Vec::with_capacity(fields.len());
    for (name, field_ty) in fields {
        let array_ty = TypeDescriptor::Array {
            element: Box::new(field_ty.clone()),
        };
        children.push(decode_value(reader, &array_ty, ids)?.with_label(name.clone()));
    }
    Ok(AstNode::container(id, ty.to_string(), "(...)", children))
}

fn decode_qbit(reader: &mut ByteReader, ty: &TypeDescriptor, element: &TypeDescriptor, dimension: u64, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let (size, len_range) = reader.read_leb128()?;
    let length_node = AstNode::leaf(ids.next(), "UInt64", len_range, Value::UInt(size), size.to_string()).with_label("length");
    let mut children = vec![length_node];
    for i in 0..size {
        children.push(decode_value(reader, element, ids)?.with_label(format!("[{i}]")));
    }
    Ok(AstNode::container(id, ty.to_string(), format!("{size} elements"), children)
        .with_metadata_entry("dimension", dimension)
        .with_metadata_entry("elementType", element.to_string())
        .with_metadata_entry("size", size))
}

fn value_as_f64(value: &Value) -> f64 {
    match value {
        Value::UInt(v) => *v as f64,
        Value::Int(v) => *v as f64,
        Value::BigUInt(v) => v.to_f64().unwrap_or(0.0),
        Value::BigInt(v) => v.to_f64().unwrap_or(0.0),
        Value::Float(v) => *v,
        _ => 0.0,
    }
}

fn decode_aggregate(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    function_name: &str,
    arg_types: &[TypeDescriptor],
    ids: &mut NodeIdGen,
) -> Result<AstNode> {
    let id = ids.next();
    let arg_types_joined = arg_types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    match function_name {
        "avg" => {
            let Some(t) = arg_types.first() else {
                return UnsupportedAggregateSnafu {
                    name: function_name.to_string(),
                }
                .fail();
            };
            let sum_node = decode_value(reader, t, ids)?.with_label("numerator (sum)");
            let (count, count_range) = reader.read_leb128()?;
            let count_node = AstNode::leaf(ids.next(), "UInt64", count_range, Value::UInt(count), count.to_string()).with_label("denominator (count)");
            let avg = value_as_f64(&sum_node.value) / count as f64;
            let display = format!("avg={avg:.2}");
            Ok(AstNode::container(id, ty.to_string(), display, vec![sum_node, count_node])
                .with_metadata_entry("functionName", function_name.to_string())
                .with_metadata_entry("argTypes", arg_types_joined))
        }
        "sum" => {
            let Some(t) = arg_types.first() else {
                return UnsupportedAggregateSnafu {
                    name: function_name.to_string(),
                }
                .fail();
            };
            let sum_node = decode_value(reader, t, ids)?.with_label("sum");
            let range = sum_node.byte_range;
            Ok(AstNode {
                id,
                type_name: ty.to_string(),
                byte_range: range,
                value: sum_node.value.clone(),
                display_value: sum_node.display_value.clone(),
                children: vec![sum_node],
                label: None,
                metadata: None,
            }
            .with_metadata_entry("functionName", function_name.to_string())
            .with_metadata_entry("argTypes", arg_types_joined))
        }
        "count" => {
            let (count, range) = reader.read_leb128()?;
            let count_node = AstNode::leaf(ids.next(), "UInt64", range, Value::UInt(count), count.to_string()).with_label("count");
            Ok(AstNode {
                id,
                type_name: ty.to_string(),
                byte_range: range,
                value: Value::UInt(count),
                display_value: count.to_string(),
                children: vec![count_node],
                label: None,
                metadata: None,
            }
            .with_metadata_entry("functionName", function_name.to_string())
            .with_metadata_entry("argTypes", arg_types_joined))
        }
        other => UnsupportedAggregateSnafu { name: other.to_string() }.fail(),
    }
}

fn decode_point(reader: &mut ByteReader, ty: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let (x, rx) = reader.read_f64()?;
    let (y, ry) = reader.read_f64()?;
    let x_node = AstNode::leaf(ids.next(), "Float64", rx, Value::Float(x), x.to_string()).with_label("x");
    let y_node = AstNode::leaf(ids.next(), "Float64", ry, Value::Float(y), y.to_string()).with_label("y");
    Ok(AstNode::container(id, ty.to_string(), format!("({x}, {y})"), vec![x_node, y_node]))
}

fn decode_geometry(reader: &mut ByteReader, ty: &TypeDescriptor, ids: &mut NodeIdGen) -> Result<AstNode> {
    let id = ids.next();
    let disc_start = reader.position();
    let (disc, _) = reader.read_u8()?;
    let geo_ty = match disc {
        0 => PrimitiveType::LineString,
        1 => PrimitiveType::MultiLineString,
        2 => PrimitiveType::MultiPolygon,
        3 => PrimitiveType::Point,
        4 => PrimitiveType::Polygon,
        5 => PrimitiveType::Ring,
        other => {
            return InvalidDiscriminantSnafu {
                kind: DiscriminantKind::Geometry,
                value: u32::from(other),
                bound: 6,
                offset: disc_start,
            }
            .fail()
        }
    };
    let payload = decode_value(reader, &TypeDescriptor::Primitive(geo_ty), ids)?;
    let range = ByteRange::new(disc_start, payload.byte_range.end);
    Ok(AstNode {
        id,
        type_name: ty.to_string(),
        byte_range: range,
        value: payload.value.clone(),
        display_value: payload.display_value.clone(),
        children: vec![payload],
        label: None,
        metadata: None,
    }
    .with_metadata_entry("discriminant", u64::from(disc))
    .with_metadata_entry("geoType", geo_ty.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
    }

    #[test]
    fn single_uint8_column_scenario() {
        // Header: 1 column "val": UInt8, then body 0x2A.
        let mut bytes = hex("01" /* N=1 */);
        bytes.extend(hex("03" /* name len */));
        bytes.extend(b"val");
        bytes.extend(hex("05" /* type len */));
        bytes.extend(b"UInt8");
        bytes.push(0x2A);

        let data = decode_row_binary(&bytes).unwrap();
        assert_eq!(data.total_bytes, bytes.len());
        assert_eq!(data.header.entries.len(), 1);
        let rows = data.rows.unwrap();
        assert_eq!(rows.len(), 1);
        let value_node = &rows[0].children[0];
        assert_eq!(value_node.value, Value::UInt(42));
        assert_eq!(value_node.byte_range, ByteRange::new(bytes.len() - 1, bytes.len()));
    }

    #[test]
    fn nullable_present_and_null() {
        let ty = chfx_encoding::parse_type("Nullable(UInt32)").unwrap();
        let present = [0x00u8, 0x2A, 0x00, 0x00, 0x00];
        let mut reader = ByteReader::new(&present);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.value, Value::UInt(42));
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.byte_range, ByteRange::new(0, 5));

        let null = [0x01u8];
        let mut reader = ByteReader::new(&null);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.value, Value::Null);
        assert!(node.children.is_empty());
        assert_eq!(node.byte_range, ByteRange::new(0, 1));
    }

    #[test]
    fn array_of_uint32_scenario() {
        let ty = chfx_encoding::parse_type("Array(UInt32)").unwrap();
        let data = hex("03010000000200000003000000");
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.children.len(), 4); // length + 3 elements
        assert_eq!(node.children[0].label.as_deref(), Some("length"));
        assert_eq!(node.children[1].value, Value::UInt(1));
        assert_eq!(node.children[3].value, Value::UInt(3));
    }

    #[test]
    fn dynamic_uint8_scenario() {
        let ty = TypeDescriptor::Dynamic { max_types: None };
        let data = [0x01u8, 0x2A];
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.value, Value::UInt(42));
        let decoded_type = node.metadata.as_ref().unwrap().iter().find(|(k, _)| k == "decodedType").unwrap();
        assert!(matches!(&decoded_type.1, chfx_core::MetadataValue::Text(s) if s == "UInt8"));
    }

    #[test]
    fn variant_discriminant_out_of_range_fails() {
        let ty = chfx_encoding::parse_type("Variant(String, UInt64)").unwrap();
        let data = [0x05u8]; // only 2 alternatives, not 0xFF
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let err = decode_value(&mut reader, &ty, &mut ids).unwrap_err();
        assert!(matches!(err, chfx_core::Error::InvalidDiscriminant { .. }));
    }

    #[test]
    fn avg_aggregate_scenario() {
        let ty = chfx_encoding::parse_type("AggregateFunction(avg, UInt64)").unwrap();
        // sum = 45 (0..9), count = 10, both as UInt64/LEB128.
        let mut data = 45u64.to_le_bytes().to_vec();
        data.push(10); // LEB128 10 fits in one byte
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].label.as_deref(), Some("numerator (sum)"));
        assert_eq!(node.children[0].value, Value::UInt(45));
        assert_eq!(node.children[1].label.as_deref(), Some("denominator (count)"));
        assert_eq!(node.children[1].value, Value::UInt(10));
        assert!(node.display_value.contains("avg=4.50"));
        let metadata = node.metadata.as_ref().unwrap();
        let function_name = metadata.iter().find(|(k, _)| k == "functionName").unwrap();
        assert!(matches!(&function_name.1, chfx_core::MetadataValue::Text(s) if s == "avg"));
        let arg_types = metadata.iter().find(|(k, _)| k == "argTypes").unwrap();
        assert!(matches!(&arg_types.1, chfx_core::MetadataValue::Text(s) if s == "UInt64"));
    }

    #[test]
    fn sum_aggregate_scenario() {
        let ty = chfx_encoding::parse_type("AggregateFunction(sum, UInt64)").unwrap();
        let data = 99u64.to_le_bytes();
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.value, Value::UInt(99));
        assert_eq!(node.display_value, "99");
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].label.as_deref(), Some("sum"));
        assert_eq!(node.byte_range, ByteRange::new(0, 8));
        let metadata = node.metadata.as_ref().unwrap();
        let function_name = metadata.iter().find(|(k, _)| k == "functionName").unwrap();
        assert!(matches!(&function_name.1, chfx_core::MetadataValue::Text(s) if s == "sum"));
        let arg_types = metadata.iter().find(|(k, _)| k == "argTypes").unwrap();
        assert!(matches!(&arg_types.1, chfx_core::MetadataValue::Text(s) if s == "UInt64"));
    }

    #[test]
    fn count_aggregate_scenario() {
        let ty = chfx_encoding::parse_type("AggregateFunction(count)").unwrap();
        let data = [7u8]; // LEB128 7 fits in one byte
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.value, Value::UInt(7));
        assert_eq!(node.display_value, "7");
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].label.as_deref(), Some("count"));
        assert_eq!(node.byte_range, ByteRange::new(0, 1));
        let metadata = node.metadata.as_ref().unwrap();
        let function_name = metadata.iter().find(|(k, _)| k == "functionName").unwrap();
        assert!(matches!(&function_name.1, chfx_core::MetadataValue::Text(s) if s == "count"));
    }

    #[test]
    fn unsupported_aggregate_fails() {
        let ty = chfx_encoding::parse_type("AggregateFunction(median, UInt64)").unwrap();
        let data = [];
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let err = decode_value(&mut reader, &ty, &mut ids).unwrap_err();
        assert!(matches!(err, chfx_core::Error::UnsupportedAggregate { .. }));
    }

    #[test]
    fn geometry_point_scenario() {
        // Geometry discriminant 3 = Point, then two Float64s (x=1.5, y=-2.5).
        let ty = chfx_encoding::parse_type("Geometry").unwrap();
        let mut data = vec![3u8];
        data.extend(1.5f64.to_le_bytes());
        data.extend((-2.5f64).to_le_bytes());
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.byte_range, ByteRange::new(0, 17));
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].type_name, "Point");
        assert_eq!(node.children[0].children[0].value, Value::Float(1.5));
        assert_eq!(node.children[0].children[1].value, Value::Float(-2.5));
        let metadata = node.metadata.as_ref().unwrap();
        let discriminant = metadata.iter().find(|(k, _)| k == "discriminant").unwrap();
        assert!(matches!(discriminant.1, chfx_core::MetadataValue::UInt(3)));
        let geo_type = metadata.iter().find(|(k, _)| k == "geoType").unwrap();
        assert!(matches!(&geo_type.1, chfx_core::MetadataValue::Text(s) if s == "Point"));
    }

    #[test]
    fn geometry_invalid_discriminant_fails() {
        let ty = chfx_encoding::parse_type("Geometry").unwrap();
        let data = [6u8]; // only 0..=5 are valid
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let err = decode_value(&mut reader, &ty, &mut ids).unwrap_err();
        assert!(matches!(err, chfx_core::Error::InvalidDiscriminant { .. }));
    }

    #[test]
    fn qbit_scenario() {
        // QBit(UInt8, 3): 3 matches the LEB128-prefixed element count.
        let ty = chfx_encoding::parse_type("QBit(UInt8, 3)").unwrap();
        let data = [3u8, 10, 20, 30];
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        // length leaf + 3 elements.
        assert_eq!(node.children.len(), 4);
        assert_eq!(node.children[0].label.as_deref(), Some("length"));
        assert_eq!(node.children[1].value, Value::UInt(10));
        assert_eq!(node.children[3].value, Value::UInt(30));
        let metadata = node.metadata.as_ref().unwrap();
        let dimension = metadata.iter().find(|(k, _)| k == "dimension").unwrap();
        assert!(matches!(dimension.1, chfx_core::MetadataValue::UInt(3)));
        let element_type = metadata.iter().find(|(k, _)| k == "elementType").unwrap();
        assert!(matches!(&element_type.1, chfx_core::MetadataValue::Text(s) if s == "UInt8"));
        let size = metadata.iter().find(|(k, _)| k == "size").unwrap();
        assert!(matches!(size.1, chfx_core::MetadataValue::UInt(3)));
    }

    #[test]
    fn nested_scenario() {
        // Nested(id UInt8, name String): two Array(T) columns, one row each.
        let ty = chfx_encoding::parse_type("Nested(id UInt8, name String)").unwrap();
        let mut data = vec![1u8, 7u8]; // id: Array(UInt8) of length 1, value 7
        data.push(1); // name: Array(String) of length 1
        data.push(2); // String length 2
        data.extend(b"hi");
        let mut reader = ByteReader::new(&data);
        let mut ids = NodeIdGen::new();
        let node = decode_value(&mut reader, &ty, &mut ids).unwrap();
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].label.as_deref(), Some("id"));
        assert_eq!(node.children[1].label.as_deref(), Some("name"));
        // Each field column is an Array(T): length leaf + one element.
        assert_eq!(node.children[0].children[1].value, Value::UInt(7));
        assert_eq!(node.children[1].children[1].value, Value::Text("hi".into()));
    }
}
