//! `ColumnDecoder`: the column-oriented block format (spec §4.5) — repeated
//! blocks, each a per-column header (name, type string) followed by that
//! column's values laid out contiguously across all rows of the block.
//!
//! Unlike `row.rs`, where every row interleaves one value per column, here
//! a single column's `rowCount` values are adjacent on the wire, which is
//! what the offsets/null-map/dictionary "stream" framing throughout this
//! module exists to make addressable as its own byte range. Children are
//! built in the exact order bytes are read, so the parent/child and
//! sibling-order invariants in spec §3 fall out of construction order
//! rather than needing a separate sort pass.

use chfx_core::{AstNode, ByteRange, ColumnHeaderEntry, Header, NodeIdGen, ParsedData, Result, TypeDescriptor, Value};
use chfx_encoding::ByteReader;

use crate::row;
use crate::value;

/// Decodes a complete column-oriented (native block) buffer: blocks,
/// repeated until the input is exhausted. The shared `header` exposed on
/// [`ParsedData`] is built from the first block's column definitions, per
/// spec §4.5.
pub fn decode_column_native(bytes: &[u8]) -> Result<ParsedData> {
    let mut reader = ByteReader::new(bytes);
    let mut ids = NodeIdGen::new();

    let mut blocks = Vec::new();
    let mut header = None;

    while !reader.is_empty() {
        let block_start = reader.position();
        let (block_node, entries, header_range) = decode_block(&mut reader, &mut ids)?;
        tracing::debug!(block_start, block_end = reader.position(), columns = entries.len(), "decoded block");
        if header.is_none() {
            header = Some(Header {
                entries,
                byte_range: header_range,
            });
        }
        blocks.push(block_node);
    }

    let header = header.unwrap_or(Header {
        entries: Vec::new(),
        byte_range: ByteRange::empty_at(0),
    });

    Ok(ParsedData::from_blocks(header, bytes.len(), blocks))
}

/// Decodes one block: `{ LEB128 nCols, LEB128 nRows, nCols x (name,
/// typeString, payload) }`. Returns the block's tree node, the column
/// header entries (for [`ParsedData::header`] bookkeeping), and the byte
/// range of just the header portion (counts + names + type strings, not
/// the payloads).
fn decode_block(
    reader: &mut ByteReader,
    ids: &mut NodeIdGen,
) -> Result<(AstNode, Vec<ColumnHeaderEntry>, ByteRange)> {
    let block_id = ids.next();
    let header_start = reader.position();

    let (n_cols, cols_range) = reader.read_leb128()?;
    let (n_rows, rows_range) = reader.read_leb128()?;
    let cols_leaf = AstNode::leaf(ids.next(), "UInt64", cols_range, Value::UInt(n_cols), n_cols.to_string())
        .with_label("columnCount");
    let rows_leaf = AstNode::leaf(ids.next(), "UInt64", rows_range, Value::UInt(n_rows), n_rows.to_string())
        .with_label("rowCount");

    let mut children = vec![cols_leaf, rows_leaf];
    let mut entries = Vec::with_capacity(n_cols as usize);
    let mut header_end = reader.position();

    for _ in 0..n_cols {
        let (name, name_range) = value::read_len_prefixed_string(reader)?;
        let (type_string, type_range) = value::read_len_prefixed_string(reader)?;
        let type_descriptor = chfx_encoding::parse_type(&type_string)?;
        header_end = type_range.end;

        let name_leaf = AstNode::leaf(ids.next(), "String", name_range, Value::Text(name.clone()), name.clone())
            .with_label("name");
        let type_leaf = AstNode::leaf(
            ids.next(),
            "String",
            type_range,
            Value::Text(type_string.clone()),
            type_string.clone(),
        )
        .with_label("type");

        let values_node = decode_column_values(reader, &type_descriptor, n_rows, ids)?;

        let column_id = ids.next();
        let column_node = container_at(
            column_id,
            type_string.clone(),
            values_node.display_value.clone(),
            vec![name_leaf, type_leaf, values_node],
            name_range.start,
        )
        .with_label(name.clone());
        children.push(column_node);

        entries.push(ColumnHeaderEntry {
            name,
            name_range,
            type_string,
            type_range,
            type_descriptor,
        });
    }

    let block_node = container_at(
        block_id,
        "Block",
        format!("{n_cols} columns x {n_rows} rows"),
        children,
        header_start,
    );
    Ok((block_node, entries, ByteRange::new(header_start, header_end)))
}

/// Builds a container node the same way [`AstNode::container`] does,
/// except that an empty `children` list falls back to an empty range at
/// `fallback_start` (the reader position when decoding this node began)
/// instead of offset `0` — needed because a zero-row column is legal and
/// must still report a byte range consistent with where it actually
/// occurred, for the sibling-ordering invariant in spec §3.
fn container_at(
    id: chfx_core::NodeId,
    type_name: impl Into<String>,
    display_value: impl Into<String>,
    children: Vec<AstNode>,
    fallback_start: usize,
) -> AstNode {
    let byte_range = children
        .iter()
        .map(|c| c.byte_range)
        .reduce(|a, b| a.union(&b))
        .unwrap_or(ByteRange::empty_at(fallback_start));
    AstNode {
        id,
        type_name: type_name.into(),
        byte_range,
        value: Value::Composite,
        display_value: display_value.into(),
        children,
        label: None,
        metadata: None,
    }
}

/// Whether `ty`'s column-format encoding produces exactly `count` disjoint,
/// self-contained item nodes with no column-level framing stream ahead of
/// them (no offsets/null-map/dictionary/discriminant prefix). This is
/// exactly the condition under which an enclosing `Array`'s offsets can
/// slice the flattened element stream into per-row groups (spec §4.5:
/// "Children for Arrays in column format are indexed by row"): slicing a
/// type that itself carries such a prefix would misattribute the prefix's
/// bytes to whichever row happened to be sliced first.
///
/// `Tuple`/`Map`/`Variant`/`Dynamic`/`JSON`/`Nullable`/`Array`/
/// `LowCardinality` all introduce such framing (or, for `Tuple`/`Map`,
/// physically interleave field-columns rather than rows) and are excluded;
/// everything else is decoded value-by-value with no shared stream.
fn is_row_sliceable(ty: &TypeDescriptor) -> bool {
    !matches!(
        ty,
        TypeDescriptor::Tuple { .. }
            | TypeDescriptor::Map { .. }
            | TypeDescriptor::Variant { .. }
            | TypeDescriptor::Dynamic { .. }
            | TypeDescriptor::Json { .. }
            | TypeDescriptor::Nullable { .. }
            | TypeDescriptor::Array { .. }
            | TypeDescriptor::LowCardinality { .. }
    )
}

/// Decodes `count` values of `ty` laid out contiguously, per spec §4.5.
/// Returns one container node per call; its children are built in the
/// exact order their bytes are read, which keeps them trivially monotonic
/// regardless of how deeply nested the type is.
pub(crate) fn decode_column_values(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    count: u64,
    ids: &mut NodeIdGen,
) -> Result<AstNode> {
    let id = ids.next();
    let start = reader.position();

    match ty {
        TypeDescriptor::Array { element } => decode_array_column(reader, ty, element, count, ids, id, start),
        TypeDescriptor::Tuple { elements, names } => {
            decode_tuple_column(reader, ty, elements, names, count, ids, id, start)
        }
        TypeDescriptor::Map { key, value } => decode_map_column(reader, ty, key, value, count, ids, id, start),
        TypeDescriptor::Nullable { inner } => decode_nullable_column(reader, ty, inner, count, ids, id, start),
        TypeDescriptor::LowCardinality { inner } => {
            decode_low_cardinality_column(reader, ty, inner, count, ids, id, start)
        }
        TypeDescriptor::Variant { variants } => decode_variant_column(reader, ty, variants, count, ids, id, start),
        TypeDescriptor::Dynamic { .. } => decode_dynamic_column(reader, ty, count, ids, id, start),
        TypeDescriptor::Json { typed_paths, .. } => decode_json_column(reader, ty, typed_paths, count, ids, id, start),
        // Nested, QBit, AggregateFunction, and the geometry family have no
        // contiguous columnar layout of their own in spec §4.5; each value
        // is self-contained, so applying the row-oriented encoding
        // `count` times in a row is exactly the column-format contract.
        _ => {
            let mut children = Vec::with_capacity(count as usize);
            for i in 0..count {
                children.push(row::decode_value(reader, ty, ids)?.with_label(format!("[{i}]")));
            }
            Ok(container_at(id, ty.to_string(), format!("{count} values"), children, start))
        }
    }
}

fn decode_array_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    element: &TypeDescriptor,
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let (offsets, offsets_node) = decode_offsets_stream(reader, count, ids)?;
    let total: u64 = offsets.last().copied().unwrap_or(0);

    let mut children = vec![offsets_node];
    if is_row_sliceable(element) {
        let elements_node = decode_column_values(reader, element, total, ids)?;
        let mut last_end = elements_node.byte_range.start;
        let mut items = elements_node.children.into_iter();
        let mut prev = 0u64;
        for (i, &off) in offsets.iter().enumerate() {
            let n = off.saturating_sub(prev);
            prev = off;
            let row_children: Vec<AstNode> = (0..n).filter_map(|_| items.next()).collect();
            if let Some(last) = row_children.last() {
                last_end = last.byte_range.end;
            }
            children.push(
                container_at(ids.next(), element.to_string(), format!("[{n} items]"), row_children, last_end)
                    .with_label(format!("[{i}]")),
            );
        }
    } else {
        let elements_node = decode_column_values(reader, element, total, ids)?.with_label("elements");
        children.push(elements_node);
    }

    Ok(container_at(id, ty.to_string(), format!("{count} rows"), children, start))
}

/// Reads `count` cumulative `UInt64` end-offsets, returning both the raw
/// values (used by callers to derive per-row element counts) and the
/// `"offsets"`-labeled node covering that stream.
fn decode_offsets_stream(reader: &mut ByteReader, count: u64, ids: &mut NodeIdGen) -> Result<(Vec<u64>, AstNode)> {
    let start = reader.position();
    let mut offsets = Vec::with_capacity(count as usize);
    let mut leaves = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (v, range) = reader.read_u64()?;
        offsets.push(v);
        leaves.push(AstNode::leaf(ids.next(), "UInt64", range, Value::UInt(v), v.to_string()).with_label(format!("[{i}]")));
    }
    let node = container_at(ids.next(), "offsets", format!("{count} offsets"), leaves, start).with_label("offsets");
    Ok((offsets, node))
}

fn decode_tuple_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    elements: &[TypeDescriptor],
    names: &Option<Vec<String>>,
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let mut children = Vec::with_capacity(elements.len());
    for (i, elem_ty) in elements.iter().enumerate() {
        let label = match names {
            Some(ns) if !ns[i].is_empty() => ns[i].clone(),
            _ => format!("[{i}]"),
        };
        children.push(decode_column_values(reader, elem_ty, count, ids)?.with_label(label));
    }
    Ok(container_at(id, ty.to_string(), format!("{count} rows"), children, start))
}

/// `Map(K, V)` is `Array(Tuple(K, V))` on the wire (spec §4.5): one
/// offsets stream sized by `count` rows, then `Tuple(K, V)`'s own
/// key-column-then-value-column layout over the flattened pair count.
fn decode_map_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    key: &TypeDescriptor,
    value: &TypeDescriptor,
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let (offsets, offsets_node) = decode_offsets_stream(reader, count, ids)?;
    let total_pairs: u64 = offsets.last().copied().unwrap_or(0);
    let pair_ty = TypeDescriptor::Tuple {
        elements: vec![key.clone(), value.clone()],
        names: Some(vec!["key".to_string(), "value".to_string()]),
    };
    let pairs_node = decode_column_values(reader, &pair_ty, total_pairs, ids)?.with_label("entries");
    Ok(container_at(id, ty.to_string(), format!("{count} rows"), vec![offsets_node, pairs_node], start))
}

fn decode_nullable_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    inner: &TypeDescriptor,
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let null_map_start = reader.position();
    let mut is_null = Vec::with_capacity(count as usize);
    let mut null_leaves = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (flag, range) = reader.read_u8()?;
        is_null.push(flag != 0);
        let display = if flag != 0 { "null" } else { "present" };
        null_leaves.push(AstNode::leaf(ids.next(), "UInt8", range, Value::Bool(flag != 0), display).with_label(format!("[{i}]")));
    }
    let null_map_node = container_at(ids.next(), "null-map", format!("{count} flags"), null_leaves, null_map_start)
        .with_label("null-map");

    let inner_node = decode_column_values(reader, inner, count, ids)?;
    let mut children = vec![null_map_node];
    if is_row_sliceable(inner) {
        for (i, item) in inner_node.children.into_iter().enumerate() {
            let item = if is_null[i] {
                AstNode {
                    value: Value::Null,
                    display_value: "NULL".to_string(),
                    ..item
                }
            } else {
                item
            };
            children.push(item.with_label(format!("[{i}]")));
        }
    } else {
        children.push(inner_node.with_label("values"));
    }

    Ok(container_at(id, ty.to_string(), format!("{count} rows"), children, start))
}

/// Key width (in bytes) selected by a `LowCardinality` flags word's low
/// byte: `0` → `UInt8` keys, `1` → `UInt16`, `2` → `UInt32`, anything else
/// → `UInt64`. `LowCardinality` is only ever applied to `String`,
/// `FixedString`, numeric, and `Date`-family inner types in practice, so
/// the dictionary is always row-sliceable and this width always resolves
/// a concrete key.
fn low_cardinality_key_width(flags: u64) -> usize {
    match flags & 0xFF {
        0 => 1,
        1 => 2,
        2 => 4,
        _ => 8,
    }
}

fn decode_low_cardinality_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    inner: &TypeDescriptor,
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let (flags, flags_range) = reader.read_u64()?;
    let flags_leaf = AstNode::leaf(ids.next(), "UInt64", flags_range, Value::UInt(flags), format!("0x{flags:016X}")).with_label("flags");

    let (dict_size, dict_size_range) = reader.read_u64()?;
    let dict_size_leaf = AstNode::leaf(ids.next(), "UInt64", dict_size_range, Value::UInt(dict_size), dict_size.to_string())
        .with_label("dictionarySize");

    let dictionary_node = decode_column_values(reader, inner, dict_size, ids)?.with_label("dictionary");
    let dictionary_items: Vec<AstNode> = if is_row_sliceable(inner) {
        dictionary_node.children.clone()
    } else {
        Vec::new()
    };

    let (keys_count, keys_count_range) = reader.read_u64()?;
    let keys_count_leaf = AstNode::leaf(ids.next(), "UInt64", keys_count_range, Value::UInt(keys_count), keys_count.to_string())
        .with_label("keysCount");

    let key_width = low_cardinality_key_width(flags);
    let mut key_items = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (raw, range) = reader.read_bytes(key_width)?;
        let mut buf = [0u8; 8];
        buf[..key_width].copy_from_slice(raw);
        let key_value = u64::from_le_bytes(buf);

        let item = match dictionary_items.get(key_value as usize) {
            Some(entry) => AstNode {
                id: ids.next(),
                type_name: inner.to_string(),
                byte_range: range,
                value: entry.value.clone(),
                display_value: entry.display_value.clone(),
                children: Vec::new(),
                label: Some(format!("[{i}]").into()),
                metadata: None,
            }
            .with_metadata_entry("dictionaryIndex", key_value),
            None => {
                tracing::warn!(key = key_value, dictionary_size = dictionary_items.len(), "LowCardinality key outside dictionary");
                AstNode::leaf(ids.next(), inner.to_string(), range, Value::Null, "<invalid dictionary key>")
                    .with_label(format!("[{i}]"))
                    .with_metadata_entry("dictionaryIndex", key_value)
            }
        };
        key_items.push(item);
    }

    let children = vec![flags_leaf, dict_size_leaf, dictionary_node, keys_count_leaf]
        .into_iter()
        .chain(key_items)
        .collect();
    Ok(container_at(id, ty.to_string(), format!("{count} rows"), children, start))
}

fn decode_variant_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    variants: &[TypeDescriptor],
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let disc_start = reader.position();
    let mut discriminants = Vec::with_capacity(count as usize);
    let mut disc_leaves = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (d, range) = reader.read_u8()?;
        discriminants.push(d);
        disc_leaves.push(AstNode::leaf(ids.next(), "UInt8", range, Value::UInt(u64::from(d)), d.to_string()).with_label(format!("[{i}]")));
    }
    let disc_node = container_at(ids.next(), "discriminants", format!("{count} discriminants"), disc_leaves, disc_start)
        .with_label("discriminants");

    let mut counts = vec![0u64; variants.len()];
    for &d in &discriminants {
        if d != 0xFF {
            if let Some(c) = counts.get_mut(d as usize) {
                *c += 1;
            }
        }
    }

    let mut children = vec![disc_node];
    for (v, variant_ty) in variants.iter().enumerate() {
        let node = decode_column_values(reader, variant_ty, counts[v], ids)?
            .with_label(format!("variant[{v}]: {variant_ty}"));
        children.push(node);
    }

    Ok(container_at(id, ty.to_string(), format!("{count} rows"), children, start))
}

fn decode_dynamic_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let header_start = reader.position();
    let (n_types, _) = reader.read_leb128()?;
    let mut header_types = Vec::with_capacity(n_types as usize);
    let mut header_leaves = Vec::with_capacity(n_types as usize);
    for i in 0..n_types {
        let (decoded, range) = chfx_encoding::decode_subtype(reader, "dynamic column header entry")?;
        header_leaves.push(
            AstNode::leaf(ids.next(), decoded.to_string(), range, Value::Text(decoded.to_string()), decoded.to_string())
                .with_label(format!("[{i}]")),
        );
        header_types.push(decoded);
    }
    let header_node = container_at(ids.next(), "Dynamic.Header", format!("{n_types} types"), header_leaves, header_start);

    let disc_start = reader.position();
    let mut discriminants = Vec::with_capacity(count as usize);
    let mut disc_leaves = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (d, range) = reader.read_u8()?;
        discriminants.push(d);
        disc_leaves.push(AstNode::leaf(ids.next(), "UInt8", range, Value::UInt(u64::from(d)), d.to_string()).with_label(format!("[{i}]")));
    }
    let disc_node = container_at(ids.next(), "discriminants", format!("{count} discriminants"), disc_leaves, disc_start)
        .with_label("discriminants");

    let mut counts = vec![0u64; header_types.len()];
    for &d in &discriminants {
        if d != 0xFF {
            if let Some(c) = counts.get_mut(d as usize) {
                *c += 1;
            }
        }
    }

    let mut children = vec![header_node, disc_node];
    for (v, variant_ty) in header_types.iter().enumerate() {
        let node = decode_column_values(reader, variant_ty, counts[v], ids)?
            .with_label(format!("type[{v}]: {variant_ty}"))
            .with_metadata_entry("decodedType", variant_ty.to_string());
        children.push(node);
    }

    Ok(container_at(id, ty.to_string(), format!("{count} rows"), children, start))
}

fn decode_json_column(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    typed_paths: &[(String, TypeDescriptor)],
    count: u64,
    ids: &mut NodeIdGen,
    id: chfx_core::NodeId,
    start: usize,
) -> Result<AstNode> {
    let header_start = reader.position();
    let (version, version_range) = reader.read_u8()?;
    let version_leaf = AstNode::leaf(ids.next(), "UInt8", version_range, Value::UInt(u64::from(version)), version.to_string())
        .with_label("version");

    let (path_name_count, _) = reader.read_leb128()?;
    let mut path_name_leaves = Vec::with_capacity(path_name_count as usize);
    for i in 0..path_name_count {
        let (name, range) = value::read_len_prefixed_string(reader)?;
        path_name_leaves.push(AstNode::leaf(ids.next(), "String", range, Value::Text(name.clone()), name).with_label(format!("[{i}]")));
    }
    let names_node = container_at(ids.next(), "dynamicPathNames", format!("{path_name_count} names"), path_name_leaves, header_start)
        .with_label("dynamicPathNames");

    let header_node = container_at(ids.next(), "JSON.Header", "", vec![version_leaf, names_node], header_start);

    let mut children = vec![header_node];
    for (path, path_ty) in typed_paths {
        let mut node = decode_column_values(reader, path_ty, count, ids)?;
        node.type_name = "JSON.typed_path".to_string();
        children.push(node.with_label(path.clone()));
    }

    let dynamic_paths_start = reader.position();
    let untyped = TypeDescriptor::Json {
        typed_paths: Vec::new(),
        max_dynamic_paths: None,
    };
    let mut dynamic_rows = Vec::with_capacity(count as usize);
    for i in 0..count {
        dynamic_rows.push(row::decode_value(reader, &untyped, ids)?.with_label(format!("[{i}]")));
    }
    let dynamic_paths_node = container_at(
        ids.next(),
        "JSON.DynamicPaths",
        format!("{count} rows"),
        dynamic_rows,
        dynamic_paths_start,
    )
    .with_label("dynamicPaths");
    children.push(dynamic_paths_node);

    Ok(container_at(id, ty.to_string(), format!("{count} rows"), children, start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_header(cols: &[(&str, &str)], n_rows: u8) -> Vec<u8> {
        let mut bytes = vec![cols.len() as u8, n_rows];
        for (name, ty) in cols {
            bytes.push(name.len() as u8);
            bytes.extend(name.as_bytes());
            bytes.push(ty.len() as u8);
            bytes.extend(ty.as_bytes());
        }
        bytes
    }

    #[test]
    fn single_uint8_column_three_rows() {
        let mut bytes = block_header(&[("val", "UInt8")], 3);
        bytes.extend([1, 2, 3]);
        let data = decode_column_native(&bytes).unwrap();
        assert_eq!(data.total_bytes, bytes.len());
        assert_eq!(data.header.entries.len(), 1);
        let blocks = data.blocks.unwrap();
        assert_eq!(blocks.len(), 1);
        let column = &blocks[0].children[2];
        assert_eq!(column.label.as_deref(), Some("val"));
        let values_node = &column.children[2];
        assert_eq!(values_node.children.len(), 3);
        assert_eq!(values_node.children[0].value, Value::UInt(1));
        assert_eq!(values_node.children[2].value, Value::UInt(3));
    }

    #[test]
    fn array_of_uint32_column_two_rows() {
        // offsets: [2, 3] (row0 has 2 elements, row1 has 1); elements: 10,20,30
        let mut bytes = block_header(&[("xs", "Array(UInt32)")], 2);
        bytes.extend(2u64.to_le_bytes());
        bytes.extend(3u64.to_le_bytes());
        bytes.extend(10u32.to_le_bytes());
        bytes.extend(20u32.to_le_bytes());
        bytes.extend(30u32.to_le_bytes());

        let data = decode_column_native(&bytes).unwrap();
        let blocks = data.blocks.unwrap();
        let values_node = &blocks[0].children[2].children[2];
        // children: offsets_node, row[0], row[1]
        assert_eq!(values_node.children.len(), 3);
        assert_eq!(values_node.children[0].label.as_deref(), Some("offsets"));
        let row0 = &values_node.children[1];
        assert_eq!(row0.children.len(), 2);
        assert_eq!(row0.children[0].value, Value::UInt(10));
        let row1 = &values_node.children[2];
        assert_eq!(row1.children.len(), 1);
        assert_eq!(row1.children[0].value, Value::UInt(30));
    }

    #[test]
    fn nullable_column_marks_null_rows() {
        let mut bytes = block_header(&[("n", "Nullable(UInt8)")], 2);
        bytes.extend([1u8, 0u8]); // null-map: row0 null, row1 present
        bytes.extend([0u8, 42u8]); // payload for both rows (row0 discarded)
        let data = decode_column_native(&bytes).unwrap();
        let blocks = data.blocks.unwrap();
        let values_node = &blocks[0].children[2].children[2];
        assert_eq!(values_node.children.len(), 3); // null-map + 2 rows
        assert_eq!(values_node.children[1].value, Value::Null);
        assert_eq!(values_node.children[2].value, Value::UInt(42));
    }

    #[test]
    fn coverage_is_full_for_flat_scenario() {
        let mut bytes = block_header(&[("val", "UInt8"), ("flag", "Bool")], 2);
        bytes.extend([1u8, 2u8]);
        bytes.extend([1u8, 0u8]);
        let data = decode_column_native(&bytes).unwrap();
        assert!((data.coverage_ratio() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn byte_order_is_monotonic_depth_first() {
        let mut bytes = block_header(&[("xs", "Array(UInt32)"), ("val", "UInt8")], 2);
        bytes.extend(1u64.to_le_bytes());
        bytes.extend(2u64.to_le_bytes());
        bytes.extend(10u32.to_le_bytes());
        bytes.extend(20u32.to_le_bytes());
        bytes.extend([5u8, 6u8]);
        let data = decode_column_native(&bytes).unwrap();
        let blocks = data.blocks.unwrap();
        let mut last = 0usize;
        for node in blocks[0].iter_depth_first() {
            assert!(node.byte_range.start >= last || node.byte_range.is_empty());
            last = last.max(node.byte_range.start);
        }
    }
}
