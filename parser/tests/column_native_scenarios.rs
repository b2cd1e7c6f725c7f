//! End-to-end scenarios for the column-oriented native block format,
//! decoded through the crate's public entry point.

use chfx_core::Value;
use chfx_parser::decode_column_native;

fn block_header(columns: &[(&str, &str)], n_rows: u8) -> Vec<u8> {
    let mut bytes = vec![columns.len() as u8, n_rows];
    for (name, ty) in columns {
        bytes.push(name.len() as u8);
        bytes.extend(name.as_bytes());
        bytes.push(ty.len() as u8);
        bytes.extend(ty.as_bytes());
    }
    bytes
}

#[test]
fn two_columns_three_rows_full_coverage() {
    let mut bytes = block_header(&[("id", "UInt32"), ("flag", "Bool")], 3);
    bytes.extend(1u32.to_le_bytes());
    bytes.extend(2u32.to_le_bytes());
    bytes.extend(3u32.to_le_bytes());
    bytes.extend([1u8, 0u8, 1u8]);

    let data = decode_column_native(&bytes).unwrap();
    assert_eq!(data.total_bytes, bytes.len());
    assert_eq!(data.header.entries.len(), 2);
    assert_eq!((data.coverage_ratio() - 1.0).abs() < 1e-9, true);

    let blocks = data.blocks.as_ref().unwrap();
    assert_eq!(blocks.len(), 1);
    let id_column = &blocks[0].children[2];
    let id_values = &id_column.children[2];
    assert_eq!(id_values.children[0].value, Value::UInt(1));
    assert_eq!(id_values.children[2].value, Value::UInt(3));
}

#[test]
fn repeated_blocks_share_one_header() {
    let mut bytes = block_header(&[("val", "UInt8")], 2);
    bytes.extend([1u8, 2u8]);
    bytes.extend(block_header(&[("val", "UInt8")], 1));
    bytes.extend([3u8]);

    let data = decode_column_native(&bytes).unwrap();
    let blocks = data.blocks.as_ref().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(data.header.entries.len(), 1);
}

#[test]
fn dictionary_encoded_string_column() {
    // LowCardinality(String): flags selecting UInt8 keys, 2 dictionary
    // entries ("a", "b"), 3 keys (0, 1, 0).
    let mut bytes = block_header(&[("s", "LowCardinality(String)")], 3);
    bytes.extend(0u64.to_le_bytes()); // flags: UInt8 keys
    bytes.extend(2u64.to_le_bytes()); // dictionary size
    bytes.push(1);
    bytes.extend(b"a");
    bytes.push(1);
    bytes.extend(b"b");
    bytes.extend(3u64.to_le_bytes()); // keys count
    bytes.extend([0u8, 1u8, 0u8]);

    let data = decode_column_native(&bytes).unwrap();
    let blocks = data.blocks.as_ref().unwrap();
    let values_node = &blocks[0].children[2].children[2];
    // flags, dictSize, dictionary, keysCount, then 3 keyed rows.
    assert_eq!(values_node.children.len(), 7);
    assert_eq!(values_node.children[4].value, Value::Text("a".to_string()));
    assert_eq!(values_node.children[5].value, Value::Text("b".to_string()));
    assert_eq!(values_node.children[6].value, Value::Text("a".to_string()));
}
