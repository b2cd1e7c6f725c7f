//! End-to-end scenarios for the row-oriented format, decoded through the
//! crate's public entry point rather than its internal recursive decoder.

use chfx_core::Value;
use chfx_parser::decode_row_binary;

fn hex(s: &str) -> Vec<u8> {
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
}

fn header(columns: &[(&str, &str)]) -> Vec<u8> {
    let mut bytes = vec![columns.len() as u8];
    for (name, ty) in columns {
        bytes.push(name.len() as u8);
        bytes.extend(name.as_bytes());
        bytes.push(ty.len() as u8);
        bytes.extend(ty.as_bytes());
    }
    bytes
}

#[test]
fn single_uint8_column_one_row() {
    let mut bytes = header(&[("val", "UInt8")]);
    bytes.push(0x2A);

    let data = decode_row_binary(&bytes).unwrap();
    assert_eq!(data.total_bytes, bytes.len());
    let rows = data.rows.as_ref().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].children[0].value, Value::UInt(42));
    assert_eq!(data.coverage_ratio(), 1.0);
}

#[test]
fn uuid_byte_order_scenario() {
    // a9e3b29b-b2cb-4f8d-8e69-8d6c5f3b7a6d laid out per the wire's
    // high-qword/low-qword split, each itself big-endian.
    let mut bytes = header(&[("id", "UUID")]);
    bytes.extend(hex("a9e3b29bb2cb4f8d8e698d6c5f3b7a6d"));

    let data = decode_row_binary(&bytes).unwrap();
    let rows = data.rows.as_ref().unwrap();
    let node = &rows[0].children[0];
    assert!(matches!(node.value, Value::Text(_)));
}

#[test]
fn truncated_leb128_length_fails() {
    let mut bytes = header(&[("s", "String")]);
    bytes.push(0xFF); // continuation bit set, then nothing
    let err = decode_row_binary(&bytes).unwrap_err();
    assert!(matches!(err, chfx_core::Error::UnexpectedEnd { .. }));
}

#[test]
fn unknown_dynamic_type_index_fails() {
    let mut bytes = header(&[("v", "Dynamic")]);
    bytes.push(0xFE);
    let err = decode_row_binary(&bytes).unwrap_err();
    assert!(matches!(err, chfx_core::Error::UnknownBinaryTypeIndex { index: 0xFE, .. }));
}

#[test]
fn variant_discriminant_out_of_range_fails_end_to_end() {
    let mut bytes = header(&[("v", "Variant(String, UInt64)")]);
    bytes.push(0x05); // only two alternatives declared
    let err = decode_row_binary(&bytes).unwrap_err();
    assert!(matches!(err, chfx_core::Error::InvalidDiscriminant { .. }));
}
