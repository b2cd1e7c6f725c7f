#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]

//! Decoders that turn ClickHouse wire bytes into a [`chfx_core::ParsedData`]
//! tree: [`row::decode_row_binary`] for `RowBinaryWithNamesAndTypes`,
//! [`column::decode_column_native`] for the column-oriented native block
//! format. Both share a header format and almost all leaf value encodings
//! (`value`), diverging only in how they lay out repeated values across
//! rows versus columns.

pub mod column;
pub mod row;
mod value;

pub use column::decode_column_native;
pub use row::decode_row_binary;
