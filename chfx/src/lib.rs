//! # chfx
//!
//! This crate serves as a parent for the library crates that make up the
//! `chfx` project: decoders that turn ClickHouse wire bytes into a uniform,
//! byte-range-annotated parse tree instead of a typed row/column result.
//!
//! These modules are also available as crates that can be fetched
//! independently, in complement or as an alternative to using this `chfx`
//! crate. They carry the `chfx-` prefix; the module [`encoding`] lives in
//! the crate named [`chfx-encoding`][1], for instance.
//!
//! [1]: https://docs.rs/chfx-encoding
//!
//! ## Basic
//!
//! - [`decode_row_binary`] decodes a buffer in the `RowBinaryWithNamesAndTypes`
//!   format: one shared header, then rows read until the input is exhausted.
//! - [`decode_column_native`] decodes a buffer in the native, column-oriented
//!   block format: repeated blocks, each with its own per-column header and
//!   payload.
//! - [`parse_type`] parses a single ClickHouse type string (e.g.
//!   `"Array(Nullable(UInt32))"`) into a [`core::TypeDescriptor`], and
//!   [`type_to_string`] renders one back to its canonical spelling.
//! - The [`core`] module contains the data types the other modules rely on:
//!   [`AstNode`](core::AstNode) for one parse tree node, [`ParsedData`]
//!   for a whole decode's result, and [`ByteRange`](core::ByteRange) for the
//!   `[start, end)` span every node carries.
//!
//! ## Advanced
//!
//! - [`encoding`] contains the lower-level building blocks: the positioned
//!   [`ByteReader`](encoding::ByteReader), the type grammar's
//!   tokenizer/parser, and the `Dynamic`/`JSON` binary type index decoder.
//!   You would only need these directly to decode a type string or a binary
//!   type index outside of a full row/column decode.
//! - [`parser`] contains the row and column decoders themselves, should you
//!   need to call into their internals directly rather than through the
//!   top-level functions re-exported here.

pub use chfx_core as core;
pub use chfx_encoding as encoding;
pub use chfx_parser as parser;

pub use chfx_core::{AstNode, ByteRange, ParsedData, Result, TypeDescriptor};
pub use chfx_encoding::{parse_type, type_to_string};
pub use chfx_parser::{decode_column_native, decode_row_binary};
