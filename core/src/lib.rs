#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]

//! Core data model for `chfx`: the annotated parse tree ([`ast::AstNode`],
//! [`ast::ParsedData`]), the type descriptor language's data shape
//! ([`types::TypeDescriptor`]), byte spans ([`range::ByteRange`]), and the
//! error taxonomy ([`error::Error`]) shared by every decoding stage.
//!
//! This crate owns no I/O and performs no decoding itself; `chfx-encoding`
//! and `chfx-parser` build these types from wire bytes.

pub mod ast;
pub mod error;
pub mod range;
pub mod types;

pub use ast::{
    AstNode, ColumnHeaderEntry, DepthFirst, Format, Header, Metadata, MetadataValue, NodeId,
    NodeIdGen, ParsedData, Value,
};
pub use error::{DiscriminantKind, Error, Result};
pub use range::ByteRange;
pub use types::{IntWidth, IntervalUnit, PrimitiveType, TypeDescriptor};
