#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]

//! Positioned binary reading ([`reader::ByteReader`]), the type descriptor
//! grammar ([`lexer`]/[`parser`]), and binary type index decoding
//! ([`dynamic`]) for ClickHouse wire formats.
//!
//! This crate turns bytes into [`chfx_core`] types; it does not itself
//! build an [`chfx_core::AstNode`] tree — that is `chfx-parser`'s job.

pub mod dynamic;
pub mod lexer;
pub mod parser;
pub mod reader;

pub use dynamic::{decode_subtype, decode_top_level};
pub use lexer::{tokenize, Token};
pub use parser::parse_type;
pub use reader::ByteReader;

/// Renders a [`chfx_core::TypeDescriptor`] back to its canonical type
/// string. A thin, named wrapper over `Display` matching the abstract
/// library surface in spec §6 (`type_to_string`).
pub fn type_to_string(ty: &chfx_core::TypeDescriptor) -> String {
    ty.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chfx_core::TypeDescriptor;

    #[test]
    fn parse_and_render_round_trip() {
        let ty = parse_type("Array(Nullable(UInt32))").unwrap();
        assert_eq!(type_to_string(&ty), "Array(Nullable(UInt32))");
    }

    #[test]
    fn variant_round_trip_modulo_reordering() {
        let ty: TypeDescriptor = parse_type("Variant(UInt64, String)").unwrap();
        let rendered = type_to_string(&ty);
        let reparsed = parse_type(&rendered).unwrap();
        assert_eq!(ty, reparsed);
    }
}
