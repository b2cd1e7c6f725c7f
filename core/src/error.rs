//! The flat error taxonomy shared by every decoding stage.
//!
//! Every crate in this workspace reports failures through this single
//! enum rather than inventing a parallel one per stage: the type grammar,
//! the binary reader, the binary type index, and the two format decoders
//! all construct their errors here, via `snafu`'s context selectors.

use std::fmt;

use snafu::{Backtrace, Snafu};

/// Type alias for a result from this library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The main data type for errors produced while decoding a wire format.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// The reader was asked for more bytes than remain in the input.
    #[snafu(display(
        "unexpected end of input: wanted {requested} byte(s) at offset {offset}, only {remaining} remain"
    ))]
    UnexpectedEnd {
        /// Absolute offset at which the read was attempted.
        offset: usize,
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes actually available.
        remaining: usize,
        backtrace: Backtrace,
    },

    /// A string payload was not valid UTF-8.
    #[snafu(display("invalid UTF-8 in string value at offset {offset}: {source}"))]
    InvalidUtf8 {
        offset: usize,
        source: std::str::Utf8Error,
        backtrace: Backtrace,
    },

    /// A LEB128-encoded integer did not terminate within 64 bits.
    #[snafu(display("LEB128 value at offset {offset} overflows 64 bits"))]
    LebOverflow { offset: usize, backtrace: Backtrace },

    /// A type name in a type descriptor string is not recognized.
    #[snafu(display("unknown type name `{name}`"))]
    UnknownType { name: String, backtrace: Backtrace },

    /// A byte in the binary type index table (§6) has no known meaning.
    #[snafu(display("unknown binary type index 0x{index:02X} at offset {offset}"))]
    UnknownBinaryTypeIndex {
        index: u8,
        offset: usize,
        backtrace: Backtrace,
    },

    /// The type descriptor grammar rejected the input.
    #[snafu(display("type descriptor parse error at position {position}: {message}"))]
    ParseError {
        position: usize,
        message: String,
        backtrace: Backtrace,
    },

    /// A `Variant`/`Geometry` discriminant byte was out of range.
    #[snafu(display(
        "invalid {kind} discriminant {value} (must be < {bound}) at offset {offset}"
    ))]
    InvalidDiscriminant {
        kind: DiscriminantKind,
        value: u32,
        bound: u32,
        offset: usize,
        backtrace: Backtrace,
    },

    /// The `Nothing` binary type index (`0x00`) appeared where a concrete
    /// sub-type is required (array element, nullable inner, tuple element,
    /// map key/value, variant alternative).
    #[snafu(display("`Nothing` cannot be used as a {context} at offset {offset}"))]
    NothingAsSubType {
        context: &'static str,
        offset: usize,
        backtrace: Backtrace,
    },

    /// An `AggregateFunction` name has no known wire encoding.
    #[snafu(display("unsupported aggregate function `{name}`"))]
    UnsupportedAggregate { name: String, backtrace: Backtrace },
}

impl Error {
    /// The byte offset at which the failure occurred, when known.
    ///
    /// Every variant that originates from a specific input position
    /// reports it here, so callers never have to match on the full enum
    /// just to log where a decode failed.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::UnexpectedEnd { offset, .. }
            | Error::InvalidUtf8 { offset, .. }
            | Error::LebOverflow { offset, .. }
            | Error::UnknownBinaryTypeIndex { offset, .. }
            | Error::InvalidDiscriminant { offset, .. }
            | Error::NothingAsSubType { offset, .. } => Some(*offset),
            Error::ParseError { position, .. } => Some(*position),
            Error::UnknownType { .. } | Error::UnsupportedAggregate { .. } => None,
        }
    }
}

/// The kind of sum-type discriminant an [`Error::InvalidDiscriminant`]
/// refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminantKind {
    /// A `Variant(...)` wire discriminant.
    Variant,
    /// A `Geometry` wire discriminant.
    Geometry,
}

impl fmt::Display for DiscriminantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscriminantKind::Variant => f.write_str("Variant"),
            DiscriminantKind::Geometry => f.write_str("Geometry"),
        }
    }
}
