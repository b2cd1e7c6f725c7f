//! Type descriptors: the parsed, structured form of a ClickHouse type
//! string such as `Array(Nullable(Tuple(id UInt32, name String)))`.
//!
//! A [`TypeDescriptor`] is immutable once built, compares structurally, and
//! round-trips through [`TypeDescriptor::to_string`] /
//! `TypeLexer`+`TypeParser` (in `chfx-encoding`) modulo `Variant` reordering
//! and whitespace, per the invariant in spec §3.

use std::fmt;

/// The width of an integer or decimal type, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    W128,
    W256,
}

impl IntWidth {
    /// Width in bits.
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::W128 => 128,
            IntWidth::W256 => 256,
        }
    }

    /// Width in bytes.
    pub fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// The default maximum decimal precision representable at this width,
    /// used when a `DecimalN` constructor is given only a scale.
    pub fn default_decimal_precision(self) -> u32 {
        match self {
            IntWidth::W32 => 9,
            IntWidth::W64 => 18,
            IntWidth::W128 => 38,
            IntWidth::W256 => 76,
            IntWidth::W8 | IntWidth::W16 => {
                unreachable!("decimals are only defined for 32/64/128/256-bit widths")
            }
        }
    }

    /// The narrowest decimal width whose default precision covers `precision`.
    pub fn narrowest_decimal_for_precision(precision: u32) -> IntWidth {
        if precision <= 9 {
            IntWidth::W32
        } else if precision <= 18 {
            IntWidth::W64
        } else if precision <= 38 {
            IntWidth::W128
        } else {
            IntWidth::W256
        }
    }
}

/// The unit of an `IntervalX` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntervalUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl IntervalUnit {
    /// All recognized units, in the order they are tried when matching a
    /// type name such as `IntervalDay`.
    pub const ALL: [IntervalUnit; 11] = [
        IntervalUnit::Nanosecond,
        IntervalUnit::Microsecond,
        IntervalUnit::Millisecond,
        IntervalUnit::Second,
        IntervalUnit::Minute,
        IntervalUnit::Hour,
        IntervalUnit::Day,
        IntervalUnit::Week,
        IntervalUnit::Month,
        IntervalUnit::Quarter,
        IntervalUnit::Year,
    ];

    /// The `IntervalX` name, e.g. `"IntervalDay"`.
    pub fn type_name(self) -> &'static str {
        match self {
            IntervalUnit::Nanosecond => "IntervalNanosecond",
            IntervalUnit::Microsecond => "IntervalMicrosecond",
            IntervalUnit::Millisecond => "IntervalMillisecond",
            IntervalUnit::Second => "IntervalSecond",
            IntervalUnit::Minute => "IntervalMinute",
            IntervalUnit::Hour => "IntervalHour",
            IntervalUnit::Day => "IntervalDay",
            IntervalUnit::Week => "IntervalWeek",
            IntervalUnit::Month => "IntervalMonth",
            IntervalUnit::Quarter => "IntervalQuarter",
            IntervalUnit::Year => "IntervalYear",
        }
    }
}

/// A type with no constructor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    UInt(IntWidth),
    Int(IntWidth),
    Float32,
    Float64,
    BFloat16,
    String,
    Bool,
    Date,
    Date32,
    Time,
    Uuid,
    IPv4,
    IPv6,
    Point,
    Ring,
    Polygon,
    MultiPolygon,
    LineString,
    MultiLineString,
    Geometry,
    Interval(IntervalUnit),
}

impl PrimitiveType {
    /// All primitive types with no parameters, in the form the lexer
    /// recognizes a bare identifier (no trailing parentheses) as one of
    /// them.
    pub fn by_name(name: &str) -> Option<PrimitiveType> {
        use IntWidth::*;
        Some(match name {
            "UInt8" => PrimitiveType::UInt(W8),
            "UInt16" => PrimitiveType::UInt(W16),
            "UInt32" => PrimitiveType::UInt(W32),
            "UInt64" => PrimitiveType::UInt(W64),
            "UInt128" => PrimitiveType::UInt(W128),
            "UInt256" => PrimitiveType::UInt(W256),
            "Int8" => PrimitiveType::Int(W8),
            "Int16" => PrimitiveType::Int(W16),
            "Int32" => PrimitiveType::Int(W32),
            "Int64" => PrimitiveType::Int(W64),
            "Int128" => PrimitiveType::Int(W128),
            "Int256" => PrimitiveType::Int(W256),
            "Float32" => PrimitiveType::Float32,
            "Float64" => PrimitiveType::Float64,
            "BFloat16" => PrimitiveType::BFloat16,
            "String" => PrimitiveType::String,
            "Bool" => PrimitiveType::Bool,
            "Date" => PrimitiveType::Date,
            "Date32" => PrimitiveType::Date32,
            "Time" => PrimitiveType::Time,
            "UUID" => PrimitiveType::Uuid,
            "IPv4" => PrimitiveType::IPv4,
            "IPv6" => PrimitiveType::IPv6,
            "Point" => PrimitiveType::Point,
            "Ring" => PrimitiveType::Ring,
            "Polygon" => PrimitiveType::Polygon,
            "MultiPolygon" => PrimitiveType::MultiPolygon,
            "LineString" => PrimitiveType::LineString,
            "MultiLineString" => PrimitiveType::MultiLineString,
            "Geometry" => PrimitiveType::Geometry,
            _ => {
                for unit in IntervalUnit::ALL {
                    if unit.type_name() == name {
                        return Some(PrimitiveType::Interval(unit));
                    }
                }
                return None;
            }
        })
    }

    /// The bare constructor name, as it appears in a type string.
    pub fn type_name(self) -> String {
        match self {
            PrimitiveType::UInt(w) => format!("UInt{}", w.bits()),
            PrimitiveType::Int(w) => format!("Int{}", w.bits()),
            PrimitiveType::Float32 => "Float32".into(),
            PrimitiveType::Float64 => "Float64".into(),
            PrimitiveType::BFloat16 => "BFloat16".into(),
            PrimitiveType::String => "String".into(),
            PrimitiveType::Bool => "Bool".into(),
            PrimitiveType::Date => "Date".into(),
            PrimitiveType::Date32 => "Date32".into(),
            PrimitiveType::Time => "Time".into(),
            PrimitiveType::Uuid => "UUID".into(),
            PrimitiveType::IPv4 => "IPv4".into(),
            PrimitiveType::IPv6 => "IPv6".into(),
            PrimitiveType::Point => "Point".into(),
            PrimitiveType::Ring => "Ring".into(),
            PrimitiveType::Polygon => "Polygon".into(),
            PrimitiveType::MultiPolygon => "MultiPolygon".into(),
            PrimitiveType::LineString => "LineString".into(),
            PrimitiveType::MultiLineString => "MultiLineString".into(),
            PrimitiveType::Geometry => "Geometry".into(),
            PrimitiveType::Interval(unit) => unit.type_name().into(),
        }
    }
}

/// The full tagged union of supported ClickHouse types.
///
/// Construction always goes through `chfx-encoding`'s `TypeParser` (from a
/// type string) or `DynamicTypeDecoder` (from a binary type index); this
/// module only owns the data shape and its `Display`/equality semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// A type with no parameters (see [`PrimitiveType`]).
    Primitive(PrimitiveType),
    /// `FixedString(length)`.
    FixedString { length: u64 },
    /// `DateTime` or `DateTime('Timezone/Name')`.
    DateTime { timezone: Option<String> },
    /// `DateTime64(precision[, 'Timezone/Name'])`.
    DateTime64 {
        precision: u8,
        timezone: Option<String>,
    },
    /// `Time64(precision)`.
    Time64 { precision: u8 },
    /// `DecimalN(precision, scale)`, already normalized to its concrete
    /// width (`DecimalN`), never the generic `Decimal(p, s)` spelling.
    Decimal {
        width: IntWidth,
        precision: u32,
        scale: u32,
    },
    /// `Enum8`/`Enum16`, an ordered code-to-label mapping.
    Enum {
        width: IntWidth,
        /// `(code, label)` pairs in declaration order.
        values: Vec<(i32, String)>,
    },
    /// `Array(element)`.
    Array { element: Box<TypeDescriptor> },
    /// `Tuple(...)`, named iff any element carries a name.
    Tuple {
        elements: Vec<TypeDescriptor>,
        names: Option<Vec<String>>,
    },
    /// `Map(key, value)`.
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    /// `Nullable(inner)`.
    Nullable { inner: Box<TypeDescriptor> },
    /// `LowCardinality(inner)`.
    LowCardinality { inner: Box<TypeDescriptor> },
    /// `Variant(...)`, alternatives sorted lexicographically by their own
    /// canonical string representation (spec §3, §8 "Variant ordering").
    Variant { variants: Vec<TypeDescriptor> },
    /// `Dynamic([max_types=N])`.
    Dynamic { max_types: Option<u64> },
    /// `JSON(...)`.
    Json {
        /// Typed paths, in declaration order.
        typed_paths: Vec<(String, TypeDescriptor)>,
        max_dynamic_paths: Option<u64>,
    },
    /// `Nested(name type, ...)`.
    Nested { fields: Vec<(String, TypeDescriptor)> },
    /// `QBit(element, dimension)`.
    QBit {
        element: Box<TypeDescriptor>,
        dimension: u64,
    },
    /// `AggregateFunction(name, argType, ...)`.
    AggregateFunction {
        function_name: String,
        arg_types: Vec<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    /// Builds a `Decimal` descriptor from the generic `Decimal(precision,
    /// scale)` spelling, normalizing to the narrowest concrete width that
    /// covers `precision` (spec §4.2).
    pub fn decimal_from_precision_scale(precision: u32, scale: u32) -> TypeDescriptor {
        TypeDescriptor::Decimal {
            width: IntWidth::narrowest_decimal_for_precision(precision),
            precision,
            scale,
        }
    }

    /// Builds a `DecimalN(...)` descriptor for an explicit width, deriving
    /// `precision` from the width's default when only `scale` was given.
    pub fn decimal_for_width(width: IntWidth, precision: Option<u32>, scale: u32) -> TypeDescriptor {
        TypeDescriptor::Decimal {
            width,
            precision: precision.unwrap_or_else(|| width.default_decimal_precision()),
            scale,
        }
    }

    /// Sorts `Variant` alternatives lexicographically by their canonical
    /// string form, as spec §3/§8 require: this is what makes wire
    /// discriminant `d` agree between independently-built type strings
    /// `Variant(String, UInt64)` and `Variant(UInt64, String)`.
    pub fn normalize_variant_order(variants: &mut [TypeDescriptor]) {
        variants.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    }

    /// The bare constructor name (`"Array"`, `"Decimal32"`, `"Nullable"`,
    /// ...), without parameters. Used by error messages and by `AstNode`
    /// display code that wants the type family without its arguments.
    pub fn canonical_name(&self) -> String {
        match self {
            TypeDescriptor::Primitive(p) => p.type_name(),
            TypeDescriptor::FixedString { .. } => "FixedString".into(),
            TypeDescriptor::DateTime { .. } => "DateTime".into(),
            TypeDescriptor::DateTime64 { .. } => "DateTime64".into(),
            TypeDescriptor::Time64 { .. } => "Time64".into(),
            TypeDescriptor::Decimal { width, .. } => format!("Decimal{}", width.bits()),
            TypeDescriptor::Enum { width, .. } => format!("Enum{}", width.bits()),
            TypeDescriptor::Array { .. } => "Array".into(),
            TypeDescriptor::Tuple { .. } => "Tuple".into(),
            TypeDescriptor::Map { .. } => "Map".into(),
            TypeDescriptor::Nullable { .. } => "Nullable".into(),
            TypeDescriptor::LowCardinality { .. } => "LowCardinality".into(),
            TypeDescriptor::Variant { .. } => "Variant".into(),
            TypeDescriptor::Dynamic { .. } => "Dynamic".into(),
            TypeDescriptor::Json { .. } => "JSON".into(),
            TypeDescriptor::Nested { .. } => "Nested".into(),
            TypeDescriptor::QBit { .. } => "QBit".into(),
            TypeDescriptor::AggregateFunction { .. } => "AggregateFunction".into(),
        }
    }

    /// Whether this descriptor is the transparent pass-through
    /// `LowCardinality` wrapper, unwrapped to its inner type.
    pub fn strip_low_cardinality(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::LowCardinality { inner } => inner,
            other => other,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str("'")
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => write!(f, "{}", p.type_name()),
            TypeDescriptor::FixedString { length } => write!(f, "FixedString({length})"),
            TypeDescriptor::DateTime { timezone } => match timezone {
                Some(tz) => {
                    write!(f, "DateTime(")?;
                    write_quoted(f, tz)?;
                    write!(f, ")")
                }
                None => write!(f, "DateTime"),
            },
            TypeDescriptor::DateTime64 { precision, timezone } => match timezone {
                Some(tz) => {
                    write!(f, "DateTime64({precision}, ")?;
                    write_quoted(f, tz)?;
                    write!(f, ")")
                }
                None => write!(f, "DateTime64({precision})"),
            },
            TypeDescriptor::Time64 { precision } => write!(f, "Time64({precision})"),
            TypeDescriptor::Decimal {
                width,
                precision,
                scale,
            } => {
                if *precision == width.default_decimal_precision() {
                    write!(f, "Decimal{}({scale})", width.bits())
                } else {
                    write!(f, "Decimal{}({precision}, {scale})", width.bits())
                }
            }
            TypeDescriptor::Enum { width, values } => {
                write!(f, "Enum{}(", width.bits())?;
                for (i, (code, label)) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, label)?;
                    write!(f, " = {code}")?;
                }
                write!(f, ")")
            }
            TypeDescriptor::Array { element } => write!(f, "Array({element})"),
            TypeDescriptor::Tuple { elements, names } => {
                write!(f, "Tuple(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(names) = names {
                        if !names[i].is_empty() {
                            write!(f, "{} ", names[i])?;
                        }
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            TypeDescriptor::Map { key, value } => write!(f, "Map({key}, {value})"),
            TypeDescriptor::Nullable { inner } => write!(f, "Nullable({inner})"),
            TypeDescriptor::LowCardinality { inner } => write!(f, "LowCardinality({inner})"),
            TypeDescriptor::Variant { variants } => {
                write!(f, "Variant(")?;
                for (i, v) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            TypeDescriptor::Dynamic { max_types } => match max_types {
                Some(n) => write!(f, "Dynamic(max_types={n})"),
                None => write!(f, "Dynamic"),
            },
            TypeDescriptor::Json {
                typed_paths,
                max_dynamic_paths,
            } => {
                write!(f, "JSON(")?;
                let mut first = true;
                if let Some(n) = max_dynamic_paths {
                    write!(f, "max_dynamic_paths={n}")?;
                    first = false;
                }
                for (path, ty) in typed_paths {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{path} {ty}")?;
                }
                write!(f, ")")
            }
            TypeDescriptor::Nested { fields } => {
                write!(f, "Nested(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} {ty}")?;
                }
                write!(f, ")")
            }
            TypeDescriptor::QBit { element, dimension } => {
                write!(f, "QBit({element}, {dimension})")
            }
            TypeDescriptor::AggregateFunction {
                function_name,
                arg_types,
            } => {
                write!(f, "AggregateFunction({function_name}")?;
                for ty in arg_types {
                    write!(f, ", {ty}")?;
                }
                write!(f, ")")
            }
        }
    }
}
