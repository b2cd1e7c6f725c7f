//! The parse tree itself: [`AstNode`], [`ParsedData`], and the decoded
//! value representation that fills each node's `value` field.

use std::borrow::Cow;

use num_bigint::{BigInt, BigUint};
use smallvec::SmallVec;

use crate::range::ByteRange;
use crate::types::TypeDescriptor;

/// A node identifier, unique within one decode invocation only (spec §4.6:
/// "it has no cross-decode meaning").
pub type NodeId = u64;

/// The per-decode monotonic counter that assigns [`NodeId`]s.
///
/// Kept as an explicit, threaded-through struct rather than a global/atomic
/// counter: per spec §9, "Global state: none."
#[derive(Debug, Default)]
pub struct NodeIdGen(NodeId);

impl NodeIdGen {
    /// A fresh counter starting at zero.
    pub fn new() -> Self {
        NodeIdGen(0)
    }

    /// Allocates and returns the next id.
    pub fn next(&mut self) -> NodeId {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// The decoded semantic value of a node.
///
/// Container types (`Array`, `Tuple`, `Map`, `Nested`, ...) carry
/// `Composite` here and put their real content in `children`; everything a
/// caller would want from a container is reachable by walking those
/// children instead of duplicating it in `value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A SQL `NULL`, or the `Nothing` dynamic type at the top of a value.
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    /// 128/256-bit unsigned integers.
    BigUInt(BigUint),
    /// 128/256-bit signed integers.
    BigInt(BigInt),
    Float(f64),
    Text(String),
    /// The value's content is entirely represented by this node's children.
    Composite,
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A `metadata` entry value (spec §4.6's `scale`, `rawValue`, `timezone`,
/// etc.).
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Int(i64),
    UInt(u64),
    Text(String),
    Bool(bool),
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<u64> for MetadataValue {
    fn from(v: u64) -> Self {
        MetadataValue::UInt(v)
    }
}

impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        MetadataValue::UInt(v as u64)
    }
}

impl From<usize> for MetadataValue {
    fn from(v: usize) -> Self {
        MetadataValue::UInt(v as u64)
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

/// Small aggregate of `(key, value)` metadata entries. `SmallVec<[T; 4]>`
/// following the teacher's `value::C<T>` idiom: most nodes carry at most a
/// handful of metadata entries, so this avoids a heap allocation for the
/// common case.
pub type Metadata = SmallVec<[(Cow<'static, str>, MetadataValue); 4]>;

/// One node of the parse tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub id: NodeId,
    /// Display string for the concrete type, e.g. `"Decimal32(2)"`.
    pub type_name: String,
    pub byte_range: ByteRange,
    pub value: Value,
    pub display_value: String,
    pub children: Vec<AstNode>,
    pub label: Option<Cow<'static, str>>,
    pub metadata: Option<Metadata>,
}

impl AstNode {
    /// Builds a leaf node: no children, metadata, or label yet (chain
    /// [`AstNode::with_label`]/[`AstNode::with_metadata_entry`] as needed).
    pub fn leaf(
        id: NodeId,
        type_name: impl Into<String>,
        byte_range: ByteRange,
        value: Value,
        display_value: impl Into<String>,
    ) -> Self {
        AstNode {
            id,
            type_name: type_name.into(),
            byte_range,
            value,
            display_value: display_value.into(),
            children: Vec::new(),
            label: None,
            metadata: None,
        }
    }

    /// Builds a container node whose `byte_range` is the union of its
    /// children's ranges, and whose `value` is [`Value::Composite`].
    pub fn container(
        id: NodeId,
        type_name: impl Into<String>,
        display_value: impl Into<String>,
        children: Vec<AstNode>,
    ) -> Self {
        let byte_range = children
            .iter()
            .map(|c| c.byte_range)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(ByteRange::empty_at(0));
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

    /// Attaches a contextual label (`[i]`, a field name, `"key"`/`"value"`,
    /// `"length"`, ...).
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds one metadata entry, creating the metadata map on first use.
    pub fn with_metadata_entry(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<MetadataValue>,
    ) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .push((key.into(), value.into()));
        self
    }

    /// A left-to-right, depth-first traversal of this node and all of its
    /// descendants (this node first, i.e. pre-order).
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst { stack: vec![self] }
    }

    /// Whether this node has no descendants.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Iterator returned by [`AstNode::iter_depth_first`].
#[derive(Debug)]
pub struct DepthFirst<'a> {
    stack: Vec<&'a AstNode>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a AstNode;

    fn next(&mut self) -> Option<&'a AstNode> {
        let node = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

/// One column definition from the shared header: its name, its type
/// string, the parsed [`TypeDescriptor`], and the exact byte ranges of
/// both the name and the type string fields (spec §4.4: "Every field's
/// byte range is recorded").
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHeaderEntry {
    pub name: String,
    pub name_range: ByteRange,
    pub type_string: String,
    pub type_range: ByteRange,
    pub type_descriptor: TypeDescriptor,
}

/// The header shared by both formats: an ordered list of column
/// definitions plus the byte range of the header as a whole (including its
/// own column-count prefix).
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub entries: Vec<ColumnHeaderEntry>,
    pub byte_range: ByteRange,
}

impl Header {
    /// All byte ranges the header itself consumed (count prefix is part of
    /// `byte_range`; name/type ranges are per-entry), used by coverage
    /// computation.
    fn leaf_ranges(&self) -> Vec<ByteRange> {
        let mut ranges = Vec::with_capacity(self.entries.len() * 2 + 1);
        ranges.push(self.byte_range);
        for entry in &self.entries {
            ranges.push(entry.name_range);
            ranges.push(entry.type_range);
        }
        ranges
    }
}

/// Which wire format a [`ParsedData`] was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// The row-oriented format (header, then rows until EOF).
    Row,
    /// The column-oriented block format (repeated blocks until EOF).
    Column,
}

/// The top-level result of a decode: the format tag, the shared header,
/// the total input length, and exactly one of `rows`/`blocks`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedData {
    pub format: Format,
    pub header: Header,
    pub total_bytes: usize,
    /// Populated when `format == Format::Row`; one node per row.
    pub rows: Option<Vec<AstNode>>,
    /// Populated when `format == Format::Column`; one node per block.
    pub blocks: Option<Vec<AstNode>>,
}

impl ParsedData {
    /// Builds the result of a row-oriented decode.
    pub fn from_rows(header: Header, total_bytes: usize, rows: Vec<AstNode>) -> Self {
        ParsedData {
            format: Format::Row,
            header,
            total_bytes,
            rows: Some(rows),
            blocks: None,
        }
    }

    /// Builds the result of a column-oriented decode.
    pub fn from_blocks(header: Header, total_bytes: usize, blocks: Vec<AstNode>) -> Self {
        ParsedData {
            format: Format::Column,
            header,
            total_bytes,
            rows: None,
            blocks: Some(blocks),
        }
    }

    /// The top-level nodes, regardless of which format produced them.
    pub fn top_level_nodes(&self) -> &[AstNode] {
        match (&self.rows, &self.blocks) {
            (Some(rows), None) => rows,
            (None, Some(blocks)) => blocks,
            _ => &[],
        }
    }

    /// The union of every leaf node's byte range (plus the header's own
    /// recorded ranges), merged into disjoint, sorted intervals.
    ///
    /// This is the building block for the coverage property in spec §8; it
    /// does not itself implement hex-view linkage or coverage analysis
    /// (those stay with the out-of-scope downstream tooling), it just
    /// exposes the ranges the tree already carries.
    pub fn leaf_ranges(&self) -> Vec<ByteRange> {
        let mut ranges = self.header.leaf_ranges();
        for top in self.top_level_nodes() {
            ranges.extend(top.iter_depth_first().filter(|n| n.is_leaf()).map(|n| n.byte_range));
        }
        merge_ranges(ranges)
    }

    /// Fraction of `total_bytes` covered by [`ParsedData::leaf_ranges`], in
    /// `[0.0, 1.0]`.
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        let covered: usize = self.leaf_ranges().iter().map(ByteRange::len).sum();
        covered as f64 / self.total_bytes as f64
    }
}

/// Sorts and merges overlapping/adjacent ranges into the minimal set of
/// disjoint intervals covering the same bytes.
fn merge_ranges(mut ranges: Vec<ByteRange>) -> Vec<ByteRange> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<ByteRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
