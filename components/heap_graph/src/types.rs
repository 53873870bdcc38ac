//! Type definitions for captured heap graphs
//!
//! Node and edge categories mirror the ones a managed runtime's heap profiler
//! reports for every object in a snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a heap object
///
/// Identifiers are assigned by the heap profiler and stay stable for the
/// lifetime of an object, so the same object carries the same id in every
/// snapshot taken from one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Position of a node inside one particular snapshot
///
/// Only meaningful for the snapshot that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub usize);

/// Category of a heap node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Hidden engine-internal node
    Hidden,
    /// Internal array backing store
    Array,
    /// Flat string
    String,
    /// User-visible object; the only kind that carries a class name
    Object,
    /// Compiled code
    Code,
    /// Function closure
    Closure,
    /// Regular expression
    RegExp,
    /// Boxed number that does not fit in a tagged small integer
    #[serde(rename = "number")]
    HeapNumber,
    /// Object owned by native code
    Native,
    /// Synthetic node such as the snapshot root
    Synthetic,
    /// Concatenated string
    #[serde(rename = "concatenated string")]
    ConsString,
    /// Substring view into another string
    #[serde(rename = "sliced string")]
    SlicedString,
    /// Symbol
    Symbol,
}

impl NodeType {
    /// Whether this node carries a meaningful class name
    pub fn is_object(self) -> bool {
        matches!(self, NodeType::Object)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hidden => "hidden",
            Self::Array => "array",
            Self::String => "string",
            Self::Object => "object",
            Self::Code => "code",
            Self::Closure => "closure",
            Self::RegExp => "regexp",
            Self::HeapNumber => "number",
            Self::Native => "native",
            Self::Synthetic => "synthetic",
            Self::ConsString => "concatenated string",
            Self::SlicedString => "sliced string",
            Self::Symbol => "symbol",
        };
        f.write_str(name)
    }
}

/// Category of an outgoing reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeType {
    /// Variable captured by a function context
    ContextVariable,
    /// Indexed array element
    Element,
    /// Named property
    Property,
    /// Engine bookkeeping (string slices, relocation data)
    Internal,
    /// Back-reference kept for retainer bookkeeping
    Hidden,
    /// Shortcut through bound-function glue objects
    Shortcut,
    /// Weak reference
    Weak,
}

/// A typed reference from one node to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapEdge {
    /// Kind of reference
    pub edge_type: EdgeType,
    /// Target node inside the same snapshot
    pub to: NodeIndex,
}

impl HeapEdge {
    /// Create a new edge
    pub fn new(edge_type: EdgeType, to: NodeIndex) -> Self {
        Self { edge_type, to }
    }
}

/// Read-only view of one node in a captured graph
#[derive(Debug, Clone, Copy)]
pub struct GraphNode<'a> {
    /// Object identity
    pub id: ObjectId,
    /// Node category
    pub node_type: NodeType,
    /// Shallow size in bytes
    pub self_size: u64,
    /// Display name; the class name for object nodes
    pub name: &'a str,
    /// Outgoing references
    pub edges: &'a [HeapEdge],
}
