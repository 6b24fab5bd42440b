//! Core type definitions for descriptions and fibers
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Descriptions are immutable values, fibers are mutable bookkeeping
//! 3. Use SmallVec for property lists (most nodes carry few properties)
//! 4. Property order is insertion order, and application follows it

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::description::Description;

/// Fiber identifier (index into a pass arena)
/// u32 allows 4 billion fibers per pass, enough for any tree
pub type FiberId = u32;

/// Output handle identifier, minted by the materializer.
/// Opaque to the engine; only the materializer can dereference it.
pub type HandleId = u32;

/// Reserved tag naming the primitive text marker
pub const TEXT_TAG: &str = "#text";

/// Synthetic tag carried by a pass root; never materialized
pub const DOCUMENT_TAG: &str = "#document";

/// Property name carrying a text node's value
pub const VALUE_PROP: &str = "value";

/// Reserved property name; children never travel through the property map
pub const CHILDREN_PROP: &str = "children";

/// Node kind: a text primitive or a structural node with a tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Structural node with a tag name ("div", "panel", ...)
    Element(String),
    /// Primitive text leaf; its content lives in the `value` property
    Text,
}

impl NodeKind {
    /// Map a tag string to its kind. The `#text` tag is reserved.
    pub fn from_tag(tag: &str) -> Self {
        if tag == TEXT_TAG {
            NodeKind::Text
        } else {
            NodeKind::Element(tag.to_string())
        }
    }

    /// The tag string for this kind
    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Element(tag) => tag,
            NodeKind::Text => TEXT_TAG,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text)
    }
}

/// Property value
///
/// Untagged so the JSON form reads naturally: `{"id": "a", "rows": 3}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl std::fmt::Display for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropValue::Text(s) => write!(f, "{}", s),
            PropValue::Int(n) => write!(f, "{}", n),
            PropValue::Float(n) => write!(f, "{}", n),
            PropValue::Bool(b) => write!(f, "{}", b),
            PropValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// Insertion-ordered property list
///
/// Properties are applied onto output handles in exactly this order, so a
/// later property overrides an earlier one with the same name. `set` on an
/// existing name replaces the value in place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Props(SmallVec<[(String, PropValue); 4]>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chainable setter for building literals:
    /// `Props::new().with("id", "a").with("rows", 3)`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property, replacing in place if the name already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One node's mutable position within a single render pass
///
/// Design:
/// - Explicit parent/child/sibling indices replace the call stack, so a
///   traversal can stop after any fiber and resume later
/// - `pending` holds the child descriptions this fiber has not expanded
///   yet; expansion drains it exactly once
/// - `alternate` points at the fiber occupying the same position in the
///   previously committed tree (resolved against that tree's arena);
///   recorded for future reuse, unused beyond storage today
#[derive(Debug, Clone)]
pub struct Fiber {
    pub kind: NodeKind,
    pub props: Props,

    /// Output handle; absent until the processor visits this fiber.
    /// Once created it is never replaced for the fiber's lifetime.
    pub handle: Option<HandleId>,

    // Navigation indices
    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,

    /// Counterpart in the previously committed tree, if any
    pub alternate: Option<FiberId>,

    /// Child descriptions awaiting expansion
    pending: Vec<Description>,
}

impl Fiber {
    /// Build a fiber by consuming a description. The description's children
    /// move into `pending` and are expanded when this fiber is processed.
    pub fn from_description(description: Description, parent: Option<FiberId>) -> Self {
        let Description {
            kind,
            props,
            children,
        } = description;
        Self {
            kind,
            props,
            handle: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            pending: children,
        }
    }

    /// Build the synthetic root of a render pass. Its handle is the
    /// externally supplied container and is never materialized here.
    pub fn pass_root(
        container: HandleId,
        description: Description,
        alternate: Option<FiberId>,
    ) -> Self {
        Self {
            kind: NodeKind::Element(DOCUMENT_TAG.to_string()),
            props: Props::new(),
            handle: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            pending: vec![description],
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind.is_text()
    }

    /// Child descriptions not yet expanded
    pub fn pending_children(&self) -> &[Description] {
        &self.pending
    }

    pub(crate) fn take_pending(&mut self) -> Vec<Description> {
        std::mem::take(&mut self.pending)
    }
}
