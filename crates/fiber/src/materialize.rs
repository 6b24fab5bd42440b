//! Materializer capability and the in-memory reference output tree
//!
//! The engine never constructs output nodes itself; it asks a materializer
//! for opaque handles and tells it which properties to apply and which
//! handles to attach where. Handles are u32 ids minted by the materializer,
//! so fibers can record them without generics or pointers.
//!
//! Two disjoint handle kinds exist: text handles (value-bearing leaves that
//! cannot hold children) and structural handles.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{FiberError, Result};
use crate::types::{HandleId, NodeKind, PropValue, Props, DOCUMENT_TAG};

/// Capability for allocating and wiring output nodes
///
/// Implementations must not attach anything on `create` or `set_prop`;
/// attachment is a separate step driven by the commit walk.
pub trait Materializer {
    /// Produce a new, detached output handle for a node kind
    fn create(&mut self, kind: &NodeKind) -> Result<HandleId>;

    /// Apply one property onto a handle. Called once per property, in the
    /// description's insertion order.
    fn set_prop(&mut self, handle: HandleId, name: &str, value: &PropValue) -> Result<()>;

    /// Attach `child` beneath `parent`, after any previously attached child
    fn attach(&mut self, parent: HandleId, child: HandleId) -> Result<()>;
}

/// One node of the in-memory output tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputNode {
    pub id: HandleId,
    pub kind: NodeKind,
    /// Applied properties, in application order
    pub props: Props,
    pub parent: Option<HandleId>,
    pub children: SmallVec<[HandleId; 4]>,
}

impl OutputNode {
    fn new(id: HandleId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            props: Props::new(),
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind.is_text()
    }
}

/// In-memory materializer: a Vec-arena of output nodes
///
/// The reference target for tests, examples, and any host that wants a
/// plain tree it can walk afterwards. `attach` enforces the single-attach
/// discipline: a handle that already has a parent cannot be attached again.
#[derive(Debug, Default)]
pub struct TreeMaterializer {
    nodes: Vec<OutputNode>,
}

impl TreeMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Mint a detached container node to render into
    pub fn container(&mut self) -> HandleId {
        self.alloc(NodeKind::Element(DOCUMENT_TAG.to_string()))
    }

    /// Get node by handle (immutable)
    pub fn get(&self, handle: HandleId) -> Result<&OutputNode> {
        self.nodes
            .get(handle as usize)
            .ok_or(FiberError::HandleNotFound(handle))
    }

    fn get_mut(&mut self, handle: HandleId) -> Result<&mut OutputNode> {
        self.nodes
            .get_mut(handle as usize)
            .ok_or(FiberError::HandleNotFound(handle))
    }

    /// Get the attached children of a node, in attach order
    pub fn children_of(&self, handle: HandleId) -> Result<Vec<&OutputNode>> {
        let node = self.get(handle)?;
        node.children.iter().map(|&id| self.get(id)).collect()
    }

    /// Find the first node carrying a property with the given value
    pub fn find_by_prop(&self, name: &str, value: &PropValue) -> Option<HandleId> {
        self.nodes
            .iter()
            .find(|node| node.props.get(name) == Some(value))
            .map(|node| node.id)
    }

    /// Total number of nodes ever materialized (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, kind: NodeKind) -> HandleId {
        let id = self.nodes.len() as HandleId;
        self.nodes.push(OutputNode::new(id, kind));
        id
    }
}

impl Materializer for TreeMaterializer {
    fn create(&mut self, kind: &NodeKind) -> Result<HandleId> {
        Ok(self.alloc(kind.clone()))
    }

    fn set_prop(&mut self, handle: HandleId, name: &str, value: &PropValue) -> Result<()> {
        if name == crate::types::CHILDREN_PROP {
            return Err(FiberError::Materialization(format!(
                "'{}' is a reserved property name",
                crate::types::CHILDREN_PROP
            )));
        }
        self.get_mut(handle)?.props.set(name, value.clone());
        Ok(())
    }

    fn attach(&mut self, parent: HandleId, child: HandleId) -> Result<()> {
        if self.get(parent)?.is_text() {
            return Err(FiberError::Materialization(format!(
                "text handle {} cannot hold children",
                parent
            )));
        }
        let child_node = self.get_mut(child)?;
        if let Some(existing) = child_node.parent {
            return Err(FiberError::Materialization(format!(
                "handle {} is already attached beneath {}",
                child, existing
            )));
        }
        child_node.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }
}
