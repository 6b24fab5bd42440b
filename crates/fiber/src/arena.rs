//! Arena storage for the fiber tree of one render pass
//!
//! One `Vec<Fiber>` per pass, indexed by `FiberId`:
//! - No Rc/Arc overhead, no recursive ownership
//! - Fibers stored in creation order (which is visit order)
//! - Links are indices, so pausing a traversal costs nothing
//!
//! The arena is dumb storage plus traversal helpers; the processing
//! algorithm lives in [`crate::work`].

use crate::error::{FiberError, Result};
use crate::types::{Fiber, FiberId};

/// Arena allocator for the fibers of a single render pass
#[derive(Debug, Default)]
pub struct FiberArena {
    /// All fibers stored sequentially (cache-friendly)
    fibers: Vec<Fiber>,

    /// Pass root (if set)
    root: Option<FiberId>,
}

impl FiberArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            fibers: Vec::new(),
            root: None,
        }
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fibers: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Add a fiber to the arena, returns its ID
    pub fn add(&mut self, fiber: Fiber) -> FiberId {
        let id = self.fibers.len() as FiberId;
        self.fibers.push(fiber);
        id
    }

    /// Get fiber by ID (immutable)
    pub fn get(&self, id: FiberId) -> Result<&Fiber> {
        self.fibers
            .get(id as usize)
            .ok_or(FiberError::FiberNotFound(id))
    }

    /// Get fiber by ID (mutable)
    pub fn get_mut(&mut self, id: FiberId) -> Result<&mut Fiber> {
        self.fibers
            .get_mut(id as usize)
            .ok_or(FiberError::FiberNotFound(id))
    }

    /// Mark the pass root. The ID must have come from [`FiberArena::add`].
    pub fn set_root(&mut self, id: FiberId) {
        self.root = Some(id);
    }

    /// Get root fiber ID
    pub fn root_id(&self) -> Option<FiberId> {
        self.root
    }

    /// Get root fiber
    pub fn root(&self) -> Result<&Fiber> {
        let root = self
            .root
            .ok_or_else(|| FiberError::InvalidDescription("no pass root set".to_string()))?;
        self.get(root)
    }

    /// Total number of fibers
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Iterator over all fibers
    pub fn iter(&self) -> impl Iterator<Item = &Fiber> {
        self.fibers.iter()
    }

    /// Iterator over all fiber IDs
    pub fn fiber_ids(&self) -> impl Iterator<Item = FiberId> + '_ {
        (0..self.fibers.len()).map(|i| i as FiberId)
    }

    /// Traverse the linked tree depth-first, pre-order (iterative, no
    /// recursion): node first, then its child chain, then its sibling chain.
    /// This is the same order the processor visits fibers in.
    pub fn traverse_df<F>(&self, start: FiberId, mut visit: F) -> Result<()>
    where
        F: FnMut(FiberId, &Fiber) -> Result<()>,
    {
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            let fiber = self.get(id)?;
            visit(id, fiber)?;

            // Sibling below child on the stack, so the whole child subtree
            // is visited before the next sibling
            if id != start {
                if let Some(sibling) = fiber.sibling {
                    stack.push(sibling);
                }
            }
            if let Some(child) = fiber.child {
                stack.push(child);
            }
        }

        Ok(())
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.fibers.clear();
        self.root = None;
    }
}
