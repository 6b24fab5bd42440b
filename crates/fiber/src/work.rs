//! Unit-of-work processing and the commit walk
//!
//! A unit of work is the smallest interruptible step: fully processing one
//! fiber. [`advance`] does exactly one unit and hands back the next fiber to
//! visit, so a caller can stop between any two fibers and resume later with
//! nothing on the call stack.
//!
//! Output handles are only linked to their parents in [`commit_tree`], after
//! the whole tree has been processed. Until then the container shows none of
//! the pass's output, which keeps a published tree complete and consistent.

use crate::arena::FiberArena;
use crate::error::{FiberError, Result};
use crate::materialize::Materializer;
use crate::types::{Fiber, FiberId};

/// Process one fiber and return the next one to visit, or `None` when the
/// pass is complete.
///
/// In fixed order:
/// 1. Materialize the fiber's output handle if it does not exist yet, and
///    apply its properties in insertion order. The pass root never takes
///    this path; its handle is the externally supplied container.
/// 2. Expand the fiber's pending child descriptions into linked child
///    fibers, first child on `child`, the rest chained through `sibling`.
/// 3. Pick the next fiber: the first child if any, otherwise the nearest
///    sibling found walking ancestor-ward, otherwise `None`.
///
/// The resulting visit order is pre-order, depth-first, left-to-right: the
/// order in which children were declared.
pub fn advance<M>(arena: &mut FiberArena, id: FiberId, materializer: &mut M) -> Result<Option<FiberId>>
where
    M: Materializer + ?Sized,
{
    // 1. Ensure the output handle exists
    let fiber = arena.get(id)?;
    if fiber.is_text() && !fiber.pending_children().is_empty() {
        // Only reachable through hand-built descriptions; the JSON path
        // rejects this shape up front
        return Err(FiberError::InvalidDescription(
            "text nodes cannot carry children".to_string(),
        ));
    }
    if fiber.handle.is_none() {
        let kind = fiber.kind.clone();
        let handle = materializer.create(&kind)?;

        let fiber = arena.get(id)?;
        for (name, value) in fiber.props.iter() {
            materializer.set_prop(handle, name, value)?;
        }

        arena.get_mut(id)?.handle = Some(handle);
    }

    // 2. Expand children into linked fibers, in declaration order
    let pending = arena.get_mut(id)?.take_pending();
    let mut prev: Option<FiberId> = None;
    for description in pending {
        let child_id = arena.add(Fiber::from_description(description, Some(id)));
        match prev {
            None => arena.get_mut(id)?.child = Some(child_id),
            Some(prev_id) => arena.get_mut(prev_id)?.sibling = Some(child_id),
        }
        prev = Some(child_id);
    }

    // 3. Next unit: first child, else nearest ancestor sibling
    if let Some(child) = arena.get(id)?.child {
        return Ok(Some(child));
    }

    let mut current = id;
    loop {
        let fiber = arena.get(current)?;
        if let Some(sibling) = fiber.sibling {
            return Ok(Some(sibling));
        }
        match fiber.parent {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }
}

/// Attach every processed fiber's handle beneath its parent's handle, in one
/// pre-order walk over the completed tree. Returns the number of attachments.
///
/// The pass root is skipped (no parent; its handle is the container). Any
/// other fiber missing a handle means the tree was not fully processed,
/// which is an invariant breach, not a skippable node.
pub fn commit_tree<M>(arena: &FiberArena, root: FiberId, materializer: &mut M) -> Result<usize>
where
    M: Materializer + ?Sized,
{
    let mut attached = 0;
    arena.traverse_df(root, |id, fiber| {
        if let Some(parent) = fiber.parent {
            let handle = fiber.handle.ok_or(FiberError::HandleMissing(id))?;
            let parent_handle = arena
                .get(parent)?
                .handle
                .ok_or(FiberError::HandleMissing(parent))?;
            materializer.attach(parent_handle, handle)?;
            attached += 1;
        }
        Ok(())
    })?;
    Ok(attached)
}
