//! Incremental tree materialization library
//!
//! Converts an immutable, declarative node description into a mutable output
//! tree one small step at a time, so a caller can pause after any node and
//! resume later without holding anything on the call stack.
//!
//! ## Core Design
//!
//! ```text
//! Description (immutable) → Fiber arena (u32 links) → advance() per unit
//!                                     ↓
//!                          commit_tree() → Materializer → output tree
//! ```
//!
//! - **Fibers over recursion**: parent/child/sibling indices in a Vec arena
//!   carry the full traversal state, making every node a resumable unit
//! - **Commit is the only attach point**: the output target never shows a
//!   half-built tree; handles stay detached until the whole pass finishes
//! - **Materialization is a capability**: the engine asks a [`Materializer`]
//!   for handles and never constructs output nodes itself

pub mod arena;
pub mod description;
pub mod error;
pub mod materialize;
pub mod serializer;
pub mod types;
pub mod work;

pub use arena::FiberArena;
pub use description::Description;
pub use error::{FiberError, Result};
pub use materialize::{Materializer, OutputNode, TreeMaterializer};
pub use serializer::{OutputSerializer, SerializerConfig};
pub use types::*;
