//! Cooperative render runtime
//!
//! This crate drives the `fiber` data layer from a host's idle loop. A
//! [`RenderSession`] owns one render pass at a time plus the last committed
//! tree, processes one fiber per unit of work, and yields whenever the
//! host-supplied [`Deadline`] says the turn is over.
//!
//! # Architecture
//!
//! 1. **Single-threaded by contract**: every mutation happens inside
//!    `render()` or `tick()`; suspension only occurs between whole units
//! 2. **The host owns time**: the engine queries a deadline oracle and
//!    never sleeps, spawns, or registers callbacks itself
//! 3. **Queued, not discarded**: renders arriving mid-pass wait their turn;
//!    a started pass always runs to commit or to a reported abort

pub mod error;
pub mod events;
pub mod host;
pub mod session;

pub use error::{Result, SessionError};
pub use events::{EventBus, PassId, RenderEvent};
pub use host::{Deadline, Exhausted, TimeSlice, Unconstrained};
pub use session::{CommittedTree, RenderSession, SessionConfig, TickStatus};
