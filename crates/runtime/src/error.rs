//! Session-level error types
//!
//! Every failure is terminal for its render pass, never for the session:
//! the committed tree survives, the pending tree is discarded, and the next
//! render starts clean.

use thiserror::Error;

use crate::events::PassId;
use fiber::FiberError;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("render pass {pass} aborted: {source}")]
    PassAborted {
        pass: PassId,
        #[source]
        source: FiberError,
    },
}
