//! Error types for tree reconciliation
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

use crate::types::{FiberId, HandleId};

pub type Result<T> = std::result::Result<T, FiberError>;

#[derive(Debug, Error)]
pub enum FiberError {
    #[error("invalid description: {0}")]
    InvalidDescription(String),

    #[error("fiber not found: {0}")]
    FiberNotFound(FiberId),

    #[error("output handle not found: {0}")]
    HandleNotFound(HandleId),

    #[error("fiber {0} reached commit without an output handle")]
    HandleMissing(FiberId),

    #[error("materialization failed: {0}")]
    Materialization(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
