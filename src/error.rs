//! Error kinds for the Shield analysis pipeline.
//!
//! Decode and collaborator-unavailable failures are caught and degraded by
//! the analyzers themselves; network/RPC errors on a primary transaction
//! fetch are expected to propagate to the orchestrator's caller unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShieldError {
    #[error("network error: {0}")]
    Network(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("not found")]
    NotFound,

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type ShieldResult<T> = Result<T, ShieldError>;
