//! Error types for Dimension
//!
//! TigerStyle: Explicit error types with context, using thiserror.

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
///
/// Boundary validation lives here: a malformed node id, datemark or scope
/// name is rejected before it can reach any state machine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid node ID: {id}, reason: {reason}")]
    InvalidNodeId { id: String, reason: String },

    #[error("Invalid datemark: {value}, reason: {reason}")]
    InvalidDatemark { value: String, reason: String },

    #[error("Unknown lock scope: {name}")]
    UnknownScope { name: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}
