//! Interpreter fault taxonomy.

use thiserror::Error;

/// Faults raised by the body interpreter. These indicate malformed programs
/// or user aborts, not interception-layer configuration errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("{member} has no compiled body")]
    MissingBody { member: String },

    #[error("operand stack underflow in {member}")]
    StackUnderflow { member: String },

    #[error("{member} expects {expected} arguments, got {got}")]
    ArityMismatch {
        member: String,
        expected: usize,
        got: usize,
    },

    #[error("type fault in {member}: {detail}")]
    TypeFault { member: String, detail: String },

    #[error("null receiver in call to {member}")]
    NullReceiver { member: String },

    #[error("dangling instance reference in {member}")]
    DanglingInstance { member: String },

    #[error("{member} aborted with code {code}")]
    Abort { member: String, code: u64 },

    #[error("call depth exceeded the limit of {limit}")]
    CallDepthExceeded { limit: usize },

    #[error("no native implementation for {member}")]
    UnknownNative { member: String },
}
