//! Unified error type for the interception engine.

use thiserror::Error;

/// All errors surfaced by the interception layer.
///
/// Configuration-time errors (`TypeMismatch`, `NoReturnValue`,
/// `AmbiguousOrMissing`, `ArgumentMismatch`, `TooManyParameters`,
/// `InvalidEntryPoint`) are validated eagerly, before anything executes.
/// `NotRunning` and `CorrelationFault` indicate corruption of the activation
/// state and are not user-recoverable; a session aborts its whole cycle.
#[derive(Debug, Error)]
pub enum ShimError {
    /// Return value incompatible with the member's declared return type.
    #[error("cannot set return value of type {got} on {member}, which returns {expected}")]
    TypeMismatch {
        member: String,
        expected: String,
        got: String,
    },

    /// Attempted to configure a return on a member with no return channel.
    #[error("cannot set a return value on {member}, which does not return a value")]
    NoReturnValue { member: String },

    /// Logging attempted while the record is not the active record.
    #[error("cannot log call for {member}: no matching shim is running")]
    NotRunning { member: String },

    /// A trampoline announced a token the registry does not know.
    #[error("no interception record registered for correlation token {token}")]
    CorrelationFault { token: String },

    /// A name or probe lookup matched zero or more than one record.
    #[error("selector `{selector}` matched {matches} interception records")]
    AmbiguousOrMissing { selector: String, matches: usize },

    /// The argument list handed to `execute` does not fit the entry point.
    #[error("argument list does not match entry point parameters: {reason}")]
    ArgumentMismatch { reason: String },

    /// The member exceeds the fixed parameter ceiling.
    #[error("{member} has {count} parameters; members with more than 10 parameters are not supported")]
    TooManyParameters { member: String, count: usize },

    /// The entry point cannot anchor a session as requested.
    #[error("invalid entry point: {reason}")]
    InvalidEntryPoint { reason: String },

    /// A fault propagated out of the redirection engine.
    #[error("engine fault: {0}")]
    Engine(anyhow::Error),
}

impl From<anyhow::Error> for ShimError {
    fn from(err: anyhow::Error) -> Self {
        // Recover typed interception errors raised inside trampolines.
        match err.downcast::<ShimError>() {
            Ok(shim) => shim,
            Err(other) => ShimError::Engine(other),
        }
    }
}
