//! Redirection engine for the shimbox workspace.
//!
//! Executes a program entry point inside an isolation scope in which every
//! call site is first offered to a [`CallResolver`]; a resolved substitute
//! runs in place of the real implementation, and everything else falls
//! through to the body interpreter. Registrations are scoped to one
//! [`isolate`] call and deactivate when it returns, regardless of outcome.

pub mod error;
pub mod interp;
pub mod natives;
pub mod plan;
pub mod resolver;
pub mod substitute;

pub use error::EngineError;
pub use interp::{execute_direct, isolate, ExecCtx, MAX_CALL_DEPTH};
pub use plan::{Redirection, RedirectionBuilder, RedirectionPlan};
pub use resolver::{CallResolver, NoRedirections};
pub use substitute::Substitute;
