//! shimbox: a call-interception framework for test isolation.
//!
//! Given a program entry point, a [`ShimSession`] discovers every callable
//! member the entry point transitively invokes, replaces each with a
//! substitute that records every invocation and returns a configurable
//! value, and restores the real behavior when the session ends. Tests use
//! it to avoid executing real dependencies while asserting on exactly how
//! they were called.
//!
//! ## Layers
//!
//! - [`shimbox_model`] (re-exported as [`model`]): the program under test —
//!   types, values, member descriptors, compiled bodies.
//! - [`shimbox_redirect`] (re-exported as [`redirect`]): the redirection
//!   engine that executes an entry point with a call resolver consulted at
//!   every call site.
//! - This crate: interception records and their call logs, the correlation
//!   registry, trampoline generation, call-graph discovery, the resolution
//!   matcher, and the session facade.
//!
//! ## Example
//!
//! ```ignore
//! let mut session = ShimSession::returning(
//!     program, heap, entry, TypeTag::Bool, None, DiscoveryOptions::default(),
//! )?;
//! session.set_return_value_by_name("Calculator.foo", Value::Int(3))?;
//! let out = session.execute(&[])?;
//! let calls = session.logs_for_name("Calculator.foo")?;
//! ```

pub mod discovery;
pub mod error;
pub mod matcher;
pub mod record;
pub mod registry;
pub mod report;
pub mod session;
pub mod synth;
mod trampoline;

pub use discovery::{discover, DiscoveryOptions};
pub use error::ShimError;
pub use matcher::ShimMatcher;
pub use record::{CallEntry, ShimRecord, MAX_PARAMETERS};
pub use registry::ShimToken;
pub use report::{RecordReport, SessionReport};
pub use session::ShimSession;
pub use synth::synthesize_default;

pub use shimbox_model as model;
pub use shimbox_redirect as redirect;
