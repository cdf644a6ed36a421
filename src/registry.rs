//! The correlation registry: token-to-record table plus the activation
//! stack.
//!
//! The registry is thread-local (one logical thread of control per session;
//! parallel test processes never share it). A trampoline pushes an
//! activation frame immediately before logging and the frame pops on scope
//! exit via [`ActivationGuard`], guaranteed on all exit paths including
//! failure. The record at the top of the stack is "the active record";
//! nested activation through pass-through is representable.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use tracing::trace;
use uuid::Uuid;

use crate::error::ShimError;
use crate::record::ShimRecord;

/// Opaque correlation token, minted once per interception record. The
/// generated trampoline captures it by value so it can announce "I am now
/// running" without carrying a typed record reference across the narrow
/// entry surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShimToken(Uuid);

impl ShimToken {
    pub(crate) fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ShimToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

#[derive(Default)]
struct Registry {
    records: HashMap<ShimToken, Weak<ShimRecord>>,
    active: Vec<ShimToken>,
}

pub(crate) fn register(token: ShimToken, record: &Arc<ShimRecord>) {
    REGISTRY.with(|r| {
        r.borrow_mut().records.insert(token, Arc::downgrade(record));
    });
    trace!(%token, "registered interception record");
}

pub(crate) fn unregister(token: ShimToken) {
    REGISTRY.with(|r| {
        r.borrow_mut().records.remove(&token);
    });
}

/// Push an activation frame for `token` and hand back the record it
/// correlates to. An unknown or dead token is a process-level defect, not a
/// user error.
pub(crate) fn activate(token: ShimToken) -> Result<(Arc<ShimRecord>, ActivationGuard), ShimError> {
    REGISTRY.with(|r| {
        let mut registry = r.borrow_mut();
        let record = registry
            .records
            .get(&token)
            .and_then(Weak::upgrade)
            .ok_or_else(|| ShimError::CorrelationFault {
                token: token.to_string(),
            })?;
        registry.active.push(token);
        trace!(%token, depth = registry.active.len(), "activated");
        Ok((record, ActivationGuard { token }))
    })
}

/// The token at the top of the activation stack, if any.
pub(crate) fn active_token() -> Option<ShimToken> {
    REGISTRY.with(|r| r.borrow().active.last().copied())
}

#[cfg(test)]
pub(crate) fn activation_depth() -> usize {
    REGISTRY.with(|r| r.borrow().active.len())
}

/// RAII frame on the activation stack. Dropping pops the frame, so release
/// happens on every exit path, including the failure path.
#[derive(Debug)]
pub struct ActivationGuard {
    token: ShimToken,
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        REGISTRY.with(|r| {
            let popped = r.borrow_mut().active.pop();
            debug_assert_eq!(popped, Some(self.token), "activation stack out of order");
        });
    }
}
