//! Resolution matching: picking the record that governs a call site.

use tracing::trace;

use shimbox_model::{Heap, InstanceId, MemberId, Program};
use shimbox_redirect::{CallResolver, RedirectionPlan, Substitute};

/// Implements the engine's [`CallResolver`] seam over a session's
/// redirection plan.
///
/// Virtual dispatch is resolved first through the program's introspection
/// capability: the most derived signature-equal override between the
/// declaring type and the receiver's runtime type becomes the match target.
/// A base-declared record therefore governs exactly when no intervening
/// override exists; an override's own record, when separately discovered,
/// governs instead — and an undiscovered override yields no match, letting
/// the real implementation execute. Receiver-bound registrations beat
/// unbound ones for their instance.
#[derive(Debug)]
pub struct ShimMatcher {
    plan: RedirectionPlan,
}

impl ShimMatcher {
    pub fn new(plan: RedirectionPlan) -> Self {
        Self { plan }
    }
}

impl CallResolver for ShimMatcher {
    fn resolve(
        &self,
        program: &Program,
        heap: &Heap,
        declared: MemberId,
        receiver: Option<InstanceId>,
    ) -> Option<Substitute> {
        let target = match receiver.and_then(|id| heap.type_of(id)) {
            Some(runtime) => program.resolve_virtual(declared, runtime),
            None => declared,
        };
        if target != declared {
            trace!(
                declared = %program.descriptor(declared),
                target = %program.descriptor(target),
                "virtual override governs"
            );
        }
        self.plan.lookup(target, receiver)
    }
}
