//! The call-resolution seam between the engine and the interception layer.

use shimbox_model::{Heap, InstanceId, MemberId, Program};

use crate::substitute::Substitute;

/// Consulted at every call site inside an isolation scope. Implementations
/// decide which registered substitute, if any, governs the call; `None`
/// means no redirection occurs and the real implementation executes — an
/// expected outcome for members intentionally excluded from discovery.
pub trait CallResolver {
    fn resolve(
        &self,
        program: &Program,
        heap: &Heap,
        declared: MemberId,
        receiver: Option<InstanceId>,
    ) -> Option<Substitute>;
}

/// Resolver with no registrations; every call runs its real implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRedirections;

impl CallResolver for NoRedirections {
    fn resolve(
        &self,
        _program: &Program,
        _heap: &Heap,
        _declared: MemberId,
        _receiver: Option<InstanceId>,
    ) -> Option<Substitute> {
        None
    }
}
