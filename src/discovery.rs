//! Call-graph discovery: which members an entry point transitively calls.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace};

use shimbox_model::{MemberId, MemberKind, Program, SignatureKey, Visibility};

/// Caller-facing discovery switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Intercept private members instead of descending through them.
    pub include_private: bool,
    /// Intercept specially-named members (property accessors and kin).
    pub include_special_names: bool,
    /// Intercept constructors, despite their distinct invocation shape.
    pub include_constructors: bool,
}

/// Walk the entry point's compiled body, and recursively the bodies of
/// non-substitutable helpers it calls, producing the deduplicated set of
/// members to intercept in first-seen order.
///
/// Private members (absent the opt-in) are transparent: discovery descends
/// into *their* bodies and includes what they call instead, so the private
/// member itself is never redirected. Denylisted members are skipped
/// outright. Each body is visited at most once per pass, so cycles
/// terminate.
pub fn discover(program: &Program, entry: MemberId, options: DiscoveryOptions) -> Vec<MemberId> {
    let mut worklist = VecDeque::from([entry]);
    let mut visited: HashSet<MemberId> = HashSet::from([entry]);
    let mut seen: HashSet<SignatureKey> = HashSet::new();
    let mut discovered = Vec::new();

    while let Some(current) = worklist.pop_front() {
        let Some(body) = program.body(current) else {
            continue;
        };
        for callee in body.call_sites() {
            let desc = program.descriptor(callee);
            if program.is_never_redirect(callee) {
                trace!(member = %desc, "denylisted; never redirected");
                continue;
            }
            if desc.kind == MemberKind::Constructor {
                if options.include_constructors && seen.insert(desc.signature_key()) {
                    discovered.push(callee);
                }
                continue;
            }
            if desc.visibility == Visibility::Private && !options.include_private {
                // Privacy is transparent: descend instead of including.
                if visited.insert(callee) {
                    trace!(member = %desc, "private; descending into its body");
                    worklist.push_back(callee);
                }
                continue;
            }
            if desc.is_special_name && !options.include_special_names {
                trace!(member = %desc, "special name excluded");
                continue;
            }
            if seen.insert(desc.signature_key()) {
                discovered.push(callee);
            }
        }
    }

    debug!(
        entry = %program.descriptor(entry),
        count = discovered.len(),
        "discovery complete"
    );
    discovered
}
