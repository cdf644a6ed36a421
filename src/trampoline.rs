//! Substitute-body generation.
//!
//! One trampoline per record, built at construction. The standard shape
//! funnels through the correlation registry: activate by token, log, run
//! pass-through if flagged, resolve the return (which releases activation).
//! Zero-parameter static members and zero-parameter constructors get a
//! short-circuit trampoline that captures the record directly and skips
//! activation — an optimization, not a behavioral difference.

use std::sync::Arc;

use shimbox_model::ArgVec;
use shimbox_redirect::Substitute;

use crate::error::ShimError;
use crate::record::{CallEntry, ShimRecord};
use crate::registry;

pub(crate) fn generate_substitute(record: &Arc<ShimRecord>) -> Substitute {
    let descriptor = record.descriptor();
    if descriptor.params.is_empty() && descriptor.is_static {
        let token = record.token();
        let weak = Arc::downgrade(record);
        return Substitute::new(move |ctx, args| {
            let record = weak.upgrade().ok_or_else(|| ShimError::CorrelationFault {
                token: token.to_string(),
            })?;
            record.append_entry(CallEntry::capture(args));
            if record.pass_through() {
                return ctx.invoke_original(record.member_id(), ArgVec::new());
            }
            Ok(record.resolve_configured())
        });
    }

    let token = record.token();
    Substitute::new(move |ctx, args| {
        // Fixed order: activation, logging, pass-through, return resolution
        // (which releases activation). The log entry therefore exists before
        // any return value is computed, and the guard releases the frame on
        // the failure paths too.
        let (record, guard) = registry::activate(token)?;
        record.log_call(CallEntry::capture(args.clone()))?;
        if record.pass_through() {
            let pending = ctx.invoke_original(record.member_id(), args)?;
            record.set_pending(pending);
        }
        Ok(record.resolve_return(guard))
    })
}
