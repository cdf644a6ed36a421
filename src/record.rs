//! The interception record: one substitutable member, its call log, and its
//! configured return behavior.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shimbox_model::{ArgVec, Heap, MemberDescriptor, MemberId, Program, Value};
use shimbox_redirect::Substitute;

use crate::error::ShimError;
use crate::registry::{self, ActivationGuard, ShimToken};
use crate::synth::synthesize_default;
use crate::trampoline;

/// Fixed ceiling on declared parameters, matching the uniform trampoline
/// surface.
pub const MAX_PARAMETERS: usize = 10;

/// One recorded invocation: argument values as captured at call time, plus
/// the capture timestamp. For instance members, value 0 is the receiver.
/// Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEntry {
    pub values: Vec<Value>,
    pub called_at: DateTime<Utc>,
}

impl CallEntry {
    pub(crate) fn capture(values: ArgVec) -> Self {
        Self {
            values: values.into_vec(),
            called_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct RecordState {
    configured: Option<Value>,
    pass_through: bool,
    pending: Option<Value>,
    calls: Vec<CallEntry>,
}

/// One substitutable member: identity, call log, configured return value,
/// and the generated substitute trampoline. Created once per distinct
/// signature-equal member discovered during a session; dropped with the
/// session, unregistering its token.
#[derive(Debug)]
pub struct ShimRecord {
    member: MemberId,
    descriptor: MemberDescriptor,
    token: ShimToken,
    state: Mutex<RecordState>,
    substitute: OnceLock<Substitute>,
}

impl ShimRecord {
    /// Build a record for `member`, defaulting its return value via the
    /// synthesizer unless a `configured` value is supplied.
    pub(crate) fn new(
        member: MemberId,
        program: &Program,
        heap: &mut Heap,
        configured: Option<Value>,
    ) -> Result<Arc<Self>, ShimError> {
        let descriptor = program.descriptor(member).clone();
        if descriptor.params.len() > MAX_PARAMETERS {
            return Err(ShimError::TooManyParameters {
                member: descriptor.to_string(),
                count: descriptor.params.len(),
            });
        }
        let default = descriptor
            .ret
            .as_ref()
            .map(|tag| synthesize_default(tag, program, heap));
        let token = ShimToken::mint();
        let record = Arc::new(Self {
            member,
            descriptor,
            token,
            state: Mutex::new(RecordState {
                configured: default,
                ..RecordState::default()
            }),
            substitute: OnceLock::new(),
        });
        if let Some(value) = configured {
            record.set_return_value(value, program, heap)?;
        }
        let substitute = trampoline::generate_substitute(&record);
        let _ = record.substitute.set(substitute);
        registry::register(token, &record);
        debug!(member = %record.descriptor, %token, "interception record created");
        Ok(record)
    }

    pub fn member_id(&self) -> MemberId {
        self.member
    }

    pub fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }

    pub fn token(&self) -> ShimToken {
        self.token
    }

    /// The generated trampoline, created once at construction and immutable
    /// thereafter.
    pub fn substitute(&self) -> Substitute {
        self.substitute
            .get()
            .cloned()
            .expect("substitute is installed at construction")
    }

    /// Configure the value every redirected call will observe.
    pub fn set_return_value(
        &self,
        value: Value,
        program: &Program,
        heap: &Heap,
    ) -> Result<(), ShimError> {
        let Some(tag) = &self.descriptor.ret else {
            return Err(ShimError::NoReturnValue {
                member: self.descriptor.to_string(),
            });
        };
        if !program.is_assignable(&value, tag, heap) {
            return Err(ShimError::TypeMismatch {
                member: self.descriptor.to_string(),
                expected: tag.to_string(),
                got: value.type_name(heap),
            });
        }
        self.state.lock().configured = Some(value);
        Ok(())
    }

    /// Re-synthesize the default return value, discarding any configuration.
    pub fn reset_return_value(&self, program: &Program, heap: &mut Heap) {
        let default = self
            .descriptor
            .ret
            .as_ref()
            .map(|tag| synthesize_default(tag, program, heap));
        self.state.lock().configured = default;
    }

    /// Flag intent only: invoking the real implementation is the redirection
    /// engine's job.
    pub fn set_pass_through(&self, enabled: bool) {
        self.state.lock().pass_through = enabled;
    }

    pub fn pass_through(&self) -> bool {
        self.state.lock().pass_through
    }

    pub(crate) fn set_pending(&self, value: Option<Value>) {
        self.state.lock().pending = value;
    }

    /// Empty the call log without touching configuration.
    pub fn clear_log(&self) {
        self.state.lock().calls.clear();
    }

    pub fn calls(&self) -> Vec<CallEntry> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Append-only logging; fails with `NotRunning` if this record is not
    /// the registry's active record. A failure here indicates a correlation
    /// defect upstream, not a user error.
    pub fn log_call(&self, entry: CallEntry) -> Result<(), ShimError> {
        if registry::active_token() != Some(self.token) {
            return Err(ShimError::NotRunning {
                member: self.descriptor.to_string(),
            });
        }
        self.append_entry(entry);
        Ok(())
    }

    /// Direct append for the short-circuit trampoline, which never activates.
    pub(crate) fn append_entry(&self, entry: CallEntry) {
        self.state.lock().calls.push(entry);
    }

    /// Produce the value a redirected call returns: the pass-through result
    /// when the flag is set, else the configured value (or nothing for void
    /// members). Releasing `activation` is its final step.
    pub fn resolve_return(&self, activation: ActivationGuard) -> Option<Value> {
        let value = self.resolve_configured();
        drop(activation);
        value
    }

    pub(crate) fn resolve_configured(&self) -> Option<Value> {
        let mut state = self.state.lock();
        if state.pass_through {
            state.pending.take()
        } else {
            state.configured.clone()
        }
    }
}

impl Drop for ShimRecord {
    fn drop(&mut self) {
        registry::unregister(self.token);
    }
}
