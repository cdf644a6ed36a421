//! The interception session: discovery, record construction, lookup, and
//! execution inside the redirection scope.

use std::sync::Arc;

use tracing::debug;

use shimbox_model::{
    ArgVec, Heap, InstanceId, MemberDescriptor, MemberId, Program, TypeTag, Value,
};
use shimbox_redirect::{execute_direct, isolate, RedirectionPlan};

use crate::discovery::{discover, DiscoveryOptions};
use crate::error::ShimError;
use crate::matcher::ShimMatcher;
use crate::record::{CallEntry, ShimRecord};
use crate::report::SessionReport;

/// One arrange-act-assert cycle: owns the program, the heap, the entry
/// point, and one interception record per distinct member discovered from
/// the entry point's body.
#[derive(Debug)]
pub struct ShimSession {
    program: Arc<Program>,
    heap: Heap,
    entry: MemberId,
    receiver: Option<InstanceId>,
    options: DiscoveryOptions,
    records: Vec<Arc<ShimRecord>>,
}

impl ShimSession {
    /// Session over an entry point with no return channel.
    pub fn returnless(
        program: Arc<Program>,
        heap: Heap,
        entry: MemberId,
        receiver: Option<InstanceId>,
        options: DiscoveryOptions,
    ) -> Result<Self, ShimError> {
        let desc = program.descriptor(entry);
        if desc.ret.is_some() {
            return Err(ShimError::InvalidEntryPoint {
                reason: format!("{desc} returns a value; use ShimSession::returning"),
            });
        }
        Self::init(program, heap, entry, receiver, options)
    }

    /// Session over an entry point declared to return `expected`.
    pub fn returning(
        program: Arc<Program>,
        heap: Heap,
        entry: MemberId,
        expected: TypeTag,
        receiver: Option<InstanceId>,
        options: DiscoveryOptions,
    ) -> Result<Self, ShimError> {
        let desc = program.descriptor(entry);
        match &desc.ret {
            Some(tag) if *tag == expected => {}
            Some(tag) => {
                return Err(ShimError::InvalidEntryPoint {
                    reason: format!("{desc} returns {tag}, not {expected}"),
                })
            }
            None => {
                return Err(ShimError::InvalidEntryPoint {
                    reason: format!("{desc} does not return a value; use ShimSession::returnless"),
                })
            }
        }
        Self::init(program, heap, entry, receiver, options)
    }

    fn init(
        program: Arc<Program>,
        mut heap: Heap,
        entry: MemberId,
        receiver: Option<InstanceId>,
        options: DiscoveryOptions,
    ) -> Result<Self, ShimError> {
        let desc = program.descriptor(entry);
        match (desc.is_static, receiver) {
            (true, Some(_)) => {
                return Err(ShimError::InvalidEntryPoint {
                    reason: format!("{desc} is static and cannot be bound to an instance"),
                })
            }
            (false, None) => {
                return Err(ShimError::InvalidEntryPoint {
                    reason: format!("an instance must be provided for non-static entry point {desc}"),
                })
            }
            (false, Some(id)) => {
                let runtime = heap.type_of(id).map(str::to_string).ok_or_else(|| {
                    ShimError::InvalidEntryPoint {
                        reason: format!("receiver {id} for {desc} is not a live instance"),
                    }
                })?;
                if !program.is_subtype(&runtime, &desc.declaring_type) {
                    return Err(ShimError::InvalidEntryPoint {
                        reason: format!(
                            "provided instance is a {runtime}, not an instance or subtype of {}",
                            desc.declaring_type
                        ),
                    });
                }
            }
            (true, None) => {}
        }

        let discovered = discover(&program, entry, options);
        let mut records = Vec::with_capacity(discovered.len());
        for member in discovered {
            records.push(ShimRecord::new(member, &program, &mut heap, None)?);
        }
        debug!(entry = %program.descriptor(entry), records = records.len(), "session ready");
        Ok(Self {
            program,
            heap,
            entry,
            receiver,
            options,
            records,
        })
    }

    pub fn options(&self) -> DiscoveryOptions {
        self.options
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn records(&self) -> &[Arc<ShimRecord>] {
        &self.records
    }

    /// Run the entry point with every record's trampoline registered,
    /// clearing all call logs first.
    pub fn execute(&mut self, args: &[Value]) -> Result<Option<Value>, ShimError> {
        self.execute_with(true, args)
    }

    /// Run the entry point; with `clear_logs_first = false`, call entries
    /// append to the existing logs.
    pub fn execute_with(
        &mut self,
        clear_logs_first: bool,
        args: &[Value],
    ) -> Result<Option<Value>, ShimError> {
        if clear_logs_first {
            self.clear_logs();
        }
        self.verify_arguments(args)?;

        let mut arg_vec = ArgVec::new();
        arg_vec.extend(args.iter().cloned());

        if self.records.is_empty() {
            return execute_direct(&self.program, &mut self.heap, self.entry, self.receiver, arg_vec)
                .map_err(ShimError::from);
        }

        let mut plan = RedirectionPlan::new();
        for record in &self.records {
            plan.replace(record.member_id()).with(record.substitute());
        }
        let matcher = ShimMatcher::new(plan);
        isolate(
            &self.program,
            &mut self.heap,
            self.entry,
            self.receiver,
            arg_vec,
            &matcher,
        )
        .map_err(ShimError::from)
    }

    /// Validate arity, nullability, and runtime types before any execution,
    /// so a rejected call has no partial side effects.
    fn verify_arguments(&self, args: &[Value]) -> Result<(), ShimError> {
        let desc = self.program.descriptor(self.entry);
        if desc.params.len() != args.len() {
            return Err(ShimError::ArgumentMismatch {
                reason: format!("expected {} arguments, got {}", desc.params.len(), args.len()),
            });
        }
        for (i, (arg, tag)) in args.iter().zip(&desc.params).enumerate() {
            if matches!(arg, Value::Null) && !tag.is_reference() {
                return Err(ShimError::ArgumentMismatch {
                    reason: format!("argument {i} is null, but parameters of type {tag} cannot be null"),
                });
            }
            if !self.program.is_assignable(arg, tag, &self.heap) {
                return Err(ShimError::ArgumentMismatch {
                    reason: format!(
                        "argument {i} is of type {}; expected {tag}",
                        arg.type_name(&self.heap)
                    ),
                });
            }
        }
        Ok(())
    }

    /// The record for a member id surfaced by discovery.
    pub fn record(&self, member: MemberId) -> Result<&Arc<ShimRecord>, ShimError> {
        self.records
            .iter()
            .find(|r| r.member_id() == member)
            .ok_or_else(|| ShimError::AmbiguousOrMissing {
                selector: self.program.descriptor(member).to_string(),
                matches: 0,
            })
    }

    /// Lookup by `"Type.name"` or bare `"name"`. Strict: exactly one record
    /// must match.
    pub fn record_by_name(&self, selector: &str) -> Result<&Arc<ShimRecord>, ShimError> {
        let (class, name) = match selector.split_once('.') {
            Some((class, name)) => (Some(class), name),
            None => (None, selector),
        };
        let matches: Vec<_> = self
            .records
            .iter()
            .filter(|r| {
                let desc = r.descriptor();
                desc.name == name && class.map_or(true, |c| desc.declaring_type == c)
            })
            .collect();
        match matches.as_slice() {
            [one] => Ok(one),
            _ => Err(ShimError::AmbiguousOrMissing {
                selector: selector.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// Lookup by example call: declaring type, name, and argument values,
    /// overload-resolved against the discovered set.
    pub fn record_by_probe(
        &self,
        type_name: &str,
        name: &str,
        args: &[Value],
    ) -> Result<&Arc<ShimRecord>, ShimError> {
        let matches: Vec<_> = self
            .records
            .iter()
            .filter(|r| {
                let desc = r.descriptor();
                desc.declaring_type == type_name
                    && desc.name == name
                    && desc.params.len() == args.len()
                    && args
                        .iter()
                        .zip(&desc.params)
                        .all(|(arg, tag)| self.program.is_assignable(arg, tag, &self.heap))
            })
            .collect();
        match matches.as_slice() {
            [one] => Ok(one),
            _ => Err(ShimError::AmbiguousOrMissing {
                selector: format!("{type_name}.{name}/{}", args.len()),
                matches: matches.len(),
            }),
        }
    }

    pub fn set_return_value(&self, member: MemberId, value: Value) -> Result<(), ShimError> {
        self.record(member)?
            .set_return_value(value, &self.program, &self.heap)
    }

    pub fn set_return_value_by_name(&self, selector: &str, value: Value) -> Result<(), ShimError> {
        self.record_by_name(selector)?
            .set_return_value(value, &self.program, &self.heap)
    }

    /// Re-synthesize a record's default return value.
    pub fn reset_return_value(&mut self, member: MemberId) -> Result<(), ShimError> {
        let record = self
            .records
            .iter()
            .find(|r| r.member_id() == member)
            .cloned()
            .ok_or_else(|| ShimError::AmbiguousOrMissing {
                selector: self.program.descriptor(member).to_string(),
                matches: 0,
            })?;
        record.reset_return_value(&self.program, &mut self.heap);
        Ok(())
    }

    pub fn set_pass_through(&self, member: MemberId, enabled: bool) -> Result<(), ShimError> {
        self.record(member)?.set_pass_through(enabled);
        Ok(())
    }

    pub fn logs_for(&self, member: MemberId) -> Result<Vec<CallEntry>, ShimError> {
        Ok(self.record(member)?.calls())
    }

    pub fn logs_for_name(&self, selector: &str) -> Result<Vec<CallEntry>, ShimError> {
        Ok(self.record_by_name(selector)?.calls())
    }

    /// Empty every record's call log without touching configuration.
    pub fn clear_logs(&self) {
        for record in &self.records {
            record.clear_log();
        }
    }

    /// Member-to-entries aggregate for the most recent execution.
    pub fn last_execution_results(&self) -> Vec<(MemberDescriptor, Vec<CallEntry>)> {
        self.records
            .iter()
            .map(|r| (r.descriptor().clone(), r.calls()))
            .collect()
    }

    /// Write-only summary of the session for debugging.
    pub fn report(&self) -> SessionReport {
        SessionReport::new(self)
    }

    /// Serialize the report as pretty JSON at `path`.
    pub fn save_report(&self, path: &std::path::Path) -> anyhow::Result<()> {
        use anyhow::Context;
        let json = serde_json::to_string_pretty(&self.report())
            .context("failed to serialize session report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session report to {}", path.display()))?;
        Ok(())
    }

    pub(crate) fn entry_descriptor(&self) -> &MemberDescriptor {
        self.program.descriptor(self.entry)
    }
}
