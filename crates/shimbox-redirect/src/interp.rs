//! The body interpreter and the isolation scope.
//!
//! Every call site inside [`isolate`] is offered to the resolver before the
//! real implementation runs. [`ExecCtx::invoke_original`] suppresses
//! resolution for a whole nested execution, which is how pass-through
//! reaches the real body without re-triggering its own redirection.

use tracing::{debug, trace};

use shimbox_model::{
    ArgVec, Heap, InstanceId, MemberId, MemberKind, Op, Program, Value,
};

use crate::error::EngineError;
use crate::natives;
use crate::resolver::CallResolver;

/// Ceiling on nested calls; guards against runaway recursion in fixtures.
pub const MAX_CALL_DEPTH: usize = 128;

/// Execution state threaded through one entry-point run.
pub struct ExecCtx<'a> {
    program: &'a Program,
    heap: &'a mut Heap,
    resolver: Option<&'a dyn CallResolver>,
    depth: usize,
}

impl<'a> ExecCtx<'a> {
    pub fn new(
        program: &'a Program,
        heap: &'a mut Heap,
        resolver: Option<&'a dyn CallResolver>,
    ) -> Self {
        Self {
            program,
            heap,
            resolver,
            depth: 0,
        }
    }

    pub fn program(&self) -> &Program {
        self.program
    }

    pub fn heap(&mut self) -> &mut Heap {
        self.heap
    }

    /// Run the real implementation of `member` with resolution suppressed
    /// for the entire nested execution. Used only for pass-through.
    pub fn invoke_original(
        &mut self,
        member: MemberId,
        args: ArgVec,
    ) -> anyhow::Result<Option<Value>> {
        let saved = self.resolver.take();
        trace!(member = %self.program.descriptor(member), "invoking original implementation");
        let result = if self.program.descriptor(member).kind == MemberKind::Constructor {
            self.construct(member, args).map(Some)
        } else {
            self.execute_member(member, args)
        };
        self.resolver = saved;
        result
    }

    fn run_entry(
        &mut self,
        entry: MemberId,
        receiver: Option<InstanceId>,
        args: ArgVec,
    ) -> anyhow::Result<Option<Value>> {
        let desc = self.program.descriptor(entry);
        if desc.params.len() != args.len() {
            return Err(EngineError::ArityMismatch {
                member: desc.to_string(),
                expected: desc.params.len(),
                got: args.len(),
            }
            .into());
        }
        let mut full = ArgVec::new();
        match (desc.is_static, receiver) {
            (false, Some(id)) => full.push(Value::Obj(id)),
            (false, None) => {
                return Err(EngineError::NullReceiver {
                    member: desc.to_string(),
                }
                .into())
            }
            (true, _) => {}
        }
        full.extend(args);
        debug!(entry = %desc, "executing entry point");
        // The entry point itself is never redirected; only its callees are.
        self.execute_member(entry, full)
    }

    /// Dispatch one call site: resolver first, then the real implementation.
    fn dispatch_call(&mut self, member: MemberId, args: ArgVec) -> anyhow::Result<Option<Value>> {
        self.enter()?;
        let result = self.dispatch_call_inner(member, args);
        self.depth -= 1;
        result
    }

    fn dispatch_call_inner(
        &mut self,
        member: MemberId,
        args: ArgVec,
    ) -> anyhow::Result<Option<Value>> {
        let program = self.program;
        let desc = program.descriptor(member);
        if let Some(resolver) = self.resolver {
            let receiver = if desc.is_static {
                None
            } else {
                match args.first() {
                    Some(Value::Obj(id)) => Some(*id),
                    Some(Value::Null) | None => {
                        return Err(EngineError::NullReceiver {
                            member: desc.to_string(),
                        }
                        .into())
                    }
                    Some(_) => {
                        return Err(EngineError::TypeFault {
                            member: desc.to_string(),
                            detail: "receiver is not an object".to_string(),
                        }
                        .into())
                    }
                }
            };
            if let Some(substitute) = resolver.resolve(program, self.heap, member, receiver) {
                trace!(member = %desc, "call redirected to substitute");
                return substitute.call(self, args);
            }
        }
        self.execute_member(member, args)
    }

    /// Dispatch one constructor site. A redirected constructor's substitute
    /// receives only the declared arguments and yields the "constructed"
    /// value; an unredirected one allocates and runs the real body.
    fn dispatch_new(&mut self, ctor: MemberId, args: ArgVec) -> anyhow::Result<Value> {
        self.enter()?;
        let result = self.dispatch_new_inner(ctor, args);
        self.depth -= 1;
        result
    }

    fn dispatch_new_inner(&mut self, ctor: MemberId, args: ArgVec) -> anyhow::Result<Value> {
        if let Some(resolver) = self.resolver {
            if let Some(substitute) = resolver.resolve(self.program, self.heap, ctor, None) {
                trace!(member = %self.program.descriptor(ctor), "constructor redirected to substitute");
                let out = substitute.call(self, args)?;
                return Ok(out.unwrap_or(Value::Null));
            }
        }
        self.construct(ctor, args)
    }

    fn construct(&mut self, ctor: MemberId, args: ArgVec) -> anyhow::Result<Value> {
        let program = self.program;
        let desc = program.descriptor(ctor);
        if program.type_def(&desc.declaring_type).is_none() {
            return Err(EngineError::UnknownType(desc.declaring_type.clone()).into());
        }
        let fields = program.zeroed_fields(&desc.declaring_type);
        let id = self.heap.allocate(&desc.declaring_type, fields);
        if program.body(ctor).is_some() {
            // Constructor bodies see the fresh instance as argument 0.
            let mut full = ArgVec::new();
            full.push(Value::Obj(id));
            full.extend(args);
            self.run_body_of(ctor, full)?;
        }
        Ok(Value::Obj(id))
    }

    /// Run the real implementation: devirtualize through the receiver's
    /// runtime type, then run the native or the compiled body.
    fn execute_member(&mut self, member: MemberId, args: ArgVec) -> anyhow::Result<Option<Value>> {
        let program = self.program;
        let desc = program.descriptor(member);
        let mut target = member;
        if !desc.is_static && desc.is_virtual {
            if let Some(Value::Obj(id)) = args.first() {
                if let Some(runtime) = self.heap.type_of(*id) {
                    target = program.resolve_virtual(member, runtime);
                }
            }
        }
        if program.is_native(target) {
            return natives::invoke(program.descriptor(target), &args);
        }
        self.run_body_of(target, args)
    }

    fn run_body_of(&mut self, member: MemberId, args: ArgVec) -> anyhow::Result<Option<Value>> {
        let program = self.program;
        let desc = program.descriptor(member);
        let label = desc.to_string();
        let wants_value = desc.ret.is_some() && desc.kind == MemberKind::Method;
        let body = program.body(member).ok_or_else(|| EngineError::MissingBody {
            member: label.clone(),
        })?;

        let mut stack: Vec<Value> = Vec::new();
        for op in body.ops() {
            match op {
                Op::PushBool(v) => stack.push(Value::Bool(*v)),
                Op::PushInt(v) => stack.push(Value::Int(*v)),
                Op::PushFloat(v) => stack.push(Value::Float(*v)),
                Op::PushStr(v) => stack.push(Value::Str(v.clone())),
                Op::PushNull => stack.push(Value::Null),
                Op::LoadArg(i) => {
                    let value = args.get(*i).cloned().ok_or_else(|| EngineError::ArityMismatch {
                        member: label.clone(),
                        expected: *i + 1,
                        got: args.len(),
                    })?;
                    stack.push(value);
                }
                Op::Call(callee) => {
                    let callee_desc = program.descriptor(*callee);
                    let call_args = pop_args(&mut stack, callee_desc.invocation_arity(), &label)?;
                    let has_ret = callee_desc.ret.is_some();
                    let out = self.dispatch_call(*callee, call_args)?;
                    if has_ret {
                        let value = out.ok_or_else(|| EngineError::TypeFault {
                            member: label.clone(),
                            detail: format!("call to {} produced no value", program.descriptor(*callee)),
                        })?;
                        stack.push(value);
                    }
                }
                Op::New(ctor) => {
                    let arity = program.descriptor(*ctor).params.len();
                    let call_args = pop_args(&mut stack, arity, &label)?;
                    let value = self.dispatch_new(*ctor, call_args)?;
                    stack.push(value);
                }
                Op::GetField(name) => {
                    let id = pop_object(&mut stack, &label)?;
                    let instance = self.heap.get(id).ok_or_else(|| EngineError::DanglingInstance {
                        member: label.clone(),
                    })?;
                    let value = instance.fields.get(name).cloned().ok_or_else(|| {
                        EngineError::TypeFault {
                            member: label.clone(),
                            detail: format!("no field `{name}` on {}", instance.type_name),
                        }
                    })?;
                    stack.push(value);
                }
                Op::SetField(name) => {
                    let value = pop1(&mut stack, &label)?;
                    let id = pop_object(&mut stack, &label)?;
                    let instance =
                        self.heap.get_mut(id).ok_or_else(|| EngineError::DanglingInstance {
                            member: label.clone(),
                        })?;
                    instance.fields.insert(name.clone(), value);
                }
                Op::Add | Op::Sub | Op::Mul => {
                    let (lhs, rhs) = pop2(&mut stack, &label)?;
                    stack.push(arith(op, lhs, rhs, &label)?);
                }
                Op::Lt | Op::Gt => {
                    let (lhs, rhs) = pop2(&mut stack, &label)?;
                    stack.push(compare(op, lhs, rhs, &label)?);
                }
                Op::Eq => {
                    let (lhs, rhs) = pop2(&mut stack, &label)?;
                    stack.push(Value::Bool(lhs == rhs));
                }
                Op::Not => match pop1(&mut stack, &label)? {
                    Value::Bool(v) => stack.push(Value::Bool(!v)),
                    other => {
                        return Err(type_fault(&label, format!("cannot negate {other}")).into())
                    }
                },
                Op::Pop => {
                    pop1(&mut stack, &label)?;
                }
                Op::Dup => {
                    let top = pop1(&mut stack, &label)?;
                    stack.push(top.clone());
                    stack.push(top);
                }
                Op::Abort(code) => {
                    return Err(EngineError::Abort {
                        member: label,
                        code: *code,
                    }
                    .into())
                }
                Op::Ret => {
                    return Ok(if wants_value {
                        Some(pop1(&mut stack, &label)?)
                    } else {
                        None
                    })
                }
            }
        }
        if wants_value {
            Err(type_fault(&label, "body ended without a return value".to_string()).into())
        } else {
            Ok(None)
        }
    }

    fn enter(&mut self) -> anyhow::Result<()> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(EngineError::CallDepthExceeded {
                limit: MAX_CALL_DEPTH,
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }
}

/// Execute `entry` with `resolver` consulted at every call depth for the
/// duration of the call; registrations deactivate when this returns,
/// success or failure.
pub fn isolate(
    program: &Program,
    heap: &mut Heap,
    entry: MemberId,
    receiver: Option<InstanceId>,
    args: ArgVec,
    resolver: &dyn CallResolver,
) -> anyhow::Result<Option<Value>> {
    ExecCtx::new(program, heap, Some(resolver)).run_entry(entry, receiver, args)
}

/// Execute `entry` with no redirections at all: the empty-plan short circuit.
pub fn execute_direct(
    program: &Program,
    heap: &mut Heap,
    entry: MemberId,
    receiver: Option<InstanceId>,
    args: ArgVec,
) -> anyhow::Result<Option<Value>> {
    ExecCtx::new(program, heap, None).run_entry(entry, receiver, args)
}

fn pop1(stack: &mut Vec<Value>, member: &str) -> Result<Value, EngineError> {
    stack.pop().ok_or_else(|| EngineError::StackUnderflow {
        member: member.to_string(),
    })
}

/// Pop `(lhs, rhs)` with rhs on top.
fn pop2(stack: &mut Vec<Value>, member: &str) -> Result<(Value, Value), EngineError> {
    let rhs = pop1(stack, member)?;
    let lhs = pop1(stack, member)?;
    Ok((lhs, rhs))
}

fn pop_args(stack: &mut Vec<Value>, arity: usize, member: &str) -> Result<ArgVec, EngineError> {
    if stack.len() < arity {
        return Err(EngineError::StackUnderflow {
            member: member.to_string(),
        });
    }
    Ok(stack.drain(stack.len() - arity..).collect())
}

fn pop_object(stack: &mut Vec<Value>, member: &str) -> Result<InstanceId, EngineError> {
    match pop1(stack, member)? {
        Value::Obj(id) => Ok(id),
        Value::Null => Err(EngineError::NullReceiver {
            member: member.to_string(),
        }),
        other => Err(type_fault(member, format!("expected an object, got {other}"))),
    }
}

fn arith(op: &Op, lhs: Value, rhs: Value, member: &str) -> Result<Value, EngineError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
            Op::Add => a.wrapping_add(b),
            Op::Sub => a.wrapping_sub(b),
            _ => a.wrapping_mul(b),
        })),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
            Op::Add => a + b,
            Op::Sub => a - b,
            _ => a * b,
        })),
        (lhs, rhs) => Err(type_fault(
            member,
            format!("arithmetic on mismatched operands {lhs} and {rhs}"),
        )),
    }
}

fn compare(op: &Op, lhs: Value, rhs: Value, member: &str) -> Result<Value, EngineError> {
    let less = match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => match op {
            Op::Lt => a < b,
            _ => a > b,
        },
        (Value::Float(a), Value::Float(b)) => match op {
            Op::Lt => a < b,
            _ => a > b,
        },
        _ => {
            return Err(type_fault(
                member,
                format!("comparison on mismatched operands {lhs} and {rhs}"),
            ))
        }
    };
    Ok(Value::Bool(less))
}

fn type_fault(member: &str, detail: String) -> EngineError {
    EngineError::TypeFault {
        member: member.to_string(),
        detail,
    }
}
