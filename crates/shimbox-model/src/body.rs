//! Compiled bodies: a straight-line stack-machine instruction sequence.

use crate::member::MemberId;

/// One instruction of a compiled body.
///
/// Arguments are addressed by index; for instance members and constructors
/// argument 0 is the receiver / the instance under construction. Call sites
/// push the receiver (if any) first, then the declared arguments left to
/// right.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    PushBool(bool),
    PushInt(i64),
    PushFloat(f64),
    PushStr(String),
    PushNull,
    LoadArg(usize),
    /// Call a method; pops its invocation arity, pushes its result if it
    /// declares a return.
    Call(MemberId),
    /// Invoke a constructor; pops the declared arguments, pushes the
    /// constructed instance.
    New(MemberId),
    GetField(String),
    SetField(String),
    Add,
    Sub,
    Mul,
    Lt,
    Gt,
    Eq,
    Not,
    Pop,
    Dup,
    /// Abort execution with a user code.
    Abort(u64),
    /// Return the top of stack if the member declares a return, else nothing.
    Ret,
}

/// The compiled instruction sequence of one member.
#[derive(Debug, Clone, Default)]
pub struct Body {
    ops: Vec<Op>,
}

impl Body {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Enumerate the callees referenced by this body, in instruction order.
    ///
    /// This is the black-box "enumerate call sites in a compiled body" API;
    /// methods and constructors both appear, distinguished by their
    /// descriptors.
    pub fn call_sites(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Op::Call(member) | Op::New(member) => Some(*member),
            _ => None,
        })
    }
}
