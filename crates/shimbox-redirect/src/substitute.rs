//! The narrow, uniformly-typed entry surface a replacement must funnel
//! through.

use std::fmt;
use std::sync::Arc;

use shimbox_model::{ArgVec, Value};

use crate::interp::ExecCtx;

type SubstituteFn = dyn Fn(&mut ExecCtx<'_>, ArgVec) -> anyhow::Result<Option<Value>>;

/// A generated replacement body. Every substitute has the same shape no
/// matter the member it replaces: it receives the execution context and the
/// captured arguments (receiver first for instance members) and produces the
/// member's result, or `None` for members with no return channel.
#[derive(Clone)]
pub struct Substitute(Arc<SubstituteFn>);

impl Substitute {
    pub fn new(
        body: impl Fn(&mut ExecCtx<'_>, ArgVec) -> anyhow::Result<Option<Value>> + 'static,
    ) -> Self {
        Self(Arc::new(body))
    }

    pub fn call(&self, ctx: &mut ExecCtx<'_>, args: ArgVec) -> anyhow::Result<Option<Value>> {
        (self.0)(ctx, args)
    }
}

impl fmt::Debug for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Substitute(..)")
    }
}
