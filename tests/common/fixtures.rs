//! Programs shared across the integration test binaries.

use std::sync::Arc;

use shimbox::model::{Body, MemberDecl, MemberId, Op, Program, ProgramBuilder, TypeTag};

/// `Scenario.run() -> Bool` computes `Calculator.foo(5) < Calculator.bar(7, 1)`.
///
/// Executed for real this is `5 < 8`; with both callees intercepted the
/// result depends entirely on the configured return values.
pub struct Scenario {
    pub program: Arc<Program>,
    pub entry: MemberId,
    pub foo: MemberId,
    pub bar: MemberId,
}

pub fn scenario() -> Scenario {
    let mut builder = ProgramBuilder::new();
    let foo = builder.declare(
        "Calculator",
        MemberDecl::static_method("foo", vec![TypeTag::Int], Some(TypeTag::Int)),
    );
    builder.set_body(foo, Body::new(vec![Op::LoadArg(0), Op::Ret]));
    let bar = builder.declare(
        "Calculator",
        MemberDecl::static_method("bar", vec![TypeTag::Int, TypeTag::Int], Some(TypeTag::Int)),
    );
    builder.set_body(
        bar,
        Body::new(vec![Op::LoadArg(0), Op::LoadArg(1), Op::Add, Op::Ret]),
    );
    let entry = builder.declare(
        "Scenario",
        MemberDecl::static_method("run", vec![], Some(TypeTag::Bool)),
    );
    builder.set_body(
        entry,
        Body::new(vec![
            Op::PushInt(5),
            Op::Call(foo),
            Op::PushInt(7),
            Op::PushInt(1),
            Op::Call(bar),
            Op::Lt,
            Op::Ret,
        ]),
    );
    Scenario {
        program: Arc::new(builder.build()),
        entry,
        foo,
        bar,
    }
}

/// `Driver.go()` calls the zero-parameter static `Pinger.ping()` twice.
pub struct PingDriver {
    pub program: Arc<Program>,
    pub entry: MemberId,
    pub ping: MemberId,
}

pub fn ping_driver() -> PingDriver {
    let mut builder = ProgramBuilder::new();
    let ping = builder.declare("Pinger", MemberDecl::static_method("ping", vec![], None));
    builder.set_body(ping, Body::new(vec![Op::Ret]));
    let entry = builder.declare("Driver", MemberDecl::static_method("go", vec![], None));
    builder.set_body(
        entry,
        Body::new(vec![Op::Call(ping), Op::Call(ping), Op::Ret]),
    );
    PingDriver {
        program: Arc::new(builder.build()),
        entry,
        ping,
    }
}

/// `Pair.run(Obj(Counter), Obj(Counter))` bumps each counter once, so a
/// single `Counter.bump` record observes calls with distinct receivers.
pub struct CounterPair {
    pub program: Arc<Program>,
    pub entry: MemberId,
    pub bump: MemberId,
}

pub fn counter_pair() -> CounterPair {
    let mut builder = ProgramBuilder::new();
    builder.add_type("Counter");
    let bump = builder.declare(
        "Counter",
        MemberDecl::instance_method("bump", vec![TypeTag::Int], Some(TypeTag::Int)),
    );
    builder.set_body(bump, Body::new(vec![Op::LoadArg(1), Op::Ret]));
    let entry = builder.declare(
        "Pair",
        MemberDecl::static_method(
            "run",
            vec![
                TypeTag::Obj("Counter".to_string()),
                TypeTag::Obj("Counter".to_string()),
            ],
            None,
        ),
    );
    builder.set_body(
        entry,
        Body::new(vec![
            Op::LoadArg(0),
            Op::PushInt(1),
            Op::Call(bump),
            Op::Pop,
            Op::LoadArg(1),
            Op::PushInt(2),
            Op::Call(bump),
            Op::Pop,
            Op::Ret,
        ]),
    );
    CounterPair {
        program: Arc::new(builder.build()),
        entry,
        bump,
    }
}
