//! End-to-end session behavior: interception defaults, configured returns,
//! call logging, and lookup.

mod common;

use std::sync::Arc;

use shimbox::model::{Body, Heap, MemberDecl, Op, ProgramBuilder, TypeTag, Value};
use shimbox::{DiscoveryOptions, ShimError, ShimSession};

use common::{counter_pair, init_tracing, ping_driver, scenario};

#[test]
fn intercepted_calls_return_synthesized_defaults() {
    init_tracing();
    let fx = scenario();
    let mut session = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Bool,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    // Both callees default to Int 0, so `0 < 0` is false.
    let result = session.execute(&[]).unwrap();
    assert_eq!(result, Some(Value::Bool(false)));
}

#[test]
fn configured_returns_drive_the_entry_point() {
    init_tracing();
    let fx = scenario();
    let mut session = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Bool,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    session.set_return_value(fx.foo, Value::Int(3)).unwrap();
    session.set_return_value(fx.bar, Value::Int(7)).unwrap();
    assert_eq!(session.execute(&[]).unwrap(), Some(Value::Bool(true)));

    // Reconfigure mid-session; nothing is rebuilt.
    session.set_return_value(fx.foo, Value::Int(9)).unwrap();
    assert_eq!(session.execute(&[]).unwrap(), Some(Value::Bool(false)));
}

#[test]
fn call_log_captures_arguments_in_order() {
    init_tracing();
    let fx = scenario();
    let mut session = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Bool,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();
    session.execute(&[]).unwrap();

    let foo_calls = session.logs_for(fx.foo).unwrap();
    assert_eq!(foo_calls.len(), 1);
    assert_eq!(foo_calls[0].values, vec![Value::Int(5)]);

    let bar_calls = session.logs_for(fx.bar).unwrap();
    assert_eq!(bar_calls.len(), 1);
    assert_eq!(bar_calls[0].values, vec![Value::Int(7), Value::Int(1)]);
    assert!(foo_calls[0].called_at <= bar_calls[0].called_at);
}

#[test]
fn zero_parameter_static_produces_one_record_with_empty_entries() {
    init_tracing();
    let fx = ping_driver();
    let mut session = ShimSession::returnless(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    assert_eq!(session.records().len(), 1);
    session.execute(&[]).unwrap();

    let calls = session.logs_for(fx.ping).unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|entry| entry.values.is_empty()));
    assert!(calls[0].called_at <= calls[1].called_at);
}

#[test]
fn instance_calls_log_the_receiver_per_entry() {
    init_tracing();
    let fx = counter_pair();
    let mut heap = Heap::new();
    let fields = fx.program.zeroed_fields("Counter");
    let left = heap.allocate("Counter", fields.clone());
    let right = heap.allocate("Counter", fields);

    let mut session = ShimSession::returnless(
        fx.program.clone(),
        heap,
        fx.entry,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();
    session
        .execute(&[Value::Obj(left), Value::Obj(right)])
        .unwrap();

    // One record spans both instances; the receiver is the first logged value.
    let calls = session.logs_for(fx.bump).unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].values, vec![Value::Obj(left), Value::Int(1)]);
    assert_eq!(calls[1].values, vec![Value::Obj(right), Value::Int(2)]);
}

#[test]
fn execute_clears_logs_unless_asked_to_append() {
    init_tracing();
    let fx = ping_driver();
    let mut session = ShimSession::returnless(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    session.execute(&[]).unwrap();
    session.execute(&[]).unwrap();
    assert_eq!(session.logs_for(fx.ping).unwrap().len(), 2);

    session.execute_with(false, &[]).unwrap();
    assert_eq!(session.logs_for(fx.ping).unwrap().len(), 4);

    session.clear_logs();
    assert!(session.logs_for(fx.ping).unwrap().is_empty());
}

#[test]
fn return_type_is_validated_eagerly() {
    init_tracing();
    let fx = scenario();
    let session = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Bool,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    let err = session
        .set_return_value(fx.foo, Value::Str("nope".to_string()))
        .unwrap_err();
    assert!(matches!(err, ShimError::TypeMismatch { .. }));

    // Null is not admissible for an Int return.
    let err = session.set_return_value(fx.foo, Value::Null).unwrap_err();
    assert!(matches!(err, ShimError::TypeMismatch { .. }));
}

#[test]
fn returnless_members_reject_configured_returns() {
    init_tracing();
    let fx = ping_driver();
    let session = ShimSession::returnless(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    let err = session.set_return_value(fx.ping, Value::Int(1)).unwrap_err();
    assert!(matches!(err, ShimError::NoReturnValue { .. }));
}

#[test]
fn entry_point_return_shape_is_checked_up_front() {
    init_tracing();
    let fx = scenario();

    let err = ShimSession::returnless(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ShimError::InvalidEntryPoint { .. }));

    let err = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Int,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ShimError::InvalidEntryPoint { .. }));
}

#[test]
fn static_entry_rejects_a_receiver_and_instance_entry_requires_one() {
    init_tracing();
    let fx = counter_pair();
    let mut heap = Heap::new();
    let id = heap.allocate("Counter", fx.program.zeroed_fields("Counter"));

    let err = ShimSession::returnless(
        fx.program.clone(),
        heap,
        fx.entry,
        Some(id),
        DiscoveryOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ShimError::InvalidEntryPoint { .. }));

    let err = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.bump,
        TypeTag::Int,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ShimError::InvalidEntryPoint { .. }));
}

#[test]
fn execute_validates_arguments_before_running() {
    init_tracing();
    let fx = counter_pair();
    let mut heap = Heap::new();
    let id = heap.allocate("Counter", fx.program.zeroed_fields("Counter"));
    let mut session = ShimSession::returnless(
        fx.program.clone(),
        heap,
        fx.entry,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    let err = session.execute(&[Value::Obj(id)]).unwrap_err();
    assert!(matches!(err, ShimError::ArgumentMismatch { .. }));

    let err = session
        .execute(&[Value::Obj(id), Value::Int(3)])
        .unwrap_err();
    assert!(matches!(err, ShimError::ArgumentMismatch { .. }));

    // Nothing ran: no log entries, no partial effects.
    assert!(session.logs_for(fx.bump).unwrap().is_empty());

    // Null is rejected where the parameter is a value kind. `Counter.bump`
    // has no call sites of its own, so this session runs it directly.
    let receiver = session.heap_mut().allocate("Counter", Default::default());
    let mut direct = ShimSession::returning(
        fx.program.clone(),
        std::mem::replace(session.heap_mut(), Heap::new()),
        fx.bump,
        TypeTag::Int,
        Some(receiver),
        DiscoveryOptions::default(),
    )
    .unwrap();
    let err = direct.execute(&[Value::Null]).unwrap_err();
    assert!(matches!(err, ShimError::ArgumentMismatch { .. }));
    assert_eq!(direct.execute(&[Value::Int(4)]).unwrap(), Some(Value::Int(4)));
}

#[test]
fn record_lookup_by_name_is_strict() {
    init_tracing();
    let fx = scenario();
    let session = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Bool,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    assert_eq!(
        session.record_by_name("Calculator.foo").unwrap().member_id(),
        fx.foo
    );
    assert_eq!(session.record_by_name("bar").unwrap().member_id(), fx.bar);

    let err = session.record_by_name("Calculator.baz").unwrap_err();
    assert!(matches!(
        err,
        ShimError::AmbiguousOrMissing { matches: 0, .. }
    ));
}

#[test]
fn overloads_disambiguate_by_probe_not_by_name() {
    init_tracing();
    let mut builder = ProgramBuilder::new();
    let pad1 = builder.declare(
        "Fmt",
        MemberDecl::static_method("pad", vec![TypeTag::Int], Some(TypeTag::Int)),
    );
    builder.set_body(
        pad1,
        Body::new(vec![Op::LoadArg(0), Op::Ret]),
    );
    let pad2 = builder.declare(
        "Fmt",
        MemberDecl::static_method(
            "pad",
            vec![TypeTag::Int, TypeTag::Int],
            Some(TypeTag::Int),
        ),
    );
    builder.set_body(
        pad2,
        Body::new(vec![Op::LoadArg(0), Op::Ret]),
    );
    let entry = builder.declare(
        "Fmt",
        MemberDecl::static_method("render", vec![], Some(TypeTag::Int)),
    );
    builder.set_body(
        entry,
        Body::new(vec![
            Op::PushInt(1),
            Op::Call(pad1),
            Op::PushInt(2),
            Op::PushInt(3),
            Op::Call(pad2),
            Op::Add,
            Op::Ret,
        ]),
    );
    let program = Arc::new(builder.build());

    let mut session = ShimSession::returning(
        program,
        Heap::new(),
        entry,
        TypeTag::Int,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    // Both overloads surfaced, so a bare name is ambiguous.
    let err = session.record_by_name("Fmt.pad").unwrap_err();
    assert!(matches!(
        err,
        ShimError::AmbiguousOrMissing { matches: 2, .. }
    ));

    // A probe carries argument values and overload-resolves.
    let one_arg = session
        .record_by_probe("Fmt", "pad", &[Value::Int(0)])
        .unwrap();
    assert_eq!(one_arg.member_id(), pad1);
    session
        .set_return_value(pad1, Value::Int(10))
        .unwrap();
    session
        .set_return_value(pad2, Value::Int(20))
        .unwrap();
    assert_eq!(session.execute(&[]).unwrap(), Some(Value::Int(30)));

    // Name-based configuration hits the same ambiguity wall; the entry
    // point itself is never a record.
    let err = session
        .set_return_value_by_name("Fmt.pad", Value::Int(1))
        .unwrap_err();
    assert!(matches!(err, ShimError::AmbiguousOrMissing { .. }));
    let err = session.logs_for_name("render").unwrap_err();
    assert!(matches!(
        err,
        ShimError::AmbiguousOrMissing { matches: 0, .. }
    ));
}

#[test]
fn last_execution_results_aggregate_per_member() {
    init_tracing();
    let fx = scenario();
    let mut session = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Bool,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();
    session.execute(&[]).unwrap();

    let results = session.last_execution_results();
    assert_eq!(results.len(), 2);
    for (desc, calls) in &results {
        assert_eq!(calls.len(), 1, "{desc} should have exactly one entry");
    }
}

#[test]
fn reset_return_value_restores_the_synthesized_default() {
    init_tracing();
    let fx = scenario();
    let mut session = ShimSession::returning(
        fx.program.clone(),
        Heap::new(),
        fx.entry,
        TypeTag::Bool,
        None,
        DiscoveryOptions::default(),
    )
    .unwrap();

    session.set_return_value(fx.foo, Value::Int(3)).unwrap();
    session.set_return_value(fx.bar, Value::Int(7)).unwrap();
    assert_eq!(session.execute(&[]).unwrap(), Some(Value::Bool(true)));

    session.reset_return_value(fx.bar).unwrap();
    // foo stays 3, bar falls back to 0, so `3 < 0` is false.
    assert_eq!(session.execute(&[]).unwrap(), Some(Value::Bool(false)));
}
