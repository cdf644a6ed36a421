//! Default-value synthesis for arbitrary declared return types.

use shimbox_model::{Heap, Program, TypeTag, Value};

/// Compute a safe default for a declared type.
///
/// Value kinds yield their canonical zero. Reference kinds yield a freshly
/// allocated instance with zero-valued fields when the type exposes a
/// zero-argument constructor — user constructor bodies never run, so
/// synthesis stays free of side effects — and the explicit `Null` marker
/// otherwise. Called at record construction and whenever a configured value
/// is reset.
pub fn synthesize_default(tag: &TypeTag, program: &Program, heap: &mut Heap) -> Value {
    match tag {
        TypeTag::Bool => Value::Bool(false),
        TypeTag::Int => Value::Int(0),
        TypeTag::Float => Value::Float(0.0),
        TypeTag::Str => Value::Str(String::new()),
        TypeTag::Obj(type_name) => {
            if program.zero_arg_constructor(type_name).is_some() {
                let fields = program.zeroed_fields(type_name);
                Value::Obj(heap.allocate(type_name, fields))
            } else {
                Value::Null
            }
        }
    }
}
