//! Builtin members seeded into every program.
//!
//! String concatenation is relied upon by implicit control flow (the `+`
//! operator lowers to it), so it sits on the fixed never-redirect denylist.

use crate::member::MemberDecl;
use crate::program::ProgramBuilder;
use crate::value::TypeTag;

pub const TEXT_TYPE: &str = "Text";
pub const CONCAT: &str = "concat";

pub(crate) fn seed(builder: &mut ProgramBuilder) {
    builder.add_type(TEXT_TYPE);
    let concat = builder.declare(
        TEXT_TYPE,
        MemberDecl::static_method(
            CONCAT,
            vec![TypeTag::Str, TypeTag::Str],
            Some(TypeTag::Str),
        ),
    );
    builder.mark_native(concat);
    builder.mark_never_redirect(concat);
}
