//! Shared program model for the shimbox workspace.
//!
//! This crate provides the foundational types used by both the redirection
//! engine and the interception core, breaking circular dependency chains:
//!
//! - [`value`]: declared type tags and runtime values
//! - [`heap`]: instance handles and the object heap
//! - [`member`]: member descriptors and signature identity
//! - [`body`]: compiled bodies and call-site enumeration
//! - [`program`]: the type/member registry with inheritance introspection
//! - [`well_known`]: builtin members that must never be redirected

pub mod body;
pub mod heap;
pub mod member;
pub mod program;
pub mod value;
pub mod well_known;

pub use body::{Body, Op};
pub use heap::{Heap, Instance, InstanceId};
pub use member::{MemberDecl, MemberDescriptor, MemberId, MemberKind, SignatureKey, Visibility};
pub use program::{FieldDef, Program, ProgramBuilder, TypeDef};
pub use value::{ArgVec, TypeTag, Value};
