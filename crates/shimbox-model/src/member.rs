//! Member descriptors: the stable identity of a callable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::TypeTag;

/// Arena index into a program's descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub(crate) u32);

impl MemberId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    /// Constructors have a distinct invocation shape: no receiver at the
    /// call site, and the "return value" is the constructed instance.
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

/// Immutable identity of one callable member.
///
/// Two descriptors are *signature-equal* iff declaring type, name, and
/// parameter types match; see [`SignatureKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub declaring_type: String,
    pub name: String,
    pub params: Vec<TypeTag>,
    /// `None` for members with no return channel.
    pub ret: Option<TypeTag>,
    pub is_static: bool,
    pub is_virtual: bool,
    pub visibility: Visibility,
    pub is_special_name: bool,
    pub kind: MemberKind,
}

impl MemberDescriptor {
    pub fn signature_key(&self) -> SignatureKey {
        SignatureKey {
            declaring_type: self.declaring_type.clone(),
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }

    /// Number of values a call site supplies: declared parameters, plus the
    /// receiver for instance members.
    pub fn invocation_arity(&self) -> usize {
        self.params.len() + usize::from(!self.is_static)
    }

    /// Full signature for diagnostics, e.g. `Calculator.add(Int, Int) -> Int`.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(TypeTag::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match &self.ret {
            Some(tag) => format!("{self}({params}) -> {tag}"),
            None => format!("{self}({params})"),
        }
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// Signature-equality key: declaring type, name, and parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    pub declaring_type: String,
    pub name: String,
    pub params: Vec<TypeTag>,
}

/// Declaration input for [`ProgramBuilder::declare`](crate::ProgramBuilder::declare).
///
/// Constructors build the common shapes; the chained modifiers flip the
/// less common flags.
#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub name: String,
    pub params: Vec<TypeTag>,
    pub ret: Option<TypeTag>,
    pub is_static: bool,
    pub is_virtual: bool,
    pub visibility: Visibility,
    pub is_special_name: bool,
}

impl MemberDecl {
    pub fn static_method(name: &str, params: Vec<TypeTag>, ret: Option<TypeTag>) -> Self {
        Self {
            name: name.to_string(),
            params,
            ret,
            is_static: true,
            is_virtual: false,
            visibility: Visibility::Public,
            is_special_name: false,
        }
    }

    pub fn instance_method(name: &str, params: Vec<TypeTag>, ret: Option<TypeTag>) -> Self {
        Self {
            is_static: false,
            ..Self::static_method(name, params, ret)
        }
    }

    pub fn virtual_method(name: &str, params: Vec<TypeTag>, ret: Option<TypeTag>) -> Self {
        Self {
            is_static: false,
            is_virtual: true,
            ..Self::static_method(name, params, ret)
        }
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn special_name(mut self) -> Self {
        self.is_special_name = true;
        self
    }
}
