//! The immutable program: type definitions, the member descriptor arena,
//! compiled bodies, and the inheritance introspection the resolution
//! matcher relies on.

use std::collections::{HashMap, HashSet};

use crate::body::Body;
use crate::heap::Heap;
use crate::member::{MemberDecl, MemberDescriptor, MemberId, MemberKind, Visibility};
use crate::value::{TypeTag, Value};
use crate::well_known;

/// One declared field of a type.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub tag: TypeTag,
}

/// One type: optional base type, fields, and declared members.
#[derive(Debug, Clone, Default)]
pub struct TypeDef {
    pub base: Option<String>,
    pub fields: Vec<FieldDef>,
    pub members: Vec<MemberId>,
}

/// Immutable registry of types, members, and bodies.
#[derive(Debug)]
pub struct Program {
    types: HashMap<String, TypeDef>,
    members: Vec<MemberDescriptor>,
    bodies: HashMap<MemberId, Body>,
    natives: HashSet<MemberId>,
    never_redirect: HashSet<MemberId>,
}

impl Program {
    pub fn descriptor(&self, id: MemberId) -> &MemberDescriptor {
        &self.members[id.index()]
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn body(&self, id: MemberId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Members implemented by the engine rather than by a compiled body.
    pub fn is_native(&self, id: MemberId) -> bool {
        self.natives.contains(&id)
    }

    /// Members on the fixed denylist that discovery must never redirect.
    pub fn is_never_redirect(&self, id: MemberId) -> bool {
        self.never_redirect.contains(&id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// All members of `declaring_type` with the given name (overloads included).
    pub fn members_named(&self, declaring_type: &str, name: &str) -> Vec<MemberId> {
        self.types
            .get(declaring_type)
            .map(|td| {
                td.members
                    .iter()
                    .copied()
                    .filter(|&m| self.members[m.index()].name == name)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The builtin string-concatenation intrinsic seeded into every program.
    pub fn concat_member(&self) -> MemberId {
        // Seeded first by ProgramBuilder::new, so index 0 is stable.
        MemberId(0)
    }

    /// Base-type chain starting at `type_name` itself, most derived first.
    /// Cycle-safe: each type appears at most once.
    fn base_chain<'a>(&'a self, type_name: &'a str) -> Vec<&'a str> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(type_name);
        while let Some(name) = current {
            if !seen.insert(name) {
                break;
            }
            chain.push(name);
            current = self
                .types
                .get(name)
                .and_then(|td| td.base.as_deref());
        }
        chain
    }

    /// Reflexive subtype test along the base chain.
    pub fn is_subtype(&self, sub: &str, ancestor: &str) -> bool {
        self.base_chain(sub).iter().any(|&t| t == ancestor)
    }

    /// Resolve a virtual call through the receiver's runtime type: the most
    /// derived signature-equal member between the runtime type and the
    /// declaring type wins. Non-virtual and static members resolve to
    /// themselves.
    pub fn resolve_virtual(&self, declared: MemberId, runtime_type: &str) -> MemberId {
        let desc = &self.members[declared.index()];
        if !desc.is_virtual || desc.is_static {
            return declared;
        }
        for ty in self.base_chain(runtime_type) {
            if ty == desc.declaring_type {
                break;
            }
            if let Some(td) = self.types.get(ty) {
                for &candidate in &td.members {
                    let cand = &self.members[candidate.index()];
                    if cand.kind == MemberKind::Method
                        && cand.name == desc.name
                        && cand.params == desc.params
                    {
                        return candidate;
                    }
                }
            }
        }
        declared
    }

    /// Whether an intervening override exists between `declared`'s declaring
    /// type and `runtime_type`. When it does, the base-declared record is no
    /// longer authoritative for receivers of that runtime type.
    pub fn is_overridden_between(&self, declared: MemberId, runtime_type: &str) -> bool {
        self.resolve_virtual(declared, runtime_type) != declared
    }

    /// The type's zero-argument constructor, if it declares one.
    pub fn zero_arg_constructor(&self, type_name: &str) -> Option<MemberId> {
        self.types.get(type_name).and_then(|td| {
            td.members.iter().copied().find(|&m| {
                let desc = &self.members[m.index()];
                desc.kind == MemberKind::Constructor && desc.params.is_empty()
            })
        })
    }

    /// Zero-valued field map for a fresh instance, including inherited
    /// fields. Reference-typed fields start as `Null`; synthesis never runs
    /// user constructor bodies.
    pub fn zeroed_fields(&self, type_name: &str) -> HashMap<String, Value> {
        let mut fields = HashMap::new();
        for ty in self.base_chain(type_name) {
            if let Some(td) = self.types.get(ty) {
                for field in &td.fields {
                    fields
                        .entry(field.name.clone())
                        .or_insert_with(|| zero_value(&field.tag));
                }
            }
        }
        fields
    }

    /// Runtime assignability of a value to a declared tag. `Null` is
    /// assignable only to reference kinds; object handles must be live
    /// instances of the declared type or a subtype.
    pub fn is_assignable(&self, value: &Value, tag: &TypeTag, heap: &Heap) -> bool {
        match (value, tag) {
            (Value::Bool(_), TypeTag::Bool)
            | (Value::Int(_), TypeTag::Int)
            | (Value::Float(_), TypeTag::Float)
            | (Value::Str(_), TypeTag::Str) => true,
            (Value::Null, TypeTag::Obj(_)) => true,
            (Value::Obj(id), TypeTag::Obj(declared)) => heap
                .type_of(*id)
                .map_or(false, |runtime| self.is_subtype(runtime, declared)),
            _ => false,
        }
    }
}

fn zero_value(tag: &TypeTag) -> Value {
    match tag {
        TypeTag::Bool => Value::Bool(false),
        TypeTag::Int => Value::Int(0),
        TypeTag::Float => Value::Float(0.0),
        TypeTag::Str => Value::Str(String::new()),
        TypeTag::Obj(_) => Value::Null,
    }
}

/// Construction surface for [`Program`] fixtures.
///
/// Members are declared first so bodies can reference their [`MemberId`]s,
/// then bodies are attached with [`set_body`](Self::set_body). `new` seeds
/// the well-known builtins.
#[derive(Debug)]
pub struct ProgramBuilder {
    types: HashMap<String, TypeDef>,
    members: Vec<MemberDescriptor>,
    bodies: HashMap<MemberId, Body>,
    natives: HashSet<MemberId>,
    never_redirect: HashSet<MemberId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            types: HashMap::new(),
            members: Vec::new(),
            bodies: HashMap::new(),
            natives: HashSet::new(),
            never_redirect: HashSet::new(),
        };
        well_known::seed(&mut builder);
        builder
    }

    pub fn add_type(&mut self, name: &str) {
        self.types.entry(name.to_string()).or_default();
    }

    pub fn add_subtype(&mut self, name: &str, base: &str) {
        self.types.entry(name.to_string()).or_default().base = Some(base.to_string());
    }

    pub fn add_field(&mut self, type_name: &str, field: &str, tag: TypeTag) {
        self.types
            .entry(type_name.to_string())
            .or_default()
            .fields
            .push(FieldDef {
                name: field.to_string(),
                tag,
            });
    }

    /// Declare a method on `declaring_type`, creating the type if needed.
    pub fn declare(&mut self, declaring_type: &str, decl: MemberDecl) -> MemberId {
        self.push_member(MemberDescriptor {
            declaring_type: declaring_type.to_string(),
            name: decl.name,
            params: decl.params,
            ret: decl.ret,
            is_static: decl.is_static,
            is_virtual: decl.is_virtual,
            visibility: decl.visibility,
            is_special_name: decl.is_special_name,
            kind: MemberKind::Method,
        })
    }

    /// Declare a constructor. Constructors are static-shaped (no receiver at
    /// the call site) and "return" the constructed instance.
    pub fn declare_constructor(&mut self, declaring_type: &str, params: Vec<TypeTag>) -> MemberId {
        self.push_member(MemberDescriptor {
            declaring_type: declaring_type.to_string(),
            name: "new".to_string(),
            params,
            ret: Some(TypeTag::Obj(declaring_type.to_string())),
            is_static: true,
            is_virtual: false,
            visibility: Visibility::Public,
            is_special_name: false,
            kind: MemberKind::Constructor,
        })
    }

    fn push_member(&mut self, descriptor: MemberDescriptor) -> MemberId {
        let id = MemberId(self.members.len() as u32);
        self.types
            .entry(descriptor.declaring_type.clone())
            .or_default()
            .members
            .push(id);
        self.members.push(descriptor);
        id
    }

    pub fn set_body(&mut self, member: MemberId, body: Body) {
        self.bodies.insert(member, body);
    }

    /// The seeded concatenation intrinsic, for bodies that reference it.
    pub fn concat_member(&self) -> MemberId {
        // Seeded first in `new`, so index 0 is stable.
        MemberId(0)
    }

    pub(crate) fn mark_native(&mut self, member: MemberId) {
        self.natives.insert(member);
    }

    pub(crate) fn mark_never_redirect(&mut self, member: MemberId) {
        self.never_redirect.insert(member);
    }

    pub fn build(self) -> Program {
        Program {
            types: self.types,
            members: self.members,
            bodies: self.bodies,
            natives: self.natives,
            never_redirect: self.never_redirect,
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}
