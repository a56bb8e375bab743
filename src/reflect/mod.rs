mod registry;

use anyhow::{anyhow, Result};

use crate::value::{ObjectData, Value};

pub use registry::{info, info_for, register};

/// Skip this field during structural equality and hashing.
pub const FIELD_SEQ_HASH_IGNORE: u32 = 1 << 0;
/// This field opens a binding region: free variables first reached inside it
/// may be renamed.
pub const FIELD_SEQ_HASH_DEF: u32 = 1 << 1;

/// Declared static type of a reflected field. Anything heap-allocated
/// (strings, containers, tensors, other objects) is declared `ObjectRef` or
/// `AnyValue`; both encode as node-id references on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticTag {
    Bool,
    Int,
    Float,
    DataType,
    ObjectRef,
    AnyValue,
}

impl StaticTag {
    /// Whether a field of this declared type serializes as a node-id
    /// reference rather than an inline attr.
    pub fn is_reference(self) -> bool {
        matches!(self, StaticTag::ObjectRef | StaticTag::AnyValue)
    }
}

/// Per-field metadata in declared order.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    pub name: &'static str,
    pub static_tag: StaticTag,
    pub flags: u32,
}

impl FieldInfo {
    pub const fn new(name: &'static str, static_tag: StaticTag) -> Self {
        Self {
            name,
            static_tag,
            flags: 0,
        }
    }

    pub const fn with_flags(name: &'static str, static_tag: StaticTag, flags: u32) -> Self {
        Self {
            name,
            static_tag,
            flags,
        }
    }

    pub fn ignored(&self) -> bool {
        self.flags & FIELD_SEQ_HASH_IGNORE != 0
    }

    pub fn opens_def_region(&self) -> bool {
        self.flags & FIELD_SEQ_HASH_DEF != 0
    }
}

/// Per-type equality policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    /// No structural semantics; identity only.
    Unsupported,
    /// Singleton-like; identity only.
    UniqueInstance,
    /// Pure tree constant; identity short-circuits, contents decide.
    ConstTreeNode,
    /// Shared node; equal pairs are recorded and must stay consistent.
    DAGNode,
    /// Binding occurrence; may be renamed inside a def region.
    FreeVar,
}

/// Reads the field slot at a declared index.
pub type FieldGetter = fn(&ObjectData, usize) -> Value;
/// Writes the field slot at a declared index.
pub type FieldSetter = fn(&ObjectData, usize, Value);
/// Builds an object shell (possibly consuming repr bytes).
pub type CreateInitFn = fn(&TypeInfo, Option<Vec<u8>>) -> Result<Value>;
/// Produces the opaque leaf serialization for repr types.
pub type ReprBytesFn = fn(&ObjectData) -> Option<Vec<u8>>;

fn slot_getter(obj: &ObjectData, index: usize) -> Value {
    obj.field(index)
}

fn slot_setter(obj: &ObjectData, index: usize, value: Value) {
    obj.set_field(index, value);
}

fn default_create_init(info: &TypeInfo, repr_bytes: Option<Vec<u8>>) -> Result<Value> {
    if repr_bytes.is_some() {
        return Err(anyhow!(
            "type `{}` does not accept repr bytes",
            info.type_key
        ));
    }
    Ok(Value::Object(ObjectData::new(
        info.type_key,
        info.fields.len(),
    )))
}

/// Registered metadata for one reflected type.
pub struct TypeInfo {
    pub type_key: &'static str,
    pub fields: Vec<FieldInfo>,
    pub getter: FieldGetter,
    pub setter: FieldSetter,
    pub create_init: CreateInitFn,
    pub repr_bytes: Option<ReprBytesFn>,
    pub structural_kind: StructuralKind,
}

impl TypeInfo {
    pub fn new(type_key: &'static str, structural_kind: StructuralKind) -> Self {
        Self {
            type_key,
            fields: Vec::new(),
            getter: slot_getter,
            setter: slot_setter,
            create_init: default_create_init,
            repr_bytes: None,
            structural_kind,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldInfo>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_create_init(mut self, create_init: CreateInitFn) -> Self {
        self.create_init = create_init;
        self
    }

    pub fn with_repr_bytes(mut self, repr_bytes: ReprBytesFn) -> Self {
        self.repr_bytes = Some(repr_bytes);
        self
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Visit fields in declared order. Declared order is the canonical order
    /// for both serialization and equality.
    pub fn for_each_field(&self, mut visit: impl FnMut(usize, &FieldInfo)) {
        for (index, field) in self.fields.iter().enumerate() {
            visit(index, field);
        }
    }

    /// Visit fields in declared order, stopping at the first `true` return.
    /// Returns whether the visit was stopped early.
    pub fn for_each_field_early_stop(
        &self,
        mut visit: impl FnMut(usize, &FieldInfo) -> bool,
    ) -> bool {
        for (index, field) in self.fields.iter().enumerate() {
            if visit(index, field) {
                return true;
            }
        }
        false
    }

    /// Opaque leaf serialization of `obj`, when this type has one.
    pub fn get_repr_bytes(&self, obj: &ObjectData) -> Option<Vec<u8>> {
        self.repr_bytes.and_then(|f| f(obj))
    }

    /// Whether `obj` serializes as an opaque leaf. Only non-empty repr bytes
    /// count; an empty payload falls back to field encoding.
    pub fn has_repr_leaf(&self, obj: &ObjectData) -> bool {
        self.get_repr_bytes(obj).is_some_and(|repr| !repr.is_empty())
    }
}
