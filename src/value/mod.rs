use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::tensor::{DataType, Device, NDArray, Shape};

/// Shared, interior-mutable array of values. Mutation happens only while the
/// loader fills shells; indexed graphs treat the contents as frozen.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
/// Shared, interior-mutable map of values.
pub type MapRef = Rc<RefCell<ValueMap>>;
/// Shared reflected object.
pub type ObjectRef = Rc<ObjectData>;

/// Type keys of the built-in value tags on the wire. Reflected objects use
/// their registered key; `None` nodes use the empty string.
pub const BOOL_TYPE_KEY: &str = "bool";
pub const INT_TYPE_KEY: &str = "int";
pub const FLOAT_TYPE_KEY: &str = "float";
pub const DATATYPE_TYPE_KEY: &str = "DataType";
pub const DEVICE_TYPE_KEY: &str = "Device";
pub const STR_TYPE_KEY: &str = "Str";
pub const BYTES_TYPE_KEY: &str = "Bytes";
pub const SHAPE_TYPE_KEY: &str = "Shape";
pub const NDARRAY_TYPE_KEY: &str = "NDArray";
pub const ARRAY_TYPE_KEY: &str = "Array";
pub const MAP_TYPE_KEY: &str = "Map";

/// Tagged value space of the object model.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    DataType(DataType),
    Device(Device),
    Str(String),
    Bytes(Vec<u8>),
    Shape(Shape),
    NDArray(NDArray),
    Array(ArrayRef),
    Map(MapRef),
    Object(ObjectRef),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: ValueMap) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn str(text: impl Into<String>) -> Value {
        Value::Str(text.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Whether the value occupies a heap slot of its own in the serialized
    /// graph (as opposed to encoding inline in an owner's attrs).
    pub fn is_heap(&self) -> bool {
        matches!(
            self,
            Value::Str(_)
                | Value::Bytes(_)
                | Value::Shape(_)
                | Value::NDArray(_)
                | Value::Array(_)
                | Value::Map(_)
                | Value::Object(_)
        )
    }

    /// Wire type key of the value. Reflected objects report their registered
    /// key, `None` the empty string.
    pub fn type_key(&self) -> &str {
        match self {
            Value::None => "",
            Value::Bool(_) => BOOL_TYPE_KEY,
            Value::Int(_) => INT_TYPE_KEY,
            Value::Float(_) => FLOAT_TYPE_KEY,
            Value::DataType(_) => DATATYPE_TYPE_KEY,
            Value::Device(_) => DEVICE_TYPE_KEY,
            Value::Str(_) => STR_TYPE_KEY,
            Value::Bytes(_) => BYTES_TYPE_KEY,
            Value::Shape(_) => SHAPE_TYPE_KEY,
            Value::NDArray(_) => NDARRAY_TYPE_KEY,
            Value::Array(_) => ARRAY_TYPE_KEY,
            Value::Map(_) => MAP_TYPE_KEY,
            Value::Object(obj) => obj.type_key(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// Reflected object: a registered type key plus one slot per declared field,
/// in declared order. Slots start out `None` and are filled either by the
/// constructor or by the loader's fill pass.
#[derive(Debug)]
pub struct ObjectData {
    type_key: String,
    fields: RefCell<Vec<Value>>,
}

impl ObjectData {
    /// Allocate a shell with `num_fields` empty slots.
    pub fn new(type_key: impl Into<String>, num_fields: usize) -> ObjectRef {
        Rc::new(Self {
            type_key: type_key.into(),
            fields: RefCell::new(vec![Value::None; num_fields]),
        })
    }

    /// Allocate with pre-populated slots.
    pub fn with_fields(type_key: impl Into<String>, fields: Vec<Value>) -> ObjectRef {
        Rc::new(Self {
            type_key: type_key.into(),
            fields: RefCell::new(fields),
        })
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn num_fields(&self) -> usize {
        self.fields.borrow().len()
    }

    /// Read a slot by declared index.
    pub fn field(&self, index: usize) -> Value {
        self.fields.borrow()[index].clone()
    }

    /// Write a slot by declared index.
    pub fn set_field(&self, index: usize, value: Value) {
        self.fields.borrow_mut()[index] = value;
    }
}

/// Value-keyed map with insertion order. Keys use [`ValueKey`] semantics:
/// structural for value-like tags, reference identity for heap objects.
#[derive(Debug, Default, Clone)]
pub struct ValueMap {
    entries: IndexMap<ValueKey, Value>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        self.entries.insert(ValueKey(key), value);
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(&ValueKey(key.clone()))
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(&ValueKey(key.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (&k.0, v))
    }

    /// Whether every key is a `Str` value (the distinguished wire case).
    pub fn is_str_keyed(&self) -> bool {
        self.entries.keys().all(|k| matches!(k.0, Value::Str(_)))
    }
}

/// Hash/equality wrapper over [`Value`] shared by the node indexer and map
/// keys. Primitives, strings, bytes and shapes compare structurally (floats
/// by bit pattern); arrays, maps, tensors and objects compare by pointer
/// identity. Structural hashing of shared objects would recurse forever on
/// DAGs, hence the split.
#[derive(Debug, Clone)]
pub struct ValueKey(pub Value);

fn tag_ord(value: &Value) -> u8 {
    match value {
        Value::None => 0,
        Value::Bool(_) => 1,
        Value::Int(_) => 2,
        Value::Float(_) => 3,
        Value::DataType(_) => 4,
        Value::Device(_) => 5,
        Value::Str(_) => 6,
        Value::Bytes(_) => 7,
        Value::Shape(_) => 8,
        Value::NDArray(_) => 9,
        Value::Array(_) => 10,
        Value::Map(_) => 11,
        Value::Object(_) => 12,
    }
}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        tag_ord(&self.0).hash(state);
        match &self.0 {
            Value::None => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::DataType(dtype) => dtype.hash(state),
            Value::Device(device) => device.hash(state),
            Value::Str(text) => text.hash(state),
            Value::Bytes(bytes) => bytes.hash(state),
            Value::Shape(shape) => shape.hash(state),
            Value::NDArray(t) => (Rc::as_ptr(t) as usize).hash(state),
            Value::Array(items) => (Rc::as_ptr(items) as usize).hash(state),
            Value::Map(entries) => (Rc::as_ptr(entries) as usize).hash(state),
            Value::Object(obj) => (Rc::as_ptr(obj) as usize).hash(state),
        }
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::DataType(a), Value::DataType(b)) => a == b,
            (Value::Device(a), Value::Device(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Shape(a), Value::Shape(b)) => a == b,
            (Value::NDArray(a), Value::NDArray(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for ValueKey {}
