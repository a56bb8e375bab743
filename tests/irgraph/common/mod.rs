use std::sync::Once;

use anyhow::{anyhow, Result};
use irgraph::{
    register, FieldInfo, ObjectData, ObjectRef, StaticTag, StructuralKind, TypeInfo, Value,
    ValueMap, FIELD_SEQ_HASH_DEF, FIELD_SEQ_HASH_IGNORE,
};

pub const INT_PAIR_KEY: &str = "test.IntPair";
pub const VAR_KEY: &str = "test.Var";
pub const LET_KEY: &str = "test.Let";
pub const WRAP_KEY: &str = "test.Wrap";
pub const SEQ_KEY: &str = "test.Seq";
pub const INSTANCE_KEY: &str = "test.Instance";
pub const ANNOTATED_KEY: &str = "test.Annotated";
pub const FUNCTION_KEY: &str = "test.Function";

fn var_create_init(info: &TypeInfo, repr_bytes: Option<Vec<u8>>) -> Result<Value> {
    let bytes = repr_bytes.ok_or_else(|| anyhow!("variable nodes need a name payload"))?;
    let name = String::from_utf8(bytes)?;
    Ok(Value::Object(ObjectData::with_fields(
        info.type_key,
        vec![Value::Str(name)],
    )))
}

fn var_repr_bytes(obj: &ObjectData) -> Option<Vec<u8>> {
    obj.field(0).as_str().map(|name| name.as_bytes().to_vec())
}

/// Register the fixture node types once per process.
pub fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        register(
            TypeInfo::new(INT_PAIR_KEY, StructuralKind::ConstTreeNode).with_fields(vec![
                FieldInfo::new("a", StaticTag::Int),
                FieldInfo::new("b", StaticTag::Int),
            ]),
        )
        .expect("register IntPair");
        register(
            TypeInfo::new(VAR_KEY, StructuralKind::FreeVar)
                .with_fields(vec![FieldInfo::new("name", StaticTag::ObjectRef)])
                .with_create_init(var_create_init)
                .with_repr_bytes(var_repr_bytes),
        )
        .expect("register Var");
        // `var` is declared last so a body reference is reached before the
        // binding region opens
        register(
            TypeInfo::new(LET_KEY, StructuralKind::DAGNode).with_fields(vec![
                FieldInfo::new("value", StaticTag::AnyValue),
                FieldInfo::new("body", StaticTag::AnyValue),
                FieldInfo::with_flags("var", StaticTag::ObjectRef, FIELD_SEQ_HASH_DEF),
            ]),
        )
        .expect("register Let");
        register(
            TypeInfo::new(WRAP_KEY, StructuralKind::ConstTreeNode)
                .with_fields(vec![FieldInfo::new("field1", StaticTag::AnyValue)]),
        )
        .expect("register Wrap");
        register(
            TypeInfo::new(SEQ_KEY, StructuralKind::DAGNode)
                .with_fields(vec![FieldInfo::new("items", StaticTag::AnyValue)]),
        )
        .expect("register Seq");
        register(TypeInfo::new(INSTANCE_KEY, StructuralKind::UniqueInstance))
            .expect("register Instance");
        register(
            TypeInfo::new(ANNOTATED_KEY, StructuralKind::ConstTreeNode).with_fields(vec![
                FieldInfo::new("value", StaticTag::Int),
                FieldInfo::with_flags("note", StaticTag::AnyValue, FIELD_SEQ_HASH_IGNORE),
            ]),
        )
        .expect("register Annotated");
        register(
            TypeInfo::new(FUNCTION_KEY, StructuralKind::ConstTreeNode)
                .with_fields(vec![FieldInfo::new("body", StaticTag::AnyValue)]),
        )
        .expect("register Function");
    });
}

pub fn int_pair(a: i64, b: i64) -> Value {
    Value::Object(ObjectData::with_fields(
        INT_PAIR_KEY,
        vec![Value::Int(a), Value::Int(b)],
    ))
}

pub fn var(name: &str) -> ObjectRef {
    ObjectData::with_fields(VAR_KEY, vec![Value::str(name)])
}

pub fn let_node(value: Value, body: Value, var: ObjectRef) -> Value {
    Value::Object(ObjectData::with_fields(
        LET_KEY,
        vec![value, body, Value::Object(var)],
    ))
}

pub fn wrap(field1: Value) -> Value {
    Value::Object(ObjectData::with_fields(WRAP_KEY, vec![field1]))
}

pub fn seq(items: Vec<Value>) -> Value {
    Value::Object(ObjectData::with_fields(SEQ_KEY, vec![Value::array(items)]))
}

pub fn function(body: Value) -> Value {
    Value::Object(ObjectData::with_fields(FUNCTION_KEY, vec![body]))
}

pub fn int_array(values: &[i64]) -> Value {
    Value::array(values.iter().map(|v| Value::Int(*v)).collect())
}

pub fn str_map(entries: &[(&str, i64)]) -> Value {
    let mut map = ValueMap::new();
    for (key, value) in entries {
        map.insert(Value::str(*key), Value::Int(*value));
    }
    Value::map(map)
}
