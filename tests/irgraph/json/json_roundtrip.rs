use std::rc::Rc;

use anyhow::Result;
use irgraph::{
    load_json, save_json, structural_equal, DataType, Device, NDArrayData, Shape, Value, ValueMap,
};

use crate::common;

fn roundtrip(graph: &Value) -> Result<Value> {
    Ok(load_json(&save_json(graph)?)?)
}

#[test]
fn nested_graph_roundtrips_structurally() -> Result<()> {
    common::setup();
    let graph = common::wrap(Value::array(vec![
        common::int_pair(1, 2),
        common::str_map(&[("lr", 10), ("steps", 20)]),
        Value::Shape(Shape::new(vec![2, 3, 4])),
        Value::DataType(DataType::float32()),
        Value::Device(Device::cpu()),
        Value::str("label"),
        Value::Bytes(vec![0, 1, 254]),
        Value::Float(0.25),
        Value::Bool(true),
        Value::None,
    ]));
    let loaded = roundtrip(&graph)?;
    assert!(structural_equal(&loaded, &graph, false, false)?);
    Ok(())
}

#[test]
fn sharing_survives_roundtrip() -> Result<()> {
    common::setup();
    let x = common::int_pair(1, 2);
    let loaded = roundtrip(&Value::array(vec![x.clone(), x]))?;
    let items = loaded.as_array().unwrap().borrow();
    let first = items[0].as_object().unwrap();
    let second = items[1].as_object().unwrap();
    assert!(Rc::ptr_eq(first, second));
    Ok(())
}

#[test]
fn let_with_variables_roundtrips_modulo_renaming() -> Result<()> {
    common::setup();
    let x = common::var("x");
    let graph = common::let_node(Value::Int(1), Value::Object(x.clone()), x);
    let loaded = roundtrip(&graph)?;
    assert!(structural_equal(&loaded, &graph, true, false)?);

    // the loaded binder and its use are one object again
    let obj = loaded.as_object().unwrap();
    let body = obj.field(1);
    let var = obj.field(2);
    assert!(Rc::ptr_eq(
        body.as_object().unwrap(),
        var.as_object().unwrap()
    ));
    Ok(())
}

#[test]
fn ndarray_roundtrips_with_content() -> Result<()> {
    common::setup();
    let tensor = NDArrayData::from_slice(
        DataType::float32(),
        vec![2, 3],
        &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0],
    )?;
    let graph = common::wrap(Value::NDArray(tensor));
    let loaded = roundtrip(&graph)?;
    assert!(structural_equal(&loaded, &graph, false, false)?);
    Ok(())
}

#[test]
fn shared_ndarray_stays_shared() -> Result<()> {
    common::setup();
    let tensor = NDArrayData::from_slice(DataType::int64(), vec![2], &[7i64, 8])?;
    let graph = Value::array(vec![
        Value::NDArray(tensor.clone()),
        Value::NDArray(tensor),
    ]);
    let saved = save_json(&graph)?;
    let parsed: serde_json::Value = serde_json::from_str(&saved)?;
    assert_eq!(parsed["b64ndarrays"].as_array().unwrap().len(), 1);
    let loaded = load_json(&saved)?;
    let items = loaded.as_array().unwrap().borrow();
    match (&items[0], &items[1]) {
        (Value::NDArray(a), Value::NDArray(b)) => assert!(Rc::ptr_eq(a, b)),
        _ => panic!("expected tensors"),
    }
    Ok(())
}

#[test]
fn empty_string_and_bytes_roundtrip() -> Result<()> {
    common::setup();
    let graph = Value::array(vec![Value::str(""), Value::Bytes(Vec::new())]);
    let loaded = roundtrip(&graph)?;
    let items = loaded.as_array().unwrap().borrow();
    assert_eq!(items[0].as_str(), Some(""));
    assert!(matches!(&items[1], Value::Bytes(b) if b.is_empty()));
    Ok(())
}

#[test]
fn general_map_roundtrips() -> Result<()> {
    common::setup();
    let mut entries = ValueMap::new();
    entries.insert(Value::Int(1), Value::str("one"));
    entries.insert(Value::str("two"), Value::Int(2));
    let graph = Value::map(entries);
    let loaded = roundtrip(&graph)?;
    assert!(structural_equal(&loaded, &graph, false, false)?);
    Ok(())
}

#[test]
fn float_specials_roundtrip() -> Result<()> {
    common::setup();
    let graph = Value::array(vec![
        Value::Float(f64::NAN),
        Value::Float(f64::INFINITY),
        Value::Float(f64::NEG_INFINITY),
        Value::Float(1.0 / 3.0),
    ]);
    let loaded = roundtrip(&graph)?;
    assert!(structural_equal(&loaded, &graph, false, false)?);
    Ok(())
}

#[test]
fn none_root_roundtrips() -> Result<()> {
    common::setup();
    let loaded = roundtrip(&Value::None)?;
    assert!(loaded.is_none());
    Ok(())
}
