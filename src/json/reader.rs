use crate::error::GraphError;
use crate::json::b64;
use crate::json::graph::{JsonGraph, JsonNode};
use crate::reflect;
use crate::tensor::{DataType, Device, DeviceType, NDArray, NDArrayData, Shape};
use crate::trace;
use crate::value::{
    Value, ValueMap, ARRAY_TYPE_KEY, BOOL_TYPE_KEY, BYTES_TYPE_KEY, DATATYPE_TYPE_KEY,
    DEVICE_TYPE_KEY, FLOAT_TYPE_KEY, INT_TYPE_KEY, MAP_TYPE_KEY, NDARRAY_TYPE_KEY, SHAPE_TYPE_KEY,
    STR_TYPE_KEY,
};

fn attr<'a>(jnode: &'a JsonNode, key: &'static str, node: usize) -> Result<&'a str, GraphError> {
    jnode
        .attrs
        .get(key)
        .map(String::as_str)
        .ok_or(GraphError::MissingField { field: key, node })
}

fn bad_value(field: &str, value: &str, node: usize) -> GraphError {
    GraphError::BadFieldValue {
        field: field.to_string(),
        value: value.to_string(),
        node,
    }
}

fn parse_i64(text: &str, field: &str, node: usize) -> Result<i64, GraphError> {
    text.parse::<i64>().map_err(|_| bad_value(field, text, node))
}

fn parse_f64(text: &str, field: &str, node: usize) -> Result<f64, GraphError> {
    match text {
        "inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        "nan" => Ok(f64::NAN),
        _ => text.parse::<f64>().map_err(|_| bad_value(field, text, node)),
    }
}

fn parse_node_id(
    text: &str,
    field: &str,
    node: usize,
    n_nodes: usize,
) -> Result<Option<usize>, GraphError> {
    if text == "null" {
        return Ok(None);
    }
    let id = text
        .parse::<usize>()
        .map_err(|_| bad_value(field, text, node))?;
    if id >= n_nodes {
        return Err(bad_value(field, text, node));
    }
    Ok(Some(id))
}

/// Pass 2: materialize a shell for one node. Containers stay empty until the
/// fill pass; repr types come back fully populated.
fn create_init(
    node: usize,
    jnode: &JsonNode,
    tensors: &[NDArray],
) -> Result<Value, GraphError> {
    let repr = jnode.repr_bytes(node)?;
    match jnode.type_key.as_str() {
        "" | "None" => Ok(Value::None),
        BOOL_TYPE_KEY => {
            let v = parse_i64(attr(jnode, "v_int64", node)?, "v_int64", node)?;
            Ok(Value::Bool(v != 0))
        }
        INT_TYPE_KEY => {
            let v = parse_i64(attr(jnode, "v_int64", node)?, "v_int64", node)?;
            Ok(Value::Int(v))
        }
        FLOAT_TYPE_KEY => {
            let v = parse_f64(attr(jnode, "v_float64", node)?, "v_float64", node)?;
            Ok(Value::Float(v))
        }
        DATATYPE_TYPE_KEY => {
            let text = attr(jnode, "v_type", node)?;
            let dtype: DataType = text.parse().map_err(|_| bad_value("v_type", text, node))?;
            Ok(Value::DataType(dtype))
        }
        DEVICE_TYPE_KEY => {
            let type_text = attr(jnode, "v_device_type", node)?;
            let type_code = parse_i64(type_text, "v_device_type", node)?;
            let device_type = DeviceType::from_i32(type_code as i32)
                .map_err(|_| bad_value("v_device_type", type_text, node))?;
            let id_text = attr(jnode, "v_device_id", node)?;
            let device_id = parse_i64(id_text, "v_device_id", node)? as i32;
            Ok(Value::Device(Device::new(device_type, device_id)))
        }
        STR_TYPE_KEY => {
            let bytes = repr.unwrap_or_default();
            let text = String::from_utf8(bytes).map_err(|err| GraphError::ReprDecode {
                node,
                reason: err.to_string(),
            })?;
            Ok(Value::Str(text))
        }
        BYTES_TYPE_KEY => Ok(Value::Bytes(repr.unwrap_or_default())),
        SHAPE_TYPE_KEY => {
            let text = attr(jnode, "v_shape", node)?;
            let mut dims = Vec::new();
            if !text.is_empty() {
                for part in text.split(',') {
                    dims.push(
                        part.parse::<i64>()
                            .map_err(|_| bad_value("v_shape", text, node))?,
                    );
                }
            }
            Ok(Value::Shape(Shape::new(dims)))
        }
        NDARRAY_TYPE_KEY => {
            let text = attr(jnode, "v_ndarray", node)?;
            let index = text
                .parse::<usize>()
                .map_err(|_| bad_value("v_ndarray", text, node))?;
            let tensor = tensors
                .get(index)
                .ok_or_else(|| bad_value("v_ndarray", text, node))?;
            Ok(Value::NDArray(tensor.clone()))
        }
        ARRAY_TYPE_KEY => Ok(Value::array(Vec::new())),
        MAP_TYPE_KEY => Ok(Value::map(ValueMap::new())),
        type_key => {
            let info = reflect::info(type_key).ok_or_else(|| GraphError::UnknownTypeKey {
                type_key: type_key.to_string(),
                node,
            })?;
            (info.create_init)(&info, repr).map_err(|err| GraphError::ReprDecode {
                node,
                reason: err.to_string(),
            })
        }
    }
}

/// Pass 3: record id dependencies of reference-typed fields so construction
/// order respects them.
fn find_field_deps(
    node: usize,
    value: &Value,
    jnode: &mut JsonNode,
    n_nodes: usize,
) -> Result<(), GraphError> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => return Ok(()),
    };
    // repr leaves and containers contribute no field edges
    if jnode.has_repr() {
        return Ok(());
    }
    let info = match reflect::info(obj.type_key()) {
        Some(info) => info,
        None => return Ok(()),
    };
    if info.has_repr_leaf(obj) {
        return Ok(());
    }
    for field in &info.fields {
        if !field.static_tag.is_reference() {
            continue;
        }
        let text = attr(jnode, field.name, node)?;
        if let Some(id) = parse_node_id(text, field.name, node, n_nodes)? {
            jnode.fields.push(id);
        }
    }
    Ok(())
}

/// Pass 4: fill one shell from its record. Children are complete by the time
/// this runs, courtesy of the topological order.
fn fill_node(
    nodes: &[Value],
    node: usize,
    jnode: &JsonNode,
) -> Result<(), GraphError> {
    match &nodes[node] {
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            for &id in &jnode.data {
                items.push(nodes[id].clone());
            }
        }
        Value::Map(entries) => {
            let mut entries = entries.borrow_mut();
            if !jnode.keys.is_empty() {
                if jnode.keys.len() != jnode.data.len() {
                    return Err(GraphError::MalformedInput {
                        reason: format!("node {} keys/data length mismatch", node),
                    });
                }
                for (key, &id) in jnode.keys.iter().zip(jnode.data.iter()) {
                    entries.insert(Value::str(key.clone()), nodes[id].clone());
                }
            } else {
                if jnode.data.len() % 2 != 0 {
                    return Err(GraphError::MalformedInput {
                        reason: format!("node {} interleaved map data has odd length", node),
                    });
                }
                for pair in jnode.data.chunks(2) {
                    entries.insert(nodes[pair[0]].clone(), nodes[pair[1]].clone());
                }
            }
        }
        Value::Object(obj) => {
            if jnode.has_repr() {
                return Ok(());
            }
            let info = match reflect::info(obj.type_key()) {
                Some(info) => info,
                None => return Ok(()),
            };
            if info.has_repr_leaf(obj) {
                return Ok(());
            }
            for (index, field) in info.fields.iter().enumerate() {
                let text = attr(jnode, field.name, node)?;
                let value = match field.static_tag {
                    reflect::StaticTag::Bool => {
                        if text == "null" {
                            Value::None
                        } else {
                            Value::Bool(parse_i64(text, field.name, node)? != 0)
                        }
                    }
                    reflect::StaticTag::Int => {
                        if text == "null" {
                            Value::None
                        } else {
                            Value::Int(parse_i64(text, field.name, node)?)
                        }
                    }
                    reflect::StaticTag::Float => {
                        if text == "null" {
                            Value::None
                        } else {
                            Value::Float(parse_f64(text, field.name, node)?)
                        }
                    }
                    reflect::StaticTag::DataType => {
                        let dtype: DataType =
                            text.parse().map_err(|_| bad_value(field.name, text, node))?;
                        Value::DataType(dtype)
                    }
                    reflect::StaticTag::ObjectRef | reflect::StaticTag::AnyValue => {
                        match parse_node_id(text, field.name, node, nodes.len())? {
                            Some(id) => nodes[id].clone(),
                            None => Value::None,
                        }
                    }
                };
                (info.setter)(obj, index, value);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Reconstruct a value graph from JSON text.
pub fn load_json(text: &str) -> Result<Value, GraphError> {
    let mut graph: JsonGraph =
        serde_json::from_str(text).map_err(|err| GraphError::MalformedInput {
            reason: err.to_string(),
        })?;
    let n_nodes = graph.nodes.len();
    if graph.root >= n_nodes {
        return Err(GraphError::MalformedInput {
            reason: format!("root id {} out of range ({} nodes)", graph.root, n_nodes),
        });
    }
    for (i, jnode) in graph.nodes.iter().enumerate() {
        if let Some(&id) = jnode.data.iter().find(|&&id| id >= n_nodes) {
            return Err(GraphError::MalformedInput {
                reason: format!("data id {} out of range at node {}", id, i),
            });
        }
    }

    let mut tensors = Vec::with_capacity(graph.b64ndarrays.len());
    for blob in &graph.b64ndarrays {
        let bytes = b64::decode(blob).map_err(|err| GraphError::MalformedInput {
            reason: format!("b64ndarrays: {}", err),
        })?;
        let tensor = NDArrayData::decode_blob(&bytes).map_err(|err| GraphError::MalformedInput {
            reason: format!("b64ndarrays: {}", err),
        })?;
        tensors.push(tensor);
    }

    // Pass 1 happened in serde_json; pass 2: shells.
    let mut nodes = Vec::with_capacity(n_nodes);
    for (i, jnode) in graph.nodes.iter().enumerate() {
        nodes.push(create_init(i, jnode, &tensors)?);
    }
    // Pass 3: field dependencies.
    for i in 0..n_nodes {
        let (value, jnode) = (&nodes[i], &mut graph.nodes[i]);
        find_field_deps(i, value, jnode, n_nodes)?;
    }
    // Pass 4: topological fill.
    let topo_order = graph.topo_sort()?;
    for &i in &topo_order {
        fill_node(&nodes, i, &graph.nodes[i])?;
    }
    trace!(
        "load_json: {} nodes, {} tensors, root {}",
        n_nodes,
        tensors.len(),
        graph.root
    );
    Ok(nodes[graph.root].clone())
}
