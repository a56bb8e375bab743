use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context, Result};

use crate::error::GraphError;
use crate::json::b64;
use crate::json::graph::{JsonGraph, JsonNode};
use crate::reflect;
use crate::trace;
use crate::value::{Value, ValueKey};

/// Decimal text for a float field: 17 significant digits for finite values,
/// literal `inf` / `-inf` / `nan` otherwise.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:.16e}", value)
    }
}

/// Assigns dense ids to every value reachable from a root. Id 0 is reserved
/// for `None`; all other ids follow depth-first order with children assigned
/// before their parents, so the root always comes last.
pub struct NodeIndexer {
    node_index: HashMap<ValueKey, usize>,
    node_list: Vec<Value>,
    // in-progress values; a back-edge target gets its id once it finishes
    visiting: HashSet<ValueKey>,
}

impl NodeIndexer {
    pub fn new() -> Self {
        let mut node_index = HashMap::new();
        node_index.insert(ValueKey(Value::None), 0);
        Self {
            node_index,
            node_list: vec![Value::None],
            visiting: HashSet::new(),
        }
    }

    pub fn nodes(&self) -> &[Value] {
        &self.node_list
    }

    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.node_index.get(&ValueKey(value.clone())).copied()
    }

    fn assign(&mut self, value: &Value) {
        debug_assert_eq!(self.node_index.len(), self.node_list.len());
        self.node_index
            .insert(ValueKey(value.clone()), self.node_list.len());
        self.node_list.push(value.clone());
    }

    /// Index `value` and everything reachable from it.
    pub fn make_index(&mut self, value: &Value) -> Result<()> {
        let key = ValueKey(value.clone());
        if value.is_none() || self.node_index.contains_key(&key) || self.visiting.contains(&key) {
            return Ok(());
        }
        self.visiting.insert(key.clone());
        self.index_children(value)?;
        self.visiting.remove(&key);
        self.assign(value);
        Ok(())
    }

    fn index_children(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Array(items) => {
                let items = items.borrow().clone();
                for item in &items {
                    self.make_index(item)?;
                }
            }
            Value::Map(entries) => {
                let entries = entries.borrow().clone();
                if entries.is_str_keyed() {
                    for (_, v) in entries.iter() {
                        self.make_index(v)?;
                    }
                } else {
                    for (k, v) in entries.iter() {
                        self.make_index(k)?;
                        self.make_index(v)?;
                    }
                }
            }
            Value::Object(obj) => {
                let info = reflect::info(obj.type_key()).ok_or_else(|| {
                    GraphError::UnsupportedType {
                        type_key: obj.type_key().to_string(),
                        reason: "missing reflection registration",
                    }
                })?;
                // repr types are leaves, their fields never become nodes
                if !info.has_repr_leaf(obj) {
                    for (index, field) in info.fields.iter().enumerate() {
                        if field.static_tag.is_reference() {
                            let field_value = (info.getter)(obj, index);
                            self.make_index(&field_value)?;
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Default for NodeIndexer {
    fn default() -> Self {
        Self::new()
    }
}

fn id_of(indexer: &NodeIndexer, value: &Value) -> Result<usize> {
    indexer
        .index_of(value)
        .ok_or_else(|| anyhow!("value of type `{}` escaped indexing", value.type_key()))
}

fn set_repr(jnode: &mut JsonNode, repr: Vec<u8>) {
    if repr.is_empty() {
        return;
    }
    if b64::is_printable(&repr) {
        jnode.repr_str = Some(String::from_utf8(repr).expect("printable ascii is utf-8"));
    } else {
        jnode.repr_b64 = Some(b64::encode(&repr));
    }
}

/// Emit one node record. NDArray payloads append to `b64ndarrays` and are
/// referenced by position.
fn emit_node(
    value: &Value,
    indexer: &NodeIndexer,
    b64ndarrays: &mut Vec<String>,
) -> Result<JsonNode> {
    let mut jnode = JsonNode {
        type_key: value.type_key().to_string(),
        ..JsonNode::default()
    };
    match value {
        Value::None => {}
        Value::Bool(b) => {
            jnode.attrs.insert("v_int64".into(), (*b as i64).to_string());
        }
        Value::Int(v) => {
            jnode.attrs.insert("v_int64".into(), v.to_string());
        }
        Value::Float(v) => {
            jnode.attrs.insert("v_float64".into(), format_float(*v));
        }
        Value::DataType(dtype) => {
            jnode.attrs.insert("v_type".into(), dtype.to_string());
        }
        Value::Device(device) => {
            jnode
                .attrs
                .insert("v_device_type".into(), device.device_type.as_i32().to_string());
            jnode
                .attrs
                .insert("v_device_id".into(), device.device_id.to_string());
        }
        Value::Str(text) => set_repr(&mut jnode, text.clone().into_bytes()),
        Value::Bytes(bytes) => set_repr(&mut jnode, bytes.clone()),
        Value::Shape(shape) => {
            let dims = shape
                .dims()
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(",");
            jnode.attrs.insert("v_shape".into(), dims);
        }
        Value::NDArray(tensor) => {
            jnode
                .attrs
                .insert("v_ndarray".into(), b64ndarrays.len().to_string());
            b64ndarrays.push(b64::encode(&tensor.encode_blob()));
        }
        Value::Array(items) => {
            for item in items.borrow().iter() {
                jnode.data.push(id_of(indexer, item)?);
            }
        }
        Value::Map(entries) => {
            let entries = entries.borrow();
            if entries.is_str_keyed() {
                for (k, v) in entries.iter() {
                    let key = k.as_str().expect("str-keyed map");
                    jnode.keys.push(key.to_string());
                    jnode.data.push(id_of(indexer, v)?);
                }
            } else {
                for (k, v) in entries.iter() {
                    jnode.data.push(id_of(indexer, k)?);
                    jnode.data.push(id_of(indexer, v)?);
                }
            }
        }
        Value::Object(obj) => {
            let info = reflect::info(obj.type_key()).ok_or_else(|| GraphError::UnsupportedType {
                type_key: obj.type_key().to_string(),
                reason: "missing reflection registration",
            })?;
            if info.has_repr_leaf(obj) {
                set_repr(&mut jnode, info.get_repr_bytes(obj).unwrap_or_default());
            } else {
                for (index, field) in info.fields.iter().enumerate() {
                    let field_value = (info.getter)(obj, index);
                    // reference-declared fields always encode as node ids so
                    // the loader's declared-type dispatch reads them back
                    let text = if field.static_tag.is_reference() {
                        match &field_value {
                            Value::None => "null".to_string(),
                            value => id_of(indexer, value)?.to_string(),
                        }
                    } else {
                        match &field_value {
                            Value::None => "null".to_string(),
                            Value::Bool(b) => (*b as i64).to_string(),
                            Value::Int(v) => v.to_string(),
                            Value::Float(v) => format_float(*v),
                            Value::DataType(dtype) => dtype.to_string(),
                            _ => {
                                return Err(GraphError::UnsupportedType {
                                    type_key: obj.type_key().to_string(),
                                    reason: "field declared inline holds a reference value",
                                }
                                .into())
                            }
                        }
                    };
                    jnode.attrs.insert(field.name.to_string(), text);
                }
            }
        }
    }
    Ok(jnode)
}

/// Serialize a value graph to its canonical JSON text.
pub fn save_json(value: &Value) -> Result<String> {
    let mut indexer = NodeIndexer::new();
    indexer.make_index(value)?;
    let mut b64ndarrays = Vec::new();
    let mut nodes = Vec::with_capacity(indexer.nodes().len());
    for node in indexer.nodes() {
        nodes.push(emit_node(node, &indexer, &mut b64ndarrays)?);
    }
    let root = indexer
        .index_of(value)
        .expect("root was indexed by make_index");
    trace!(
        "save_json: {} nodes, {} tensors, root {}",
        nodes.len(),
        b64ndarrays.len(),
        root
    );
    let mut graph = JsonGraph {
        root,
        nodes,
        b64ndarrays,
        ..JsonGraph::default()
    };
    graph
        .attrs
        .insert("tvm_version".into(), env!("CARGO_PKG_VERSION").to_string());
    serde_json::to_string(&graph).context("encode graph json")
}
