use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::json::b64;

/// One serialized node. `attrs` is ordered so output is deterministic.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct JsonNode {
    #[serde(default)]
    pub type_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repr_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repr_b64: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<usize>,
    // Field member dependency edges. Computed during load, never serialized.
    #[serde(skip)]
    pub fields: Vec<usize>,
}

impl JsonNode {
    /// Decode the node's repr payload, if any. `repr_str` and `repr_b64` are
    /// mutually exclusive.
    pub fn repr_bytes(&self, node: usize) -> Result<Option<Vec<u8>>, GraphError> {
        match (&self.repr_str, &self.repr_b64) {
            (Some(_), Some(_)) => Err(GraphError::MalformedInput {
                reason: format!("node {} carries both repr_str and repr_b64", node),
            }),
            (Some(text), None) => Ok(Some(text.clone().into_bytes())),
            (None, Some(encoded)) => b64::decode(encoded).map(Some).map_err(|err| {
                GraphError::ReprDecode {
                    node,
                    reason: err.to_string(),
                }
            }),
            (None, None) => Ok(None),
        }
    }

    pub fn has_repr(&self) -> bool {
        self.repr_str.is_some() || self.repr_b64.is_some()
    }
}

/// Top-level wire layout.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JsonGraph {
    pub root: usize,
    pub nodes: Vec<JsonNode>,
    #[serde(default)]
    pub b64ndarrays: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl JsonGraph {
    /// Reverse topological order over `data` and `fields` edges (Kahn's
    /// algorithm). Ready nodes are seeded and drained in ascending id order,
    /// so the result is deterministic. Container edges and field edges feed
    /// the same in-degree table.
    pub fn topo_sort(&self) -> Result<Vec<usize>, GraphError> {
        let n_nodes = self.nodes.len();
        let mut in_degree = vec![0usize; n_nodes];
        for jnode in &self.nodes {
            for &id in jnode.data.iter().chain(jnode.fields.iter()) {
                in_degree[id] += 1;
            }
        }
        let mut topo_order: Vec<usize> = (0..n_nodes).filter(|&i| in_degree[i] == 0).collect();
        let mut head = 0;
        while head < topo_order.len() {
            let jnode = &self.nodes[topo_order[head]];
            head += 1;
            for &id in jnode.data.iter().chain(jnode.fields.iter()) {
                in_degree[id] -= 1;
                if in_degree[id] == 0 {
                    topo_order.push(id);
                }
            }
        }
        if topo_order.len() != n_nodes {
            return Err(GraphError::Cycle);
        }
        topo_order.reverse();
        Ok(topo_order)
    }
}
