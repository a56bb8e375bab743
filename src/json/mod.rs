mod b64;
mod graph;
mod reader;
mod writer;

pub use graph::{JsonGraph, JsonNode};
pub use reader::load_json;
pub use writer::{save_json, NodeIndexer};
