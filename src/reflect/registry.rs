use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;

use super::TypeInfo;
use crate::value::Value;

// Populated by type registrations during startup, read-only afterwards.
static REGISTRY: Lazy<RwLock<HashMap<&'static str, Arc<TypeInfo>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a reflected type. Fails if the key is already taken.
pub fn register(info: TypeInfo) -> Result<()> {
    let mut table = REGISTRY.write().expect("type registry poisoned");
    if table.contains_key(info.type_key) {
        return Err(anyhow!("type key `{}` already registered", info.type_key));
    }
    table.insert(info.type_key, Arc::new(info));
    Ok(())
}

/// Look up a type by key.
pub fn info(type_key: &str) -> Option<Arc<TypeInfo>> {
    let table = REGISTRY.read().expect("type registry poisoned");
    table.get(type_key).cloned()
}

/// Look up the type of a reflected object value. Non-object values have no
/// registry entry.
pub fn info_for(value: &Value) -> Option<Arc<TypeInfo>> {
    info(value.as_object()?.type_key())
}
