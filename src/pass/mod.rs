mod config;

use std::collections::BTreeMap;
use std::mem;

use anyhow::{anyhow, Result};
use indexmap::IndexMap;

use crate::trace;
use crate::value::{ObjectRef, Value};

pub use config::{lookup_option, ConfigOption, ConfigTag, PASS_CONFIG_OPTIONS};

/// Pass metadata.
#[derive(Debug, Clone)]
pub struct PassInfo {
    pub opt_level: i32,
    pub name: String,
    pub required: Vec<String>,
    pub traceable: bool,
}

/// Execution context shared by every pass in a pipeline.
#[derive(Debug, Default, Clone)]
pub struct PassContext {
    pub opt_level: i32,
    config: BTreeMap<String, Value>,
}

impl PassContext {
    pub fn new() -> Self {
        Self {
            opt_level: 2,
            config: BTreeMap::new(),
        }
    }

    pub fn with_opt_level(mut self, opt_level: i32) -> Self {
        self.opt_level = opt_level;
        self
    }

    /// Set a configuration entry. Recognized keys are checked against their
    /// expected shape; unrecognized keys pass through unchanged.
    pub fn set_config(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if let Some(option) = lookup_option(&key) {
            if !config::matches_tag(&value, option.tag) {
                return Err(anyhow!(
                    "config `{}` expects {:?}, got {}",
                    key,
                    option.tag,
                    value.type_key()
                ));
            }
        }
        self.config.insert(key, value);
        Ok(())
    }

    pub fn config(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}

/// A module: compilation units keyed by symbol name, plus the global-symbol
/// table. `remove` erases from both so they never drift apart.
#[derive(Debug, Default, Clone)]
pub struct Module {
    functions: IndexMap<String, Value>,
    globals: BTreeMap<String, ObjectRef>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a unit under `name` with its global-symbol object.
    pub fn add(&mut self, name: impl Into<String>, global: ObjectRef, unit: Value) {
        let name = name.into();
        self.globals.insert(name.clone(), global);
        self.functions.insert(name, unit);
    }

    /// Remove a unit and its global symbol together.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.globals.remove(name);
        self.functions.shift_remove(name)
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.functions.get(name)
    }

    pub fn global(&self, name: &str) -> Option<&ObjectRef> {
        self.globals.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn unit_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    fn take_unit(&mut self, name: &str) -> Option<Value> {
        self.functions.get_mut(name).map(mem::take)
    }

    fn put_unit(&mut self, name: &str, unit: Value) {
        if let Some(slot) = self.functions.get_mut(name) {
            *slot = unit;
        }
    }
}

/// Transform applied to one unit. `Ok(None)` means "delete this unit".
pub type UnitTransform = Box<dyn Fn(Value, &Module, &PassContext) -> Result<Option<Value>>>;

/// A pass over every reflected unit of a module.
pub struct UnitPass {
    info: PassInfo,
    transform: UnitTransform,
}

impl UnitPass {
    pub fn info(&self) -> &PassInfo {
        &self.info
    }

    /// Sweep the function table: move each unit out, transform, reinstall.
    /// Deletions are applied after the sweep through [`Module::remove`] so
    /// the global-symbol table stays in sync. A transform error aborts the
    /// sweep; entries already rewritten keep their new value.
    pub fn run(&self, module: &mut Module, ctx: &PassContext) -> Result<()> {
        trace!(
            "pass {} (opt_level={}) over {} units",
            self.info.name,
            self.info.opt_level,
            module.len()
        );
        let mut deleted = Vec::new();
        for name in module.unit_names() {
            if !matches!(module.lookup(&name), Some(Value::Object(_))) {
                continue;
            }
            let unit = module.take_unit(&name).expect("unit listed by name");
            match (self.transform)(unit, module, ctx)? {
                Some(rewritten) => module.put_unit(&name, rewritten),
                None => deleted.push(name),
            }
        }
        for name in &deleted {
            module.remove(name);
        }
        if !deleted.is_empty() {
            trace!("pass {} deleted {} units", self.info.name, deleted.len());
        }
        Ok(())
    }
}

impl std::fmt::Debug for UnitPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "UnitPass({}, opt_level={})",
            self.info.name, self.info.opt_level
        )
    }
}

/// Build a unit-level pass from a transform and its metadata.
pub fn create_unit_pass(
    transform: impl Fn(Value, &Module, &PassContext) -> Result<Option<Value>> + 'static,
    opt_level: i32,
    name: impl Into<String>,
    required: Vec<String>,
    traceable: bool,
) -> UnitPass {
    UnitPass {
        info: PassInfo {
            opt_level,
            name: name.into(),
            required,
            traceable,
        },
        transform: Box::new(transform),
    }
}
