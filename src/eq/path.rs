use crate::value::{Value, ValueKey};

/// One traversal step from a value toward a mismatching position.
#[derive(Debug, Clone)]
pub enum AccessStep {
    ObjectField(&'static str),
    ArrayIndex(usize),
    ArrayIndexMissing(usize),
    MapKey(Value),
    MapKeyMissing(Value),
}

impl PartialEq for AccessStep {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AccessStep::ObjectField(a), AccessStep::ObjectField(b)) => a == b,
            (AccessStep::ArrayIndex(a), AccessStep::ArrayIndex(b)) => a == b,
            (AccessStep::ArrayIndexMissing(a), AccessStep::ArrayIndexMissing(b)) => a == b,
            (AccessStep::MapKey(a), AccessStep::MapKey(b)) => {
                ValueKey(a.clone()) == ValueKey(b.clone())
            }
            (AccessStep::MapKeyMissing(a), AccessStep::MapKeyMissing(b)) => {
                ValueKey(a.clone()) == ValueKey(b.clone())
            }
            _ => false,
        }
    }
}

fn fmt_key(key: &Value, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match key {
        Value::Str(text) => write!(f, "{:?}", text),
        Value::Int(v) => write!(f, "{}", v),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Float(v) => write!(f, "{}", v),
        other => write!(f, "<{}>", other.type_key()),
    }
}

impl std::fmt::Display for AccessStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessStep::ObjectField(name) => write!(f, ".{}", name),
            AccessStep::ArrayIndex(index) => write!(f, "[{}]", index),
            AccessStep::ArrayIndexMissing(index) => write!(f, "[{}]<missing>", index),
            AccessStep::MapKey(key) => {
                write!(f, "[")?;
                fmt_key(key, f)?;
                write!(f, "]")
            }
            AccessStep::MapKeyMissing(key) => {
                write!(f, "[")?;
                fmt_key(key, f)?;
                write!(f, "]<missing>")
            }
        }
    }
}

/// Ordered steps from a root to the first diverging position.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPath(pub Vec<AccessStep>);

impl AccessPath {
    pub fn steps(&self) -> &[AccessStep] {
        &self.0
    }
}

impl std::fmt::Display for AccessPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "root")?;
        for step in &self.0 {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}
