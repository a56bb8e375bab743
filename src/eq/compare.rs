use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use anyhow::{anyhow, Result};

use super::path::AccessStep;
use crate::reflect::{self, StructuralKind};
use crate::tensor::NDArray;
use crate::value::{ArrayRef, MapRef, ObjectData, ObjectRef, Value};

// Mismatch paths are collected deepest-step-first and reversed by the caller.
struct PathPair {
    lhs: Vec<AccessStep>,
    rhs: Vec<AccessStep>,
}

/// Lock-step comparison state for one equality query.
pub(crate) struct StructEqualHandler {
    map_free_vars: bool,
    skip_ndarray_content: bool,
    // correspondence tables keyed by object identity
    equal_map_lhs: HashMap<*const ObjectData, ObjectRef>,
    equal_map_rhs: HashMap<*const ObjectData, ObjectRef>,
    paths: Option<PathPair>,
}

impl StructEqualHandler {
    pub(crate) fn new(map_free_vars: bool, skip_ndarray_content: bool, track_paths: bool) -> Self {
        Self {
            map_free_vars,
            skip_ndarray_content,
            equal_map_lhs: HashMap::new(),
            equal_map_rhs: HashMap::new(),
            paths: track_paths.then(|| PathPair {
                lhs: Vec::new(),
                rhs: Vec::new(),
            }),
        }
    }

    pub(crate) fn into_reverse_paths(self) -> Option<(Vec<AccessStep>, Vec<AccessStep>)> {
        self.paths.map(|pair| (pair.lhs, pair.rhs))
    }

    fn tracking(&self) -> bool {
        self.paths.is_some()
    }

    fn record(&mut self, lhs_step: AccessStep, rhs_step: AccessStep) {
        if let Some(pair) = &mut self.paths {
            pair.lhs.push(lhs_step);
            pair.rhs.push(rhs_step);
        }
    }

    pub(crate) fn compare_any(&mut self, lhs: &Value, rhs: &Value) -> Result<bool> {
        if mem::discriminant(lhs) != mem::discriminant(rhs) {
            return Ok(false);
        }
        match (lhs, rhs) {
            (Value::None, Value::None) => Ok(true),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            // raw 64-bit payload comparison, so nan == nan here
            (Value::Float(a), Value::Float(b)) => Ok(a.to_bits() == b.to_bits()),
            (Value::DataType(a), Value::DataType(b)) => Ok(a == b),
            (Value::Device(a), Value::Device(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a.as_bytes() == b.as_bytes()),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(a == b),
            (Value::Shape(a), Value::Shape(b)) => Ok(a.dims() == b.dims()),
            (Value::NDArray(a), Value::NDArray(b)) => self.compare_ndarray(a, b),
            (Value::Array(a), Value::Array(b)) => self.compare_array(a, b),
            (Value::Map(a), Value::Map(b)) => self.compare_map(a, b),
            (Value::Object(a), Value::Object(b)) => self.compare_object(a, b),
            _ => unreachable!("tag mismatch handled above"),
        }
    }

    fn compare_object(&mut self, lhs: &ObjectRef, rhs: &ObjectRef) -> Result<bool> {
        if lhs.type_key() != rhs.type_key() {
            return Ok(false);
        }
        let info = match reflect::info(lhs.type_key()) {
            Some(info) => info,
            None => return Ok(Rc::ptr_eq(lhs, rhs)),
        };
        let kind = info.structural_kind;
        if matches!(kind, StructuralKind::Unsupported | StructuralKind::UniqueInstance) {
            return Ok(Rc::ptr_eq(lhs, rhs));
        }
        if kind == StructuralKind::ConstTreeNode && Rc::ptr_eq(lhs, rhs) {
            return Ok(true);
        }
        if matches!(kind, StructuralKind::DAGNode | StructuralKind::FreeVar) {
            // a recorded pair must stay consistent in both directions
            if let Some(mapped) = self.equal_map_lhs.get(&Rc::as_ptr(lhs)) {
                return Ok(Rc::ptr_eq(mapped, rhs));
            }
            if self.equal_map_rhs.contains_key(&Rc::as_ptr(rhs)) {
                return Ok(false);
            }
        }

        let mut success = true;
        if kind == StructuralKind::FreeVar {
            // an unmapped free var only unifies when the current scope allows it
            if !Rc::ptr_eq(lhs, rhs) && !self.map_free_vars {
                success = false;
            }
        } else {
            for (index, field) in info.fields.iter().enumerate() {
                if field.ignored() {
                    continue;
                }
                let lhs_value = (info.getter)(lhs, index);
                let rhs_value = (info.getter)(rhs, index);
                let equal = if field.opens_def_region() {
                    let saved = mem::replace(&mut self.map_free_vars, true);
                    let result = self.compare_any(&lhs_value, &rhs_value);
                    self.map_free_vars = saved;
                    result?
                } else {
                    self.compare_any(&lhs_value, &rhs_value)?
                };
                if !equal {
                    self.record(
                        AccessStep::ObjectField(field.name),
                        AccessStep::ObjectField(field.name),
                    );
                    success = false;
                    break;
                }
            }
        }
        if success && matches!(kind, StructuralKind::DAGNode | StructuralKind::FreeVar) {
            self.equal_map_lhs.insert(Rc::as_ptr(lhs), rhs.clone());
            self.equal_map_rhs.insert(Rc::as_ptr(rhs), lhs.clone());
        }
        Ok(success)
    }

    fn compare_array(&mut self, lhs: &ArrayRef, rhs: &ArrayRef) -> Result<bool> {
        let lhs_items = lhs.borrow();
        let rhs_items = rhs.borrow();
        if lhs_items.len() != rhs_items.len() && !self.tracking() {
            return Ok(false);
        }
        for i in 0..lhs_items.len().min(rhs_items.len()) {
            if !self.compare_any(&lhs_items[i], &rhs_items[i])? {
                self.record(AccessStep::ArrayIndex(i), AccessStep::ArrayIndex(i));
                return Ok(false);
            }
        }
        if lhs_items.len() == rhs_items.len() {
            return Ok(true);
        }
        if lhs_items.len() > rhs_items.len() {
            self.record(
                AccessStep::ArrayIndex(rhs_items.len()),
                AccessStep::ArrayIndexMissing(rhs_items.len()),
            );
        } else {
            self.record(
                AccessStep::ArrayIndexMissing(lhs_items.len()),
                AccessStep::ArrayIndex(lhs_items.len()),
            );
        }
        Ok(false)
    }

    fn compare_map(&mut self, lhs: &MapRef, rhs: &MapRef) -> Result<bool> {
        let lhs_entries = lhs.borrow();
        let rhs_entries = rhs.borrow();
        if lhs_entries.len() != rhs_entries.len() && !self.tracking() {
            return Ok(false);
        }
        for (key, lhs_value) in lhs_entries.iter() {
            let rhs_key = self.map_lhs_to_rhs(key);
            match rhs_entries.get(&rhs_key) {
                None => {
                    self.record(
                        AccessStep::MapKey(key.clone()),
                        AccessStep::MapKeyMissing(rhs_key),
                    );
                    return Ok(false);
                }
                Some(rhs_value) => {
                    let rhs_value = rhs_value.clone();
                    if !self.compare_any(lhs_value, &rhs_value)? {
                        self.record(AccessStep::MapKey(key.clone()), AccessStep::MapKey(rhs_key));
                        return Ok(false);
                    }
                }
            }
        }
        if lhs_entries.len() == rhs_entries.len() {
            return Ok(true);
        }
        // cross check rhs keys to name the one lhs is missing
        for (key, _) in rhs_entries.iter() {
            let lhs_key = self.map_rhs_to_lhs(key);
            if lhs_entries.get(&lhs_key).is_none() {
                self.record(
                    AccessStep::MapKeyMissing(lhs_key),
                    AccessStep::MapKey(key.clone()),
                );
                return Ok(false);
            }
        }
        Ok(false)
    }

    fn compare_ndarray(&mut self, lhs: &NDArray, rhs: &NDArray) -> Result<bool> {
        if Rc::ptr_eq(lhs, rhs) {
            return Ok(true);
        }
        if lhs.ndim() != rhs.ndim() || lhs.shape() != rhs.shape() || lhs.dtype() != rhs.dtype() {
            return Ok(false);
        }
        if self.skip_ndarray_content {
            return Ok(true);
        }
        if !lhs.device().is_cpu() || !rhs.device().is_cpu() {
            return Err(anyhow!("can only compare cpu tensor contents"));
        }
        if !lhs.is_contiguous() || !rhs.is_contiguous() {
            return Err(anyhow!("can only compare contiguous tensor contents"));
        }
        Ok(lhs.data() == rhs.data())
    }

    fn map_lhs_to_rhs(&self, key: &Value) -> Value {
        if let Value::Object(obj) = key {
            if let Some(mapped) = self.equal_map_lhs.get(&Rc::as_ptr(obj)) {
                return Value::Object(mapped.clone());
            }
        }
        key.clone()
    }

    fn map_rhs_to_lhs(&self, key: &Value) -> Value {
        if let Value::Object(obj) = key {
            if let Some(mapped) = self.equal_map_rhs.get(&Rc::as_ptr(obj)) {
                return Value::Object(mapped.clone());
            }
        }
        key.clone()
    }
}
