use anyhow::Result;
use irgraph::{first_structural_mismatch, structural_equal, Value};

use crate::common;

#[test]
fn bound_variables_rename_only_when_allowed() -> Result<()> {
    common::setup();
    let x = common::var("x");
    let y = common::var("y");
    let f1 = common::let_node(Value::Int(1), Value::Object(x.clone()), x);
    let f2 = common::let_node(Value::Int(1), Value::Object(y.clone()), y);
    assert!(structural_equal(&f1, &f2, true, false)?);
    assert!(!structural_equal(&f1, &f2, false, false)?);
    Ok(())
}

#[test]
fn identical_variables_need_no_mapping() -> Result<()> {
    common::setup();
    let x = common::var("x");
    let f1 = common::let_node(Value::Int(1), Value::Object(x.clone()), x.clone());
    let f2 = common::let_node(Value::Int(1), Value::Object(x.clone()), x);
    assert!(structural_equal(&f1, &f2, false, false)?);
    Ok(())
}

#[test]
fn free_variables_outside_any_definition() -> Result<()> {
    common::setup();
    let x = Value::Object(common::var("x"));
    let y = Value::Object(common::var("y"));
    // names are irrelevant once mapping is allowed
    assert!(structural_equal(&x, &y, true, false)?);
    assert!(!structural_equal(&x, &y, false, false)?);
    Ok(())
}

#[test]
fn one_variable_cannot_map_to_two() -> Result<()> {
    common::setup();
    let x = Value::Object(common::var("x"));
    let y = Value::Object(common::var("y"));
    let z = Value::Object(common::var("z"));
    let lhs = Value::array(vec![x.clone(), x]);
    assert!(!structural_equal(
        &lhs,
        &Value::array(vec![y.clone(), z]),
        true,
        false
    )?);
    assert!(structural_equal(
        &lhs,
        &Value::array(vec![y.clone(), y]),
        true,
        false
    )?);
    Ok(())
}

#[test]
fn definition_region_licenses_mapping_by_itself() -> Result<()> {
    common::setup();
    let x = common::var("x");
    let y = common::var("y");
    // bodies do not mention the variables, so the first encounter happens
    // inside the def-flagged field and maps regardless of the caller flag
    let f1 = common::let_node(Value::Int(1), Value::Int(2), x);
    let f2 = common::let_node(Value::Int(1), Value::Int(2), y);
    assert!(structural_equal(&f1, &f2, false, false)?);
    Ok(())
}

#[test]
fn renaming_coherence_with_mismatch_paths() -> Result<()> {
    common::setup();
    let x = common::var("x");
    let y = common::var("y");
    let f1 = common::let_node(Value::Int(1), Value::Object(x.clone()), x);
    let f2 = common::let_node(Value::Int(1), Value::Object(y.clone()), y);
    assert!(first_structural_mismatch(&f1, &f2, true, false)?.is_none());
    let (lhs_path, _) = first_structural_mismatch(&f1, &f2, false, false)?.unwrap();
    assert_eq!(lhs_path.to_string(), "root.body");
    Ok(())
}
