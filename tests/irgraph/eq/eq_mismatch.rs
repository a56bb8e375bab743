use anyhow::Result;
use irgraph::{first_structural_mismatch, AccessStep, Value};

use crate::common;

#[test]
fn first_diverging_leaf_is_reported_on_both_sides() -> Result<()> {
    common::setup();
    let a = common::wrap(common::int_array(&[1, 2, 3]));
    let b = common::wrap(common::int_array(&[1, 9, 3]));
    let (lhs, rhs) = first_structural_mismatch(&a, &b, false, false)?.unwrap();
    let expect = vec![AccessStep::ObjectField("field1"), AccessStep::ArrayIndex(1)];
    assert_eq!(lhs.steps(), expect.as_slice());
    assert_eq!(rhs.steps(), expect.as_slice());
    Ok(())
}

#[test]
fn longer_array_reports_missing_tail() -> Result<()> {
    common::setup();
    let a = common::int_array(&[1, 2]);
    let b = common::int_array(&[1, 2, 3]);
    let (lhs, rhs) = first_structural_mismatch(&a, &b, false, false)?.unwrap();
    assert_eq!(lhs.steps(), &[AccessStep::ArrayIndexMissing(2)]);
    assert_eq!(rhs.steps(), &[AccessStep::ArrayIndex(2)]);

    let (lhs, rhs) = first_structural_mismatch(&b, &a, false, false)?.unwrap();
    assert_eq!(lhs.steps(), &[AccessStep::ArrayIndex(2)]);
    assert_eq!(rhs.steps(), &[AccessStep::ArrayIndexMissing(2)]);
    Ok(())
}

#[test]
fn map_value_mismatch_names_the_key() -> Result<()> {
    common::setup();
    let a = common::str_map(&[("lr", 1), ("steps", 2)]);
    let b = common::str_map(&[("lr", 1), ("steps", 9)]);
    let (lhs, rhs) = first_structural_mismatch(&a, &b, false, false)?.unwrap();
    let expect = vec![AccessStep::MapKey(Value::str("steps"))];
    assert_eq!(lhs.steps(), expect.as_slice());
    assert_eq!(rhs.steps(), expect.as_slice());
    Ok(())
}

#[test]
fn missing_map_key_is_reported_from_lhs_order() -> Result<()> {
    common::setup();
    let a = common::str_map(&[("a", 1)]);
    let b = common::str_map(&[("b", 1)]);
    let (lhs, rhs) = first_structural_mismatch(&a, &b, false, false)?.unwrap();
    assert_eq!(lhs.steps(), &[AccessStep::MapKey(Value::str("a"))]);
    assert_eq!(rhs.steps(), &[AccessStep::MapKeyMissing(Value::str("a"))]);
    Ok(())
}

#[test]
fn extra_rhs_key_is_found_by_cross_scan() -> Result<()> {
    common::setup();
    let a = common::str_map(&[("a", 1)]);
    let b = common::str_map(&[("a", 1), ("b", 2)]);
    let (lhs, rhs) = first_structural_mismatch(&a, &b, false, false)?.unwrap();
    assert_eq!(lhs.steps(), &[AccessStep::MapKeyMissing(Value::str("b"))]);
    assert_eq!(rhs.steps(), &[AccessStep::MapKey(Value::str("b"))]);
    Ok(())
}

#[test]
fn deep_paths_accumulate_outside_in() -> Result<()> {
    common::setup();
    let a = common::wrap(Value::array(vec![common::str_map(&[("k", 1)])]));
    let b = common::wrap(Value::array(vec![common::str_map(&[("k", 2)])]));
    let (lhs, _) = first_structural_mismatch(&a, &b, false, false)?.unwrap();
    assert_eq!(
        lhs.steps(),
        &[
            AccessStep::ObjectField("field1"),
            AccessStep::ArrayIndex(0),
            AccessStep::MapKey(Value::str("k")),
        ]
    );
    assert_eq!(lhs.to_string(), "root.field1[0][\"k\"]");
    Ok(())
}

#[test]
fn equal_graphs_have_no_mismatch() -> Result<()> {
    common::setup();
    let a = common::wrap(common::int_array(&[1, 2, 3]));
    let b = common::wrap(common::int_array(&[1, 2, 3]));
    assert!(first_structural_mismatch(&a, &b, false, false)?.is_none());
    Ok(())
}
