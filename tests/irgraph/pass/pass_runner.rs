use anyhow::{anyhow, Result};
use irgraph::{create_unit_pass, Module, PassContext, Value};

use crate::common;

fn module_with_units(names: &[&str]) -> Module {
    let mut module = Module::new();
    for name in names {
        module.add(
            *name,
            common::var(name),
            common::function(Value::str(format!("{}_body", name))),
        );
    }
    module
}

#[test]
fn deleted_units_leave_both_tables() -> Result<()> {
    common::setup();
    let mut module = module_with_units(&["u1", "u2", "u3"]);
    let pass = create_unit_pass(
        |unit, _module, _ctx| {
            let name = unit.as_object().unwrap().field(0);
            if name.as_str() == Some("u2_body") {
                Ok(None)
            } else {
                Ok(Some(unit))
            }
        },
        0,
        "prune_u2",
        vec![],
        false,
    );
    pass.run(&mut module, &PassContext::new())?;

    assert_eq!(module.len(), 2);
    assert!(module.contains("u1"));
    assert!(!module.contains("u2"));
    assert!(module.contains("u3"));
    // the global-symbol table tracks the function table
    assert!(module.global("u1").is_some());
    assert!(module.global("u2").is_none());
    assert!(module.global("u3").is_some());
    Ok(())
}

#[test]
fn rewritten_units_are_reinstalled() -> Result<()> {
    common::setup();
    let mut module = module_with_units(&["main"]);
    let pass = create_unit_pass(
        |_unit, _module, _ctx| Ok(Some(common::function(Value::str("rewritten")))),
        2,
        "rewrite_body",
        vec![],
        true,
    );
    pass.run(&mut module, &PassContext::new())?;
    let body = module.lookup("main").unwrap().as_object().unwrap().field(0);
    assert_eq!(body.as_str(), Some("rewritten"));
    Ok(())
}

#[test]
fn failing_transform_aborts_but_keeps_earlier_rewrites() -> Result<()> {
    common::setup();
    let mut module = module_with_units(&["u1", "u2", "u3"]);
    let pass = create_unit_pass(
        |unit, _module, _ctx| {
            let name = unit.as_object().unwrap().field(0);
            match name.as_str() {
                Some("u2_body") => Err(anyhow!("lowering failed")),
                _ => Ok(Some(common::function(Value::str("done")))),
            }
        },
        0,
        "partial",
        vec![],
        false,
    );
    assert!(pass.run(&mut module, &PassContext::new()).is_err());
    let u1_body = module.lookup("u1").unwrap().as_object().unwrap().field(0);
    assert_eq!(u1_body.as_str(), Some("done"));
    let u3_body = module.lookup("u3").unwrap().as_object().unwrap().field(0);
    assert_eq!(u3_body.as_str(), Some("u3_body"));
    Ok(())
}

#[test]
fn non_object_entries_are_skipped() -> Result<()> {
    common::setup();
    let mut module = Module::new();
    module.add("data", common::var("data"), Value::Int(42));
    let pass = create_unit_pass(
        |_unit, _module, _ctx| Err(anyhow!("should not run")),
        0,
        "noop",
        vec![],
        false,
    );
    pass.run(&mut module, &PassContext::new())?;
    assert_eq!(module.lookup("data").and_then(Value::as_int), Some(42));
    Ok(())
}

#[test]
fn pass_metadata_is_exposed() {
    common::setup();
    let pass = create_unit_pass(
        |unit, _module, _ctx| Ok(Some(unit)),
        3,
        "identity",
        vec!["prune_u2".to_string()],
        true,
    );
    assert_eq!(pass.info().opt_level, 3);
    assert_eq!(pass.info().name, "identity");
    assert_eq!(pass.info().required, vec!["prune_u2".to_string()]);
    assert!(pass.info().traceable);
}

#[test]
fn recognized_config_keys_are_type_checked() -> Result<()> {
    common::setup();
    let mut ctx = PassContext::new().with_opt_level(3);
    ctx.set_config("disable_vectorize", Value::Bool(true))?;
    ctx.set_config("vtcm_capacity", Value::Int(1 << 20))?;
    ctx.set_config("add_lower_pass", Value::array(vec![]))?;
    assert!(ctx.set_config("disable_vectorize", Value::Int(1)).is_err());
    assert!(ctx.set_config("vtcm_capacity", Value::Bool(true)).is_err());
    // unknown keys pass through untouched
    ctx.set_config("backend.custom_flag", Value::str("anything"))?;
    assert!(ctx.config("backend.custom_flag").is_some());
    assert_eq!(ctx.opt_level, 3);
    Ok(())
}

#[test]
fn transform_can_inspect_the_module() -> Result<()> {
    common::setup();
    let mut module = module_with_units(&["a", "b"]);
    let pass = create_unit_pass(
        |unit, module, _ctx| {
            // the module stays visible (with the unit under rewrite moved out)
            assert_eq!(module.len(), 2);
            Ok(Some(unit))
        },
        0,
        "inspect",
        vec![],
        false,
    );
    pass.run(&mut module, &PassContext::new())?;
    Ok(())
}
