mod compare;
mod path;

use anyhow::Result;

use crate::value::Value;
use compare::StructEqualHandler;

pub use path::{AccessPath, AccessStep};

/// Decide whether two graphs are structurally equivalent.
///
/// `map_free_vars` allows free variables first reached outside any binding
/// region to be renamed; `skip_ndarray_content` compares tensors by
/// shape/dtype only. Value-level differences return `Ok(false)`; only
/// prerequisite violations (non-CPU or non-contiguous tensors with content
/// comparison requested) are errors.
pub fn structural_equal(
    lhs: &Value,
    rhs: &Value,
    map_free_vars: bool,
    skip_ndarray_content: bool,
) -> Result<bool> {
    let mut handler = StructEqualHandler::new(map_free_vars, skip_ndarray_content, false);
    handler.compare_any(lhs, rhs)
}

/// Like [`structural_equal`], but on inequality returns the first diverging
/// position as a pair of access paths from each root.
pub fn first_structural_mismatch(
    lhs: &Value,
    rhs: &Value,
    map_free_vars: bool,
    skip_ndarray_content: bool,
) -> Result<Option<(AccessPath, AccessPath)>> {
    let mut handler = StructEqualHandler::new(map_free_vars, skip_ndarray_content, true);
    if handler.compare_any(lhs, rhs)? {
        return Ok(None);
    }
    let (mut lhs_steps, mut rhs_steps) = handler
        .into_reverse_paths()
        .expect("paths were requested");
    lhs_steps.reverse();
    rhs_steps.reverse();
    Ok(Some((AccessPath(lhs_steps), AccessPath(rhs_steps))))
}
