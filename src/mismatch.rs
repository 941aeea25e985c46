//! Builds the structured report for a call that matched no signature.
//!
//! The def set is narrowed one argument position at a time: a def stays
//! viable while its expected param at the position names the actual type
//! (or `any`). The position where the set empties, or the arity of the
//! survivors, decides the error category.

use crate::compiler::Def;
use crate::error::DispatchError;
use crate::signature::Param;
use crate::types::{TypeTable, ANY};
use crate::value::Value;

pub(crate) fn describe_mismatch(
    name: &str,
    args: &[Value],
    defs: &[Def],
    types: &TypeTable,
) -> DispatchError {
    let actual: Vec<String> =
        args.iter().map(|arg| types.type_name_or_unknown(arg)).collect();

    let mut candidates: Vec<&Def> = defs.iter().collect();
    for (index, actual_type) in actual.iter().enumerate() {
        let surviving: Vec<&Def> = candidates
            .iter()
            .copied()
            .filter(|def| match def.signature.param_at(index) {
                Some(param) => param.has(actual_type) || param.has(ANY),
                None => false,
            })
            .collect();

        if surviving.is_empty() {
            let expected = expected_union(&candidates, index);
            if expected.is_empty() {
                // Every still-viable def ran out of params: the call is
                // simply too long.
                let expected_len = candidates
                    .iter()
                    .map(|def| def.signature.params.len())
                    .max()
                    .unwrap_or(0);
                return DispatchError::TooManyArgs {
                    fn_name: name.to_string(),
                    actual: args.len(),
                    expected_len,
                };
            }
            return DispatchError::WrongType {
                fn_name: name.to_string(),
                index,
                actual: actual_type.clone(),
                expected,
            };
        }
        candidates = surviving;
    }

    let min_arity = candidates
        .iter()
        .map(|def| {
            if def.signature.rest_param {
                usize::MAX
            } else {
                def.signature.params.len()
            }
        })
        .min()
        .unwrap_or(0);
    if args.len() < min_arity {
        return DispatchError::TooFewArgs {
            fn_name: name.to_string(),
            index: args.len(),
            expected: expected_union(&candidates, args.len()),
        };
    }

    DispatchError::Mismatch { fn_name: name.to_string(), actual }
}

/// Union of the type names the given defs expect at one argument position,
/// deduplicated in first-seen order.
fn expected_union(defs: &[&Def], index: usize) -> Vec<String> {
    let mut expected: Vec<String> = Vec::new();
    for def in defs {
        let Some(Param { types }) = def.signature.param_at(index) else {
            continue;
        };
        for name in types {
            if !expected.iter().any(|n| n == name) {
                expected.push(name.clone());
            }
        }
    }
    expected
}
