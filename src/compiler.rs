//! Turns a signatures map into the sorted, conversion-expanded def list a
//! typed function dispatches over.
//!
//! The pipeline: parse each signature, normalize (drop ignored types), sort
//! by type specificity, compile per-signature predicates, then append one
//! conversion-widened twin per original that has applicable conversions.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::convert::{ConversionTable, ConvertFn};
use crate::dispatcher::Handler;
use crate::error::Error;
use crate::signature::{Param, Signature};
use crate::types::{TypeTable, TypeTest};
use crate::value::Value;

/// Compiled predicate over a full argument list.
pub(crate) type ArgsTest = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Gathers trailing arguments of a rest signature into one list argument.
pub(crate) type Preprocess = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// One compiled overload. `handler` is the user implementation, wrapped by
/// the conversion compiler when `from_conversion` is set.
pub(crate) struct Def {
    pub signature: Signature,
    pub param_tests: Vec<TypeTest>,
    pub test: ArgsTest,
    pub handler: Handler,
    pub preprocess: Option<Preprocess>,
    pub from_conversion: bool,
}

//===----------------------------------------------------------------------===//
// Pipeline
//===----------------------------------------------------------------------===//

/// Compiles a signatures map into the def list plus the public metadata
/// pairs (canonical signature → original handler, in sorted def order).
pub(crate) fn compile(
    pairs: Vec<(String, Handler)>,
    types: &TypeTable,
    conversions: &ConversionTable,
) -> Result<(Vec<Def>, Vec<(String, Handler)>), Error> {
    let mut entries: Vec<(Signature, Handler)> = Vec::new();
    for (text, handler) in pairs {
        let signature = Signature::parse(&text)?;
        if let Some(signature) = normalize(signature, types) {
            entries.push((signature, handler));
        }
    }
    if entries.is_empty() {
        return Err(Error::NoSignatures);
    }

    // Type names are checked here, before any ordering result is exposed.
    for (signature, _) in &entries {
        for param in &signature.params {
            for name in &param.types {
                types.find_test(name)?;
            }
        }
    }

    let mut entries = reject_duplicates(entries)?;
    entries.sort_by(|a, b| cmp_signatures(&a.0, &b.0, types));

    let metadata: Vec<(String, Handler)> = entries
        .iter()
        .map(|(signature, handler)| (signature.to_string(), handler.clone()))
        .collect();

    let mut defs = Vec::with_capacity(entries.len() * 2);
    for (signature, handler) in &entries {
        defs.push(make_def(signature.clone(), handler.clone(), false, types)?);
    }
    // Conversion twins go after the whole original block, so exact matches
    // always win over converted ones.
    for (signature, handler) in &entries {
        if let Some(def) = expand_def(signature, handler, types, conversions)? {
            defs.push(def);
        }
    }

    Ok((defs, metadata))
}

/// Drops ignored type names from every param. A signature that loses a
/// whole param is discarded (`None`), as if it was never provided.
fn normalize(signature: Signature, types: &TypeTable) -> Option<Signature> {
    let rest_param = signature.rest_param;
    let mut params = Vec::with_capacity(signature.params.len());
    for param in signature.params {
        let kept: Vec<String> =
            param.types.into_iter().filter(|n| !types.is_ignored(n)).collect();
        if kept.is_empty() {
            return None;
        }
        params.push(Param::new(kept));
    }
    Some(Signature { params, rest_param })
}

/// A canonical signature may appear once. Re-binding it to the same handler
/// is collapsed; to a different handler it is an error.
fn reject_duplicates(
    entries: Vec<(Signature, Handler)>,
) -> Result<Vec<(Signature, Handler)>, Error> {
    let mut unique: Vec<(String, Signature, Handler)> = Vec::new();
    for (signature, handler) in entries {
        let key = signature.to_string();
        match unique.iter().find(|(k, _, _)| *k == key) {
            Some((_, _, existing)) => {
                if !existing.ptr_eq(&handler) {
                    return Err(Error::DuplicateSignature { signature: key });
                }
            }
            None => unique.push((key, signature, handler)),
        }
    }
    Ok(unique.into_iter().map(|(_, s, h)| (s, h)).collect())
}

//===----------------------------------------------------------------------===//
// Ordering
//===----------------------------------------------------------------------===//

fn lowest_index(param: &Param, types: &TypeTable) -> usize {
    param
        .types
        .iter()
        .map(|name| types.specificity_index(name))
        .min()
        .unwrap_or(usize::MAX)
}

/// Specificity order: non-rest before rest, then element-wise over the
/// common param prefix by the most specific type in each union, then fewer
/// params first. Total and deterministic for a fixed registry.
pub(crate) fn cmp_signatures(
    a: &Signature,
    b: &Signature,
    types: &TypeTable,
) -> Ordering {
    match (a.rest_param, b.rest_param) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        _ => {}
    }
    let common = a.params.len().min(b.params.len());
    for i in 0..common {
        let ia = lowest_index(&a.params[i], types);
        let ib = lowest_index(&b.params[i], types);
        if ia != ib {
            return ia.cmp(&ib);
        }
    }
    a.params.len().cmp(&b.params.len())
}

//===----------------------------------------------------------------------===//
// Predicate compilation
//===----------------------------------------------------------------------===//

fn compile_param_test(param: &Param, types: &TypeTable) -> Result<TypeTest, Error> {
    if param.has_any() {
        return Ok(Arc::new(|_: &Value| true));
    }
    let tests: Vec<TypeTest> = param
        .types
        .iter()
        .map(|name| types.find_test(name))
        .collect::<Result<_, _>>()?;
    Ok(Arc::new(move |value: &Value| tests.iter().any(|test| test(value))))
}

fn compile_args_test(signature: &Signature, param_tests: &[TypeTest]) -> ArgsTest {
    if signature.params.is_empty() {
        return Arc::new(|args: &[Value]| args.is_empty());
    }
    let tests = param_tests.to_vec();
    if signature.rest_param {
        let fixed = tests.len() - 1;
        Arc::new(move |args: &[Value]| {
            args.len() >= fixed
                && args[..fixed].iter().zip(&tests[..fixed]).all(|(a, t)| t(a))
                && args[fixed..].iter().all(|a| (tests[fixed])(a))
        })
    } else {
        let arity = tests.len();
        Arc::new(move |args: &[Value]| {
            args.len() == arity && args.iter().zip(&tests).all(|(a, t)| t(a))
        })
    }
}

fn make_preprocess(fixed: usize) -> Preprocess {
    Arc::new(move |args: &[Value]| {
        let mut out = args[..fixed].to_vec();
        out.push(Value::List(args[fixed..].to_vec()));
        out
    })
}

fn make_def(
    signature: Signature,
    handler: Handler,
    from_conversion: bool,
    types: &TypeTable,
) -> Result<Def, Error> {
    let param_tests: Vec<TypeTest> = signature
        .params
        .iter()
        .map(|param| compile_param_test(param, types))
        .collect::<Result<_, _>>()?;
    let test = compile_args_test(&signature, &param_tests);
    let preprocess = if signature.rest_param {
        Some(make_preprocess(signature.params.len() - 1))
    } else {
        None
    };
    Ok(Def { signature, param_tests, test, handler, preprocess, from_conversion })
}

//===----------------------------------------------------------------------===//
// Conversion expansion
//===----------------------------------------------------------------------===//

/// Derives the conversion-widened twin of a signature, if any registered
/// conversion applies. Candidate selection per param: the conversion's
/// target is in the union, its source is not, and no earlier conversion
/// already claimed that source (first-win per source).
fn expand_def(
    signature: &Signature,
    handler: &Handler,
    types: &TypeTable,
    conversions: &ConversionTable,
) -> Result<Option<Def>, Error> {
    let mut widened_params = Vec::with_capacity(signature.params.len());
    let mut per_param: Vec<Vec<(TypeTest, ConvertFn)>> =
        Vec::with_capacity(signature.params.len());
    let mut any_candidates = false;

    for param in &signature.params {
        let mut names = param.types.clone();
        let mut candidates: Vec<(TypeTest, ConvertFn)> = Vec::new();
        for conv in conversions.all() {
            if param.has(&conv.to)
                && !param.has(&conv.from)
                && !names[param.types.len()..].iter().any(|n| *n == conv.from)
            {
                candidates.push((types.find_test(&conv.from)?, conv.convert.clone()));
                names.push(conv.from.clone());
            }
        }
        if !candidates.is_empty() {
            any_candidates = true;
        }
        widened_params.push(Param::new(names));
        per_param.push(candidates);
    }

    if !any_candidates {
        return Ok(None);
    }

    let widened =
        Signature { params: widened_params, rest_param: signature.rest_param };
    let wrapped = wrap_conversions(handler.clone(), per_param, signature.rest_param);
    make_def(widened, wrapped, true, types).map(Some)
}

/// The conversion compiler: wraps a handler so each argument position runs
/// its candidate conversions in declared order, first matching source wins,
/// untouched arguments pass through. Runs after rest gathering, so the
/// trailing list is mapped element-wise.
fn wrap_conversions(
    inner: Handler,
    per_param: Vec<Vec<(TypeTest, ConvertFn)>>,
    rest_param: bool,
) -> Handler {
    Handler::new(move |args| {
        let last = per_param.len().wrapping_sub(1);
        let mut out = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let candidates =
                per_param.get(index).map(|c| c.as_slice()).unwrap_or(&[]);
            if rest_param && index == last {
                if let Value::List(items) = arg {
                    let converted =
                        items.iter().map(|v| convert_arg(v, candidates)).collect();
                    out.push(Value::List(converted));
                    continue;
                }
            }
            out.push(convert_arg(arg, candidates));
        }
        inner.call(&out)
    })
}

fn convert_arg(value: &Value, candidates: &[(TypeTest, ConvertFn)]) -> Value {
    for (test, convert) in candidates {
        if test(value) {
            return convert(value);
        }
    }
    value.clone()
}
