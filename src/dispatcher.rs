use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::compiler::Def;
use crate::error::Error;
use crate::mismatch::describe_mismatch;
use crate::types::{TypeTable, TypeTest};
use crate::value::Value;

//===----------------------------------------------------------------------===//
// Handler
//===----------------------------------------------------------------------===//

pub type HandlerFn = dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync;

/// A user implementation behind one or more signatures.
///
/// Cloning is cheap (shared `Arc`). The duplicate signature check compares
/// handlers by pointer identity, so clones of one handler count as the same
/// implementation.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new(
        f: impl Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        (self.0)(args)
    }

    pub(crate) fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<handler>")
    }
}

//===----------------------------------------------------------------------===//
// TypedFn
//===----------------------------------------------------------------------===//

/// Specialized entry for one leading def with arity ≤ 2 and no rest param:
/// an arity check plus at most two precompiled predicates, no loop over
/// signatures.
struct FastDef {
    arity: usize,
    tests: Vec<TypeTest>,
    handler: Handler,
}

struct Inner {
    name: String,
    defs: Vec<Def>,
    fast: Vec<FastDef>,
    generic_start: usize,
    // Canonical signature → original handler; conversion twins excluded.
    // Keys also kept in sorted def order for deterministic iteration.
    lookup: FxHashMap<String, usize>,
    signatures: Vec<(String, Handler)>,
    // Snapshot of the registry at build time. Registry mutation after
    // construction never affects this callable.
    types: TypeTable,
}

/// A compiled multiple-dispatch callable.
///
/// Immutable after construction and cheap to clone. Invocation tries the
/// fast-path prefix, then scans the remaining defs in sorted order. When no
/// signature matches, a structured [`DispatchError`](crate::DispatchError)
/// is reported before any user implementation runs.
#[derive(Clone)]
pub struct TypedFn {
    inner: Arc<Inner>,
}

impl TypedFn {
    /// The function name; empty for anonymous functions.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The public signatures map: canonical signature string → original
    /// implementation, in dispatch order.
    pub fn signatures(&self) -> impl Iterator<Item = (&str, &Handler)> {
        self.inner.signatures.iter().map(|(k, h)| (k.as_str(), h))
    }

    /// Dispatches a call on the runtime types of `args`.
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        for fast in &self.inner.fast {
            if args.len() == fast.arity
                && fast.tests.iter().zip(args).all(|(test, arg)| test(arg))
            {
                return fast.handler.call(args);
            }
        }
        for def in &self.inner.defs[self.inner.generic_start..] {
            if (def.test)(args) {
                return match &def.preprocess {
                    Some(pre) => def.handler.call(&pre(args)),
                    None => def.handler.call(args),
                };
            }
        }
        Err(Error::Dispatch(describe_mismatch(
            &self.inner.name,
            args,
            &self.inner.defs,
            &self.inner.types,
        )))
    }

    /// Looks up the implementation bound to an exact signature string.
    /// No fuzzy or conversion-aware matching: `"int, string"` finds the
    /// `"int,string"` overload and nothing else.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the canonical key is absent.
    pub fn find(&self, signature: &str) -> Result<Handler, Error> {
        let key = signature.split(',').map(str::trim).join(",");
        self.lookup(&key)
    }

    /// [`find`](Self::find) over a sequence of type names, one per param.
    pub fn find_types(&self, names: &[&str]) -> Result<Handler, Error> {
        let key = names.iter().map(|n| n.trim()).join(",");
        self.lookup(&key)
    }

    fn lookup(&self, key: &str) -> Result<Handler, Error> {
        self.inner
            .lookup
            .get(key)
            .and_then(|&index| self.inner.signatures.get(index))
            .map(|(_, handler)| handler.clone())
            .ok_or_else(|| Error::NotFound { signature: key.to_string() })
    }
}

impl fmt::Debug for TypedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedFn")
            .field("name", &self.inner.name)
            .field(
                "signatures",
                &self.inner.signatures.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for TypedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.inner.name.is_empty() { "anon" } else { &self.inner.name };
        write!(f, "#<typed {}>", name)
    }
}

//===----------------------------------------------------------------------===//
// Assembly
//===----------------------------------------------------------------------===//

/// Builds the callable from a sorted, expanded def list. The fast path
/// covers the longest qualifying def prefix up to `fast_path_limit`; when
/// the whole prefix qualifies the generic scan resumes after it, otherwise
/// the scan restarts from the first def.
pub(crate) fn assemble(
    name: String,
    defs: Vec<Def>,
    metadata: Vec<(String, Handler)>,
    types: TypeTable,
    fast_path_limit: usize,
) -> TypedFn {
    let cap = fast_path_limit.min(defs.len());
    let mut fast = Vec::with_capacity(cap);
    for def in &defs[..cap] {
        if def.signature.rest_param || def.signature.params.len() > 2 {
            break;
        }
        fast.push(FastDef {
            arity: def.signature.params.len(),
            tests: def.param_tests.clone(),
            handler: def.handler.clone(),
        });
    }
    let generic_start = if fast.len() == cap { fast.len() } else { 0 };

    let lookup = metadata
        .iter()
        .enumerate()
        .map(|(index, (key, _))| (key.clone(), index))
        .collect();

    TypedFn {
        inner: Arc::new(Inner {
            name,
            defs,
            fast,
            generic_start,
            lookup,
            signatures: metadata,
            types,
        }),
    }
}
