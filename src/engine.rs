use once_cell::sync::Lazy;
use std::sync::Mutex;

use crate::compiler;
use crate::convert::{Conversion, ConversionTable};
use crate::dispatcher::{self, Handler, TypedFn};
use crate::error::Error;
use crate::types::{Type, TypeTable};
use crate::value::Value;

/// Leading defs considered for call-path specialization by default.
pub const DEFAULT_FAST_PATH_LIMIT: usize = 6;

//===----------------------------------------------------------------------===//
// Engine
//===----------------------------------------------------------------------===//

/// Owns a type registry, a conversion registry and the compiler settings,
/// and builds typed functions against them.
///
/// Registries are append-only. A [`TypedFn`] snapshots everything it needs
/// at construction, so registering more types or conversions afterwards
/// never changes the behavior of existing callables.
#[derive(Debug)]
pub struct Engine {
    types: TypeTable,
    conversions: ConversionTable,
    fast_path_limit: usize,
}

impl Engine {
    /// An engine over the built-in type table.
    pub fn new() -> Self {
        Self {
            types: TypeTable::builtin(),
            conversions: ConversionTable::new(),
            fast_path_limit: DEFAULT_FAST_PATH_LIMIT,
        }
    }

    /// An engine with no registered types, for fully custom type universes.
    pub fn empty() -> Self {
        Self {
            types: TypeTable::new(),
            conversions: ConversionTable::new(),
            fast_path_limit: DEFAULT_FAST_PATH_LIMIT,
        }
    }

    pub fn add_type(&mut self, ty: Type) -> Result<(), Error> {
        self.types.add(ty)
    }

    pub fn add_conversion(&mut self, conv: Conversion) -> Result<(), Error> {
        self.conversions.add(conv, &self.types)
    }

    /// Marks a type name as ignored; the normalizer strips it from params.
    pub fn ignore_type(&mut self, name: &str) {
        self.types.ignore(name);
    }

    /// Caps the number of leading defs the assembler specializes.
    pub fn set_fast_path_limit(&mut self, limit: usize) {
        self.fast_path_limit = limit;
    }

    pub fn with_fast_path_limit(mut self, limit: usize) -> Self {
        self.fast_path_limit = limit;
        self
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Classifies a value against this engine's registry.
    pub fn find_type(&self, value: &Value) -> Result<&str, Error> {
        self.types.find_type(value)
    }

    /// Converts a value to the target type using the declared conversions.
    pub fn convert(&self, value: &Value, target: &str) -> Result<Value, Error> {
        self.conversions.convert(value, target, &self.types)
    }

    /// Compiles a named typed function from a signatures map.
    ///
    /// # Errors
    ///
    /// `NoSignatures` on an empty (or fully ignored) map, `Syntax` /
    /// `UnknownType` on bad signatures, `DuplicateSignature` when one
    /// canonical signature is bound to two implementations.
    pub fn function<S: Into<String>>(
        &self,
        name: &str,
        signatures: impl IntoIterator<Item = (S, Handler)>,
    ) -> Result<TypedFn, Error> {
        let pairs: Vec<(String, Handler)> = signatures
            .into_iter()
            .map(|(signature, handler)| (signature.into(), handler))
            .collect();
        if pairs.is_empty() {
            return Err(Error::NoSignatures);
        }
        let (defs, metadata) =
            compiler::compile(pairs, &self.types, &self.conversions)?;
        Ok(dispatcher::assemble(
            name.to_string(),
            defs,
            metadata,
            self.types.clone(),
            self.fast_path_limit,
        ))
    }

    /// Compiles an anonymous typed function (empty name).
    pub fn function_anon<S: Into<String>>(
        &self,
        signatures: impl IntoIterator<Item = (S, Handler)>,
    ) -> Result<TypedFn, Error> {
        self.function("", signatures)
    }

    /// Merges the signatures maps of several typed functions into one
    /// callable, recompiled against this engine.
    ///
    /// # Errors
    ///
    /// `NameMismatch` when two inputs carry different non-empty names,
    /// `DuplicateSignature` when one canonical signature maps to two
    /// different implementations, `NoSignatures` on an empty input.
    /// All-unnamed inputs produce an unnamed callable.
    pub fn merge(&self, fns: &[TypedFn]) -> Result<TypedFn, Error> {
        let mut name = String::new();
        for f in fns {
            if f.name().is_empty() {
                continue;
            }
            if name.is_empty() {
                name = f.name().to_string();
            } else if name != f.name() {
                return Err(Error::NameMismatch {
                    expected: name,
                    actual: f.name().to_string(),
                });
            }
        }

        let mut pairs: Vec<(String, Handler)> = Vec::new();
        for f in fns {
            for (key, handler) in f.signatures() {
                pairs.push((key.to_string(), handler.clone()));
            }
        }
        self.function(&name, pairs)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

//===----------------------------------------------------------------------===//
// Default engine
//
// The process-wide engine behind the crate-level free functions. Same
// append-only contract as any other engine instance.
//===----------------------------------------------------------------------===//

static DEFAULT_ENGINE: Lazy<Mutex<Engine>> = Lazy::new(|| Mutex::new(Engine::new()));

/// Registers a type on the default engine.
pub fn add_type(ty: Type) -> Result<(), Error> {
    DEFAULT_ENGINE.lock().unwrap().add_type(ty)
}

/// Registers a conversion on the default engine.
pub fn add_conversion(conv: Conversion) -> Result<(), Error> {
    DEFAULT_ENGINE.lock().unwrap().add_conversion(conv)
}

/// Adds a name to the default engine's ignore set.
pub fn ignore_type(name: &str) {
    DEFAULT_ENGINE.lock().unwrap().ignore_type(name)
}

/// Converts a value using the default engine's conversions.
pub fn convert(value: &Value, target: &str) -> Result<Value, Error> {
    DEFAULT_ENGINE.lock().unwrap().convert(value, target)
}

/// Compiles a named typed function on the default engine.
pub fn function<S: Into<String>>(
    name: &str,
    signatures: impl IntoIterator<Item = (S, Handler)>,
) -> Result<TypedFn, Error> {
    DEFAULT_ENGINE.lock().unwrap().function(name, signatures)
}

/// Compiles an anonymous typed function on the default engine.
pub fn function_anon<S: Into<String>>(
    signatures: impl IntoIterator<Item = (S, Handler)>,
) -> Result<TypedFn, Error> {
    DEFAULT_ENGINE.lock().unwrap().function_anon(signatures)
}

/// Merges typed functions on the default engine.
pub fn merge(fns: &[TypedFn]) -> Result<TypedFn, Error> {
    DEFAULT_ENGINE.lock().unwrap().merge(fns)
}
